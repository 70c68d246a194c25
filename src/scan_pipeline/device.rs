pub mod caps;
pub mod commands;

mod tests;

pub use caps::{
    AsicGeneration,
    DeviceCaps,
    DeviceDescriptor,
    DeviceProbe,
    InquiryRecord,
    discover,
};
