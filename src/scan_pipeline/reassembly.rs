pub mod stripe;
pub mod reorder;
pub mod postprocess;
pub mod reader;


pub use stripe::StripeBuffer;

pub use reorder::{
    ReorderMode,
    color_pack,
    line_pack,
};

pub use postprocess::{
    MirrorMode,
    mirror_line_bytes,
    mirror_line_pixels,
};

pub use reader::{
    CancelToken,
    ReaderPlan,
    run_reader,
};
