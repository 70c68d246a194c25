pub mod types;
pub mod window;


pub use types::{
    ColorMode,
    PixelFormat,
    ScanParameters,
    ScanRequest,
    Source,
};

pub use window::{
    ScanGeometry,
    decode_window,
    WINDOW_BLOCK_LEN,
};
