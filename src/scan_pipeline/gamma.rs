pub mod types;
pub mod builder;


pub use types::{
    GammaCurves,
    GammaTables,
};

pub use builder::{
    build_gamma,
    upload_gamma,
};
