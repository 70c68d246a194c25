pub mod channel;
pub mod ready;
pub mod sim;


pub use channel::{
    Transport,
    SenseInfo,
};

pub use ready::{
    wait_until_ready,
    READY_POLL_ATTEMPTS,
    READY_POLL_BACKOFF,
};

pub use sim::{
    SimScanner,
    SimProfile,
    SimProbe,
    SimCounters,
};
