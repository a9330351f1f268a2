pub mod countdown;
pub mod timer;

pub use countdown::Countdown;
pub use timer::{ManualTimer, MonotonicTimer, Timer};
