//! Sliding-window rate counting.

mod counter;
pub mod units;

pub use counter::RateCounter;
pub use units::Unit;
