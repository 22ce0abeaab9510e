//! Ratecount - Sliding-Window Rate Counter
//!
//! This crate implements a thread-safe counter that reports the average rate
//! of tokens (usually bytes) over a trailing window of fixed-width time
//! slots. Slots are aged out lazily on every access, so no background task
//! is needed. Reader and writer adapters feed transferred byte counts into a
//! shared counter.

pub mod config;
pub mod error;
pub mod rate;
pub mod stream;

pub use error::{RateCountError, Result};
pub use rate::{units, RateCounter, Unit};
pub use stream::{RatedReader, RatedWriter};
