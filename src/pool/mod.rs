//! Bounded, rate-limited job execution with cooperative cancellation.

pub mod cancel;
pub mod limiter;
pub mod worker;
