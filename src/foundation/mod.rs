pub(crate) mod cache;
pub mod error;
pub(crate) mod math;
