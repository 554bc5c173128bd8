pub mod sink;
pub mod store;
