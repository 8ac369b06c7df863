pub mod batch;
pub mod lending;
