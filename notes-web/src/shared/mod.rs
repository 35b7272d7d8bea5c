pub mod flash;
pub mod tracing;
pub mod views;
