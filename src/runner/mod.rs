//! Test entrypoints: API smoke tests, web checkout, mobile suite

pub mod api;
pub mod checkout;
pub mod harness;
pub mod mobile;

pub use harness::{run_test, Suite};
