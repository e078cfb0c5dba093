pub mod driver;
pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use driver::list_devices;
pub use report::show_report;
pub use runner::run_test;
