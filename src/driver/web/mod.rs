pub mod driver;

pub use driver::PlaywrightPage;
