pub mod adb;
pub mod appium;
pub mod capabilities;
pub mod driver;
pub mod service;

pub use driver::AndroidDriver;

use anyhow::Result;
use colored::Colorize;

/// List connected Android devices
pub async fn list_devices() -> Result<()> {
    let devices = adb::get_devices().await?;

    if devices.is_empty() {
        println!("  No Android devices connected");
    } else {
        println!("  Found {} device(s):", devices.len());
        for device in devices {
            println!(
                "    {} {} ({})",
                "•".green(),
                device.serial.white().bold(),
                device.state.dimmed()
            );
        }
    }

    Ok(())
}
