//! ports 命令

use anyhow::{Context, Result};
use motionlink_transport::{STANDARD_BAUD_RATES, available_ports};

pub fn execute() -> Result<()> {
    let ports = available_ports().context("Failed to enumerate serial ports")?;

    if ports.is_empty() {
        println!("No serial ports found");
    } else {
        println!("Serial ports:");
        for port in &ports {
            println!("  {port}");
        }
    }

    let rates: Vec<String> = STANDARD_BAUD_RATES.iter().map(u32::to_string).collect();
    println!("Supported baud rates: {}", rates.join(", "));
    Ok(())
}
