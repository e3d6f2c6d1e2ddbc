use anyhow::{anyhow, Result};
use std::time::Duration;

use serialport::{DataBits, Parity, StopBits};

/// Verify the serial device node exists and is openable before handing it
/// to the Modbus layer. Catches unplugged USB adapters with a clear error
/// instead of a framing timeout later.
pub fn preflight_check(port: &str) -> Result<()> {
    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(port)
        .map_err(|err| anyhow!("Device check failed for {port}: {err}"))?;
    Ok(())
}

/// Open the RS-485 serial port with the bus framing the driver units expect
/// (8 data bits, no parity, 2 stop bits), enabling exclusive access on Unix
/// systems.
pub fn open_serial_port(
    port: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<Box<dyn serialport::SerialPort>> {
    let builder = serialport::new(port, baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::Two)
        .timeout(timeout);

    #[cfg(unix)]
    {
        let mut handle = builder
            .open_native()
            .map_err(|err| anyhow!("Failed to open port {port}: {err}"))?;
        handle
            .set_exclusive(true)
            .map_err(|err| anyhow!("Failed to acquire exclusive access to {port}: {err}"))?;
        Ok(Box::new(handle))
    }

    #[cfg(not(unix))]
    {
        builder
            .open()
            .map_err(|err| anyhow!("Failed to open port {port}: {err}"))
    }
}

/// List available serial ports (used by `--list-ports`).
pub fn list_ports() -> Vec<String> {
    serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(|info| info.port_name)
        .collect()
}
