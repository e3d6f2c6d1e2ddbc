use anyhow::{anyhow, Result};
use std::{
    io::{Read, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

use super::{frame, port::open_serial_port, port::preflight_check};
use crate::config::{
    self, BROADCAST_STATION, MOTORS_PER_UNIT, NUM_CHANNELS, NUM_UNITS, POSITION_START_ADDR,
    SYNC_REG_ADDR,
};

/// Slice the flat position array into per-unit register batches, paired with
/// the start address each unit listens on. Units are yielded in ascending
/// station order, which is also bus write order.
pub fn position_batches(positions: &[u16; NUM_CHANNELS]) -> impl Iterator<Item = (u16, &[u16])> {
    positions
        .chunks(MOTORS_PER_UNIT as usize)
        .enumerate()
        .map(|(unit_index, chunk)| {
            (
                POSITION_START_ADDR + unit_index as u16 * MOTORS_PER_UNIT,
                chunk,
            )
        })
}

/// Owns the serial port and performs all bus writes strictly sequentially.
/// RS-485 is half-duplex with a single master, so there is exactly one
/// conductor per bus and no concurrent access.
pub struct BusConductor {
    port: Arc<Mutex<Box<dyn serialport::SerialPort>>>,
    port_name: String,
    write_gap: Duration,
    sync_settle: Duration,
}

impl BusConductor {
    /// Check the device node, then open the port with the bus framing and
    /// the standard response timeout.
    pub fn connect(port_name: &str, baud_rate: u32) -> Result<Self> {
        preflight_check(port_name)?;
        let handle = open_serial_port(
            port_name,
            baud_rate,
            Duration::from_millis(config::RESPONSE_TIMEOUT_MS),
        )?;
        log::info!("Connected to motor bus on {port_name} at {baud_rate} baud");
        Ok(Self {
            port: Arc::new(Mutex::new(handle)),
            port_name: port_name.to_string(),
            write_gap: Duration::from_micros(config::WRITE_GAP_US),
            sync_settle: Duration::from_micros(config::SYNC_SETTLE_US),
        })
    }

    /// Write the full position plane: one 4-register broadcast write per
    /// unit in station order with a pacing gap between writes, then the
    /// broadcast sync register carrying the time delta.
    ///
    /// Per-unit write failures are logged and iteration continues; a partial
    /// frame followed by sync is preferable to stalling the whole array.
    pub fn send_positions(&self, positions: &[u16; NUM_CHANNELS], time_delta_ms: u16) -> Result<()> {
        for (unit_index, (start_address, batch)) in position_batches(positions).enumerate() {
            let unit_id = unit_index as u8 + 1;
            debug_assert!(unit_id <= NUM_UNITS);

            match frame::generate_set_positions_request(BROADCAST_STATION, start_address, batch) {
                Ok((_, raw)) => {
                    if let Err(err) = self.write_broadcast(&raw) {
                        log::warn!("Failed to write registers for unit {unit_id}: {err}");
                    }
                }
                Err(err) => {
                    log::warn!("Failed to build position frame for unit {unit_id}: {err}");
                }
            }

            // Pacing gap so back-to-back frames stay apart on the half-duplex bus
            std::thread::sleep(self.write_gap);
        }

        std::thread::sleep(self.sync_settle);
        self.send_sync(time_delta_ms)?;
        std::thread::sleep(self.sync_settle);

        Ok(())
    }

    /// Broadcast the sync register write that makes every unit apply its
    /// buffered positions simultaneously.
    pub fn send_sync(&self, time_delta_ms: u16) -> Result<()> {
        let (_, raw) = frame::generate_sync_request(BROADCAST_STATION, SYNC_REG_ADDR, time_delta_ms)?;
        self.write_broadcast(&raw)
            .map_err(|err| anyhow!("Failed to send broadcast sync command: {err}"))
    }

    /// Write coil bits for one motor on one unit. The coil plane is indexed
    /// by motor: the upper address byte selects the motor, the lower byte is
    /// the coil offset within it.
    ///
    /// Unlike position writes this is addressed, so the unit's confirmation
    /// echo is read back and checked.
    pub fn write_motor_coils(
        &self,
        station: u8,
        motor_id: u8,
        coil_address: u8,
        coils: &[bool],
    ) -> Result<()> {
        let start_address = (motor_id as u16) << 8 | coil_address as u16;
        let (mut request, raw) = frame::generate_set_coils_request(station, start_address, coils)?;

        let mut port = self
            .port
            .lock()
            .map_err(|err| anyhow!("Failed to lock port {}: {err}", self.port_name))?;

        // Coil commands run the motor's housekeeping routine; give the unit
        // a longer window to answer.
        port.set_timeout(Duration::from_millis(config::COIL_RESPONSE_TIMEOUT_MS))?;
        let result = (|| -> Result<()> {
            port.write_all(&raw)?;
            port.flush()?;

            std::thread::sleep(Duration::from_millis(50));
            let mut buffer = vec![0u8; 256];
            let bytes_read = port.read(&mut buffer)?;

            let response = &buffer[..bytes_read];
            frame::check_write_response(response)?;
            frame::parse_write_ack(&mut request, response)?;

            log::info!(
                "Wrote {} coils for motor {motor_id} on unit {station} at 0x{start_address:04X}",
                coils.len()
            );
            Ok(())
        })();
        port.set_timeout(Duration::from_millis(config::RESPONSE_TIMEOUT_MS))?;

        result
    }

    /// Broadcast frames get no reply; write, flush, done.
    fn write_broadcast(&self, raw: &[u8]) -> Result<()> {
        let mut port = self
            .port
            .lock()
            .map_err(|err| anyhow!("Failed to lock port {}: {err}", self.port_name))?;
        port.write_all(raw)?;
        port.flush()?;
        Ok(())
    }
}
