use anyhow::{anyhow, Result};

use rmodbus::{client::ModbusRequest, ModbusProto};

/// Build a frame that writes one unit's 4 position registers
/// (function 0x10, Write Multiple Registers).
pub fn generate_set_positions_request(
    station: u8,
    start_address: u16,
    values: &[u16],
) -> Result<(ModbusRequest, Vec<u8>)> {
    let mut request = ModbusRequest::new(station, ModbusProto::Rtu);
    let mut raw = Vec::new();
    request.generate_set_holdings_bulk(start_address, values, &mut raw)?;
    Ok((request, raw))
}

/// Build the broadcast sync frame: a single register write (function 0x06)
/// carrying the time-delta payload.
pub fn generate_sync_request(
    station: u8,
    address: u16,
    time_delta: u16,
) -> Result<(ModbusRequest, Vec<u8>)> {
    let mut request = ModbusRequest::new(station, ModbusProto::Rtu);
    let mut raw = Vec::new();
    request.generate_set_holding(address, time_delta, &mut raw)?;
    Ok((request, raw))
}

/// Build a frame that writes coil bits for one motor
/// (function 0x0F, Write Multiple Coils).
pub fn generate_set_coils_request(
    station: u8,
    start_address: u16,
    coils: &[bool],
) -> Result<(ModbusRequest, Vec<u8>)> {
    let mut request = ModbusRequest::new(station, ModbusProto::Rtu);
    let mut raw = Vec::new();
    request.generate_set_coils_bulk(start_address, coils, &mut raw)?;
    Ok((request, raw))
}

/// Reject confirmation frames that cannot be a write echo: exception
/// replies (function code with the 0x80 flag, error code in the next byte)
/// and frames too short to hold an RTU echo.
pub fn check_write_response(response: &[u8]) -> Result<()> {
    if response.len() >= 3 && response[1] & 0x80 != 0 {
        return Err(anyhow!("Modbus exception: error code 0x{:02X}", response[2]));
    }
    if response.len() < 8 {
        return Err(anyhow!(
            "Invalid write response (too short: {} bytes)",
            response.len()
        ));
    }
    Ok(())
}

/// Validate an echo/confirmation frame against the request that produced it.
pub fn parse_write_ack(request: &mut ModbusRequest, response: &[u8]) -> Result<()> {
    request.parse_ok(response)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_frame_layout() {
        let values = [1000u16, 2000, 3000, 4000];
        let (_, raw) = generate_set_positions_request(0, 100, &values).unwrap();
        // addr + func + start(2) + qty(2) + byte count + data(8) + crc(2)
        assert_eq!(raw.len(), 9 + values.len() * 2);
        assert_eq!(raw[0], 0); // broadcast station
        assert_eq!(raw[1], 0x10);
        assert_eq!(u16::from_be_bytes([raw[2], raw[3]]), 100);
        assert_eq!(u16::from_be_bytes([raw[4], raw[5]]), 4);
        assert_eq!(raw[6], 8);
        assert_eq!(u16::from_be_bytes([raw[7], raw[8]]), 1000);
    }

    #[test]
    fn test_sync_frame_layout() {
        let (_, raw) = generate_sync_request(0, 99, 290).unwrap();
        assert_eq!(raw.len(), 8);
        assert_eq!(raw[0], 0);
        assert_eq!(raw[1], 0x06);
        assert_eq!(u16::from_be_bytes([raw[2], raw[3]]), 99);
        assert_eq!(u16::from_be_bytes([raw[4], raw[5]]), 290);
    }

    #[test]
    fn test_coil_echo_accepted() {
        let (mut request, _) = generate_set_coils_request(7, 0x0105, &[true]).unwrap();
        // station, func, start address, quantity, CRC (lo, hi)
        let echo = [0x07, 0x0F, 0x01, 0x05, 0x00, 0x01, 0x85, 0x90];
        check_write_response(&echo).unwrap();
        parse_write_ack(&mut request, &echo).unwrap();
    }

    #[test]
    fn test_corrupted_echo_rejected() {
        let (mut request, _) = generate_set_coils_request(7, 0x0105, &[true]).unwrap();
        // valid length and function code, but the CRC no longer matches
        let corrupted = [0x07, 0x0F, 0x01, 0x05, 0x00, 0x01, 0x85, 0x91];
        check_write_response(&corrupted).unwrap();
        assert!(parse_write_ack(&mut request, &corrupted).is_err());
    }

    #[test]
    fn test_exception_response_rejected() {
        // RTU exception reply: function code with the 0x80 flag, code 0x02
        let exception = [0x07, 0x8F, 0x02, 0x25, 0xF0];
        let err = check_write_response(&exception).unwrap_err();
        assert!(err.to_string().contains("0x02"), "{err}");
    }

    #[test]
    fn test_truncated_response_rejected() {
        assert!(check_write_response(&[0x07, 0x0F]).is_err());
        assert!(check_write_response(&[]).is_err());
    }

    #[test]
    fn test_coil_frame_layout() {
        let (_, raw) = generate_set_coils_request(7, 0x0105, &[true]).unwrap();
        assert_eq!(raw[0], 7);
        assert_eq!(raw[1], 0x0F);
        assert_eq!(u16::from_be_bytes([raw[2], raw[3]]), 0x0105);
        assert_eq!(u16::from_be_bytes([raw[4], raw[5]]), 1);
        assert_eq!(raw[6], 1); // one data byte for a single coil
        assert_eq!(raw[7] & 0x01, 0x01);
    }
}
