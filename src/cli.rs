use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};

use crate::config::{MOTORS_PER_UNIT, NUM_UNITS};

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    Command::new("marionette")
        .arg(
            Arg::new("tui")
                .long("tui")
                .short('t')
                .help("Run with the terminal UI")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("simulate")
                .long("simulate")
                .short('s')
                .help("Drive the in-memory simulator instead of the serial bus")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a TOML config file")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .help("Serial device path (overrides config)")
                .value_name("DEVICE"),
        )
        .arg(
            Arg::new("baud-rate")
                .long("baud-rate")
                .help("Serial port baud rate (overrides config)")
                .value_name("BAUD")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("interval-ms")
                .long("interval-ms")
                .help("Frame timer interval in milliseconds (overrides config)")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("serve")
                .long("serve")
                .help("Start the JSON control server")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("server-port")
                .long("server-port")
                .help("Control server port (overrides config)")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .short('l')
                .help("List all available serial ports and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("set-coil")
                .long("set-coil")
                .help("One-shot coil write: UNIT:MOTOR:ADDR:VALUE (e.g. 3:1:5:1), then exit")
                .value_name("SPEC")
                .conflicts_with_all(["tui", "serve"]),
        )
        .get_matches()
}

/// Parse a `UNIT:MOTOR:ADDR:VALUE` coil spec from `--set-coil`.
pub fn parse_coil_spec(spec: &str) -> Result<(u8, u8, u8, bool)> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(anyhow!(
            "Invalid coil spec {spec:?}: expected UNIT:MOTOR:ADDR:VALUE"
        ));
    }
    let unit: u8 = parts[0]
        .parse()
        .map_err(|_| anyhow!("Invalid unit id {:?}", parts[0]))?;
    // Unit 0 would broadcast the coil write to the whole bus
    if !(1..=NUM_UNITS).contains(&unit) {
        return Err(anyhow!("Unit id {unit} out of range 1..={NUM_UNITS}"));
    }
    let motor: u8 = parts[1]
        .parse()
        .map_err(|_| anyhow!("Invalid motor id {:?}", parts[1]))?;
    if u16::from(motor) >= MOTORS_PER_UNIT {
        return Err(anyhow!(
            "Motor id {motor} out of range 0..{MOTORS_PER_UNIT}"
        ));
    }
    let address: u8 = parts[2]
        .parse()
        .map_err(|_| anyhow!("Invalid coil address {:?}", parts[2]))?;
    let value = match parts[3] {
        "0" | "off" => false,
        "1" | "on" => true,
        other => return Err(anyhow!("Invalid coil value {other:?}: use 0/1/on/off")),
    };
    Ok((unit, motor, address, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coil_spec_parsing() {
        assert_eq!(parse_coil_spec("3:1:5:1").unwrap(), (3, 1, 5, true));
        assert_eq!(parse_coil_spec("31:3:0:off").unwrap(), (31, 3, 0, false));
        assert!(parse_coil_spec("3:1:5").is_err());
        assert!(parse_coil_spec("3:1:5:maybe").is_err());
        assert!(parse_coil_spec("300:1:5:1").is_err());
    }

    #[test]
    fn test_coil_spec_rejects_out_of_range_ids() {
        // unit 0 is the broadcast station, never a valid one-shot target
        assert!(parse_coil_spec("0:1:5:1").is_err());
        assert!(parse_coil_spec("32:1:5:1").is_err());
        assert!(parse_coil_spec("3:4:5:1").is_err());
        assert!(parse_coil_spec("3:9:5:1").is_err());
    }
}
