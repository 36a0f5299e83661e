//! TMCL Board Probe
//!
//! Opens a serial port, queries the firmware version and reads a few axis
//! parameters of one motor.
//!
//! Usage:
//!   cargo run --example board_probe -- [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: /dev/ttyACM0)
//!   --baud RATE       Baud rate (default: 9600)
//!   --motor N         Motor number (default: 0)
//!   --address N       Module address (default: 0)
//!   --timeout MS      Reply timeout in ms (default: 1000)
//!   --config FILE     Load connection settings from a JSON file; other
//!                     flags override the values it contains

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tmcl_core::board::{
    AXIS_ACTUAL_POSITION, AXIS_ACTUAL_SPEED, AXIS_TARGET_POSITION, AXIS_TARGET_SPEED,
};
use tmcl_core::protocol::{Connection, ConnectionConfig};

/// Command line options. Flags given explicitly win over the config file.
#[derive(Debug, Default)]
struct Options {
    config_file: Option<PathBuf>,
    port: Option<String>,
    baud: Option<u32>,
    address: Option<u8>,
    timeout_ms: Option<u64>,
    motor: u8,
    help: bool,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut options = Options::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--port" | "-p" => options.port = Some(value(&mut args, &arg)?),
                "--baud" | "-b" => options.baud = Some(value(&mut args, &arg)?.parse()?),
                "--motor" | "-m" => options.motor = value(&mut args, &arg)?.parse()?,
                "--address" | "-a" => options.address = Some(value(&mut args, &arg)?.parse()?),
                "--timeout" | "-t" => options.timeout_ms = Some(value(&mut args, &arg)?.parse()?),
                "--config" | "-c" => {
                    options.config_file = Some(PathBuf::from(value(&mut args, &arg)?))
                }
                "--help" | "-h" => options.help = true,
                other if !other.starts_with('-') => options.port = Some(other.to_string()),
                other => bail!("unknown option: {other}"),
            }
        }
        Ok(options)
    }

    /// Start from the config file (or defaults) and apply the flags on top
    fn connection_config(&self) -> Result<ConnectionConfig> {
        let mut config = match &self.config_file {
            Some(path) => ConnectionConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ConnectionConfig::new("/dev/ttyACM0"),
        };
        if let Some(port) = &self.port {
            config.port_name = port.clone();
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(address) = self.address {
            config.module_address = address;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = Options::parse(std::env::args().skip(1))?;
    if options.help {
        print_help();
        return Ok(());
    }
    let motor = options.motor;
    let config = options.connection_config()?;

    println!("Port:     {}", config.port_name);
    println!("Baud:     {}", config.baud_rate);
    println!("Address:  {}", config.module_address);
    println!();

    let conn = Connection::new(config);

    let version = conn.firmware_version().context("querying firmware version")?;
    println!("Firmware: {version}");

    for (name, index) in [
        ("target position", AXIS_TARGET_POSITION),
        ("actual position", AXIS_ACTUAL_POSITION),
        ("target speed", AXIS_TARGET_SPEED),
        ("actual speed", AXIS_ACTUAL_SPEED),
    ] {
        match conn.get_axis_parameter(index, motor) {
            Ok(v) => println!("  motor {motor} {name:<16} {v}"),
            Err(e) => println!("  motor {motor} {name:<16} error: {e}"),
        }
    }

    let status = conn.application_status().context("querying application status")?;
    println!(
        "Application: {:?} at {:#08x}",
        status.state, status.program_counter
    );

    conn.close();
    Ok(())
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("{flag} expects a value"))
}

fn print_help() {
    println!("TMCL Board Probe");
    println!();
    println!("Usage: board_probe [OPTIONS] [PORT]");
    println!();
    println!("Options:");
    println!("  -p, --port PORT     Serial port (default: /dev/ttyACM0)");
    println!("  -b, --baud RATE     Baud rate (default: 9600)");
    println!("  -m, --motor N       Motor number (default: 0)");
    println!("  -a, --address N     Module address (default: 0)");
    println!("  -t, --timeout MS    Reply timeout in ms (default: 1000)");
    println!("  -c, --config FILE   Load connection settings from JSON");
    println!("  -h, --help          Show this help");
}
