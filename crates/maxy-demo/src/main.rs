//! Maxy Demo Driver
//!
//! Connects to a chain of display modules, announces module types, sets the
//! global intensity and then pushes random targets forever. Lost connections
//! are retried with a 5 s / 10 s / 20 s backoff.
//!
//! Usage:
//!   maxy-demo [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: from config, else /dev/ttyUSB0)
//!   --baud RATE       Baud rate (default: 9600)
//!   --timeout MS      Write timeout in ms (default: 5000)
//!   --config FILE     JSON topology file (default: built-in bench rig)
//!   --interval MS     Pause between rounds in ms (default: 4500)
//!   --rounds N        Stop after N rounds (default: run forever)
//!   --seed N          Seed the random generator for reproducible runs
//!   --list            List serial ports and exit

use anyhow::{Context, Result};
use serialport::SerialPort;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use maxy_core::demo::{standard_topology, DemoDriver};
use maxy_core::device::{Controller, DeviceConfig};
use maxy_core::protocol::{list_ports, ProtocolError};

const DEFAULT_PORT: &str = "/dev/ttyUSB0";
const DEFAULT_INTERVAL_MS: u64 = 4500;

#[derive(Debug, Default)]
struct Options {
    port: Option<String>,
    baud_rate: Option<u32>,
    timeout_ms: Option<u64>,
    config_path: Option<String>,
    interval_ms: Option<u64>,
    rounds: Option<u64>,
    seed: Option<u64>,
    list_ports: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = |name: &str| -> Result<String> {
            i += 1;
            args.get(i)
                .cloned()
                .with_context(|| format!("{} needs a value", name))
        };
        match arg {
            "--port" | "-p" => options.port = Some(value(arg)?),
            "--baud" | "-b" => options.baud_rate = Some(value(arg)?.parse().context("--baud")?),
            "--timeout" | "-t" => {
                options.timeout_ms = Some(value(arg)?.parse().context("--timeout")?)
            }
            "--config" | "-c" => options.config_path = Some(value(arg)?),
            "--interval" | "-i" => {
                options.interval_ms = Some(value(arg)?.parse().context("--interval")?)
            }
            "--rounds" | "-n" => options.rounds = Some(value(arg)?.parse().context("--rounds")?),
            "--seed" | "-s" => options.seed = Some(value(arg)?.parse().context("--seed")?),
            "--list" | "-l" => options.list_ports = true,
            "--help" | "-h" => options.help = true,
            _ if !arg.starts_with('-') => options.port = Some(arg.to_string()),
            _ => anyhow::bail!("Unknown option: {}", arg),
        }
        i += 1;
    }

    Ok(options)
}

impl Options {
    /// Config file (or the bench rig) with command-line overrides applied
    fn device_config(&self) -> Result<DeviceConfig> {
        let mut config = match &self.config_path {
            Some(path) => DeviceConfig::from_file(path)
                .with_context(|| format!("loading config {}", path))?,
            None => DeviceConfig {
                modules: standard_topology().into_iter().map(Some).collect(),
                ..DeviceConfig::default()
            },
        };

        if let Some(port) = &self.port {
            config.connection.port_name = port.clone();
        }
        if config.connection.port_name.is_empty() {
            config.connection.port_name = DEFAULT_PORT.to_string();
        }
        if let Some(baud) = self.baud_rate {
            config.connection.baud_rate = baud;
        }
        if let Some(timeout) = self.timeout_ms {
            config.connection.timeout_ms = timeout;
        }
        Ok(config)
    }
}

fn print_help() {
    println!("Usage: maxy-demo [OPTIONS] [PORT]");
    println!();
    println!("Options:");
    println!("  -p, --port PORT       Serial port (default: {})", DEFAULT_PORT);
    println!("  -b, --baud RATE       Baud rate (default: 9600)");
    println!("  -t, --timeout MS      Write timeout in ms (default: 5000)");
    println!("  -c, --config FILE     JSON topology file (default: built-in bench rig)");
    println!(
        "  -i, --interval MS     Pause between rounds in ms (default: {})",
        DEFAULT_INTERVAL_MS
    );
    println!("  -n, --rounds N        Stop after N rounds (default: run forever)");
    println!("  -s, --seed N          Seed the random generator");
    println!("  -l, --list            List serial ports and exit");
    println!("  -h, --help            Show this help");
}

/// Connect, resync and run rounds until the link fails or `rounds` is reached
fn run_session(
    maxy: &mut Controller<Box<dyn SerialPort>>,
    config: &DeviceConfig,
    driver: &mut DemoDriver,
    interval: Duration,
    rounds: Option<u64>,
    retry_count: &mut u32,
) -> Result<(), ProtocolError> {
    maxy.connect_serial(&config.connection)?;
    maxy.set_global_intensity(config.global_intensity)?;
    tracing::info!("Connected!");
    *retry_count = 0;

    loop {
        if rounds.is_some_and(|limit| driver.rounds() >= limit) {
            return Ok(());
        }
        let sent = driver.tick(maxy)?;
        tracing::debug!(sent, state = ?maxy.state(), "round sent");
        thread::sleep(interval);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args)?;

    if options.help {
        print_help();
        return Ok(());
    }
    if options.list_ports {
        for port in list_ports().context("listing serial ports")? {
            println!("{}  {}", port.name, port.product.unwrap_or_default());
        }
        return Ok(());
    }

    let config = options.device_config()?;
    let interval = Duration::from_millis(options.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS));
    let mut driver = match options.seed {
        Some(seed) => DemoDriver::with_seed(seed),
        None => DemoDriver::new(),
    };
    let mut maxy: Controller<Box<dyn SerialPort>> =
        Controller::with_modules(config.modules.clone()).context("registering modules")?;

    let mut retry_count = 0u32;
    loop {
        tracing::info!(port = %config.connection.port_name, "Connecting to serial port");
        retry_count += 1;

        let session = run_session(
            &mut maxy,
            &config,
            &mut driver,
            interval,
            options.rounds,
            &mut retry_count,
        );
        match session {
            Ok(()) => {
                tracing::info!(rounds = driver.rounds(), "done");
                return Ok(());
            }
            Err(ProtocolError::Timeout) => tracing::warn!("Write timeout"),
            Err(e) if e.is_transport_failure() => tracing::warn!("Serial error: {}", e),
            Err(e) => return Err(e).context("demo driver stopped"),
        }

        maxy.detach();
        let delay = config.backoff.delay(retry_count);
        tracing::info!("Waiting {} seconds before trying to reconnect", delay.as_secs());
        thread::sleep(delay);
    }
}
