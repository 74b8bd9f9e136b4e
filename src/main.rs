//! rtd-monitor: stream MAX31865 temperatures from a Linux spidev device.
//!
//! ```text
//! rtd-monitor [--config sensor.json] [--interval-ms 1000] [--count N] [DEVICE]
//!
//!   DEVICE      spidev node, default /dev/spidev0.0
//!   --config    DeviceConfig as JSON (wiring, referenceResistance, ...)
//!   --count     stop after N readings (default: run forever)
//!   --verbose   debug-level logging
//! ```
//!
//! One line per reading on stdout; diagnostics go to stderr.

use std::time::{Duration, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use log::{LevelFilter, error, info, warn};

use max31865::adapters::{console_log, linux_spi::LinuxSpi};
use max31865::{BusRegistry, DeviceConfig, Sensor, TriggerMode};

const DEFAULT_DEVICE: &str = "/dev/spidev0.0";
const DEFAULT_INTERVAL_MS: u64 = 1000;

struct Args {
    device: String,
    config: Option<String>,
    interval: Duration,
    count: Option<usize>,
    verbose: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        device: DEFAULT_DEVICE.to_owned(),
        config: None,
        interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        count: None,
        verbose: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = Some(it.next().context("--config needs a path")?),
            "--interval-ms" => {
                let ms: u64 = it
                    .next()
                    .context("--interval-ms needs a value")?
                    .parse()
                    .context("--interval-ms must be an integer")?;
                args.interval = Duration::from_millis(ms);
            }
            "--count" => {
                args.count = Some(
                    it.next()
                        .context("--count needs a value")?
                        .parse()
                        .context("--count must be an integer")?,
                );
            }
            "-v" | "--verbose" => args.verbose = true,
            flag if flag.starts_with('-') => bail!("unknown option {flag}"),
            device => device.clone_into(&mut args.device),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&str>) -> Result<DeviceConfig> {
    let Some(path) = path else {
        return Ok(DeviceConfig::default());
    };
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    DeviceConfig::from_json(&json).with_context(|| format!("parsing {path}"))
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    console_log::init(level).context("installing logger")?;

    let mut config = load_config(args.config.as_deref())?;
    if config.identifier.is_empty() {
        config.identifier.clone_from(&args.device);
    }

    let buses = BusRegistry::new();
    let bus = buses
        .open(&args.device, LinuxSpi::open)
        .with_context(|| format!("opening {}", args.device))?;
    let sensor = Sensor::new(bus, config).context("initialising MAX31865")?;

    if let Err(e) = sensor.fault_detect() {
        warn!("fault detect: {}", e);
    }

    let readings = sensor.poll(TriggerMode::Interval(args.interval))?;
    info!("polling {} every {:?}", sensor.id(), args.interval);

    for (n, reading) in readings.enumerate() {
        let millis = reading
            .timestamp()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        match (reading.temperature(), reading.error()) {
            (Some(t), _) => println!("{millis} {} {t}", reading.id()),
            (None, Some(e)) => error!("{}: {}", reading.id(), e),
            (None, None) => {}
        }
        if args.count.is_some_and(|limit| n + 1 >= limit) {
            break;
        }
    }

    sensor.close().context("closing sensor")?;
    Ok(())
}
