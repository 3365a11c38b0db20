use log::{debug, info};
use std::env;
use std::str::FromStr;
use tokio::time::Duration;

use crate::control::drying::DEFAULT_CEILING_SECS;

// One year of simulated seconds
const MAX_CEILING_SECS: u64 = 365 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct DryerConfig {
    /// Explicit port path; `None` means auto-discover
    pub serial_port: Option<String>,
    pub baud_rate: u32,
    pub port_retries: u32,
    pub port_retry_interval: Duration,
    pub read_timeout: Duration,
    pub status_interval: Duration,
    pub max_drying_secs: u64,
}

impl DryerConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (environment, map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let serial_port = lookup("DRYER_SERIAL_PORT")
            .map(|port| port.trim().to_string())
            .filter(|port| !port.is_empty());

        match &serial_port {
            Some(port) => info!("Using configured serial port {}", port),
            None => info!("DRYER_SERIAL_PORT not set, will search for the controller"),
        }

        let config = DryerConfig {
            serial_port,
            baud_rate: positive(&lookup, "DRYER_BAUD_RATE", 9600)?,
            port_retries: positive(&lookup, "DRYER_PORT_RETRIES", 30)?,
            port_retry_interval: Duration::from_secs(positive(&lookup, "DRYER_PORT_RETRY_SECS", 2)?),
            read_timeout: Duration::from_millis(positive(&lookup, "DRYER_READ_TIMEOUT_MS", 1000)?),
            status_interval: Duration::from_secs(positive(
                &lookup,
                "DRYER_STATUS_INTERVAL_SECS",
                10,
            )?),
            max_drying_secs: drying_ceiling(&lookup)?,
        };

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }
}

/// Read a numeric key, falling back to `default` when unset
fn positive<F, T>(lookup: &F, key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    let raw = match lookup(key) {
        Some(raw) => raw,
        None => return Ok(default),
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(format!("{} must be a positive integer, got '{}'", key, raw).into()),
    }
}

fn drying_ceiling<F>(lookup: &F) -> Result<u64, Box<dyn std::error::Error>>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = positive(lookup, "DRYER_MAX_DRYING_SECS", DEFAULT_CEILING_SECS)?;
    if secs > MAX_CEILING_SECS {
        return Err(format!(
            "DRYER_MAX_DRYING_SECS must be at most {}, got {}",
            MAX_CEILING_SECS, secs
        )
        .into());
    }
    Ok(secs)
}
