/// Serial port discovery for the dryer controller
use log::{debug, info, warn};
use serialport::{SerialPortInfo, SerialPortType};
use tokio::time::sleep;

use crate::config::DryerConfig;

/// Whether a port looks like the controller's USB serial adapter
///
/// # Arguments
/// * `port_name` - Device path, e.g. `/dev/ttyACM0`
/// * `description` - USB manufacturer and product strings, if any
pub fn looks_like_controller(port_name: &str, description: Option<&str>) -> bool {
    description.map_or(false, |d| d.contains("Arduino"))
        || port_name.contains("ttyACM")
        || port_name.contains("ttyUSB")
}

fn describe(info: &SerialPortInfo) -> Option<String> {
    match &info.port_type {
        SerialPortType::UsbPort(usb) => Some(format!(
            "{} {}",
            usb.manufacturer.as_deref().unwrap_or_default(),
            usb.product.as_deref().unwrap_or_default()
        )),
        _ => None,
    }
}

/// Find the first attached port that looks like the controller
pub fn find_dryer_port() -> Option<String> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("Failed to enumerate serial ports: {}", e);
            return None;
        }
    };

    ports
        .into_iter()
        .find(|port| looks_like_controller(&port.port_name, describe(port).as_deref()))
        .map(|port| port.port_name)
}

/// Resolve the port to read from, polling until the controller shows up
///
/// A configured port is used as-is. Otherwise discovery is retried
/// `port_retries` times, `port_retry_interval` apart.
pub async fn wait_for_port(config: &DryerConfig) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(port) = &config.serial_port {
        return Ok(port.clone());
    }

    info!("Waiting for dryer controller connection...");

    for attempt in 0..config.port_retries {
        if let Some(port) = find_dryer_port() {
            info!("Found dryer controller on {}", port);
            return Ok(port);
        }

        debug!("Attempt {}: no controller port found", attempt + 1);

        if attempt + 1 < config.port_retries {
            sleep(config.port_retry_interval).await;
        }
    }

    Err(format!(
        "Dryer controller not found after {} attempts",
        config.port_retries
    )
    .into())
}
