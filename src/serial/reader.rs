/// Blocking serial reader feeding text lines to the control loop
use log::{debug, error, info};
use serialport::FlowControl;
use std::io::{self, Read};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

use crate::config::DryerConfig;

const READ_CHUNK_BYTES: usize = 256;
const MAX_LINE_BYTES: usize = 4096; // Longer lines are noise, not telemetry

/// Open the port and start a reader thread sending lines to `tx`
///
/// The thread stops when the receiving side is dropped or the port fails.
/// Read timeouts are expected while the controller is silent and are not
/// treated as errors.
pub fn spawn_reader(
    port_name: &str,
    config: &DryerConfig,
    tx: mpsc::Sender<String>,
) -> Result<JoinHandle<()>, Box<dyn std::error::Error>> {
    let mut port = serialport::new(port_name, config.baud_rate)
        .timeout(config.read_timeout)
        .flow_control(FlowControl::None)
        .open()?;

    info!("Opened {} at {} baud", port_name, config.baud_rate);
    let port_name = port_name.to_string();

    let handle = thread::Builder::new()
        .name("serial-reader".into())
        .spawn(move || {
            let mut buf = [0u8; READ_CHUNK_BYTES];
            let mut pending = Vec::new();

            loop {
                match port.read(&mut buf) {
                    Ok(n) => {
                        for line in split_lines(&mut pending, &buf[..n]) {
                            if tx.blocking_send(line).is_err() {
                                debug!("Line receiver dropped, stopping reader");
                                return;
                            }
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                    Err(e) => {
                        error!("Serial read error on {}: {}", port_name, e);
                        return;
                    }
                }
            }
        })?;

    Ok(handle)
}

/// Append raw bytes and return every line they complete
///
/// Lines are trimmed, undecodable bytes are dropped and blank lines are
/// skipped. An unterminated tail stays in `pending` for the next call.
pub fn split_lines(pending: &mut Vec<u8>, bytes: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();

    for &byte in bytes {
        if byte == b'\n' {
            let line: String = String::from_utf8_lossy(pending)
                .chars()
                .filter(|c| *c != char::REPLACEMENT_CHARACTER)
                .collect();
            pending.clear();

            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        } else if pending.len() < MAX_LINE_BYTES {
            pending.push(byte);
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_partial_line_between_reads() {
        let mut pending = Vec::new();
        assert!(split_lines(&mut pending, b"T0:25.1 T1:2").is_empty());

        let lines = split_lines(&mut pending, b"5.3\r\nH1:50\n\nH2:");
        assert_eq!(lines, vec!["T0:25.1 T1:25.3", "H1:50"]);
        assert_eq!(pending, b"H2:");
    }

    #[test]
    fn drops_invalid_utf8() {
        let mut pending = Vec::new();
        let lines = split_lines(&mut pending, b"h_ave:\xff52.0\n");
        assert_eq!(lines, vec!["h_ave:52.0"]);
    }

    #[test]
    fn caps_runaway_lines() {
        let mut pending = Vec::new();
        let noise = vec![b'x'; MAX_LINE_BYTES * 2];
        assert!(split_lines(&mut pending, &noise).is_empty());
        assert_eq!(pending.len(), MAX_LINE_BYTES);

        let lines = split_lines(&mut pending, b"\npwm_2:10\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "pwm_2:10");
    }
}
