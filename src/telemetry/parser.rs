/// Reassembly of dryer telemetry frames from a chunked text stream
use log::{debug, warn};
use std::collections::HashMap;
use time::OffsetDateTime;

use crate::error::DryerError;
use crate::models::SensorFrame;

// Wire format constants
const TERMINATOR: &str = "pwm_2:"; // Last field the controller sends in a record
const TEMPERATURE_KEYS: [&str; 9] = ["T0", "T1", "T2", "T3", "T4", "T5", "T6", "T7", "T8"];

/// Accumulates text chunks until a full record has been received
///
/// The controller prints records as whitespace separated `KEY:VALUE` tokens
/// spread over one or more lines, with `pwm_2` always last. Chunks are
/// joined with a single space so token boundaries survive however the
/// transport happened to split the stream.
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: String,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, stamping any completed frame with the current time
    pub fn push(&mut self, chunk: &str) -> Result<Option<SensorFrame>, DryerError> {
        self.push_at(chunk, OffsetDateTime::now_utc())
    }

    /// Feed one chunk of text into the parser
    ///
    /// Once the pending buffer contains the terminator key, the buffer is
    /// tokenized and cleared regardless of whether the record turns out to
    /// be valid, so a broken record never leaks into the next one.
    ///
    /// # Arguments
    /// * `chunk` - Text received from the transport (partial line, line or several lines)
    /// * `received_at` - Capture timestamp assigned to a completed frame
    ///
    /// # Returns
    /// `Ok(None)` while the record is incomplete, `Ok(Some(frame))` for a
    /// valid record, `Err(MalformedFrame)` when the record had to be dropped
    pub fn push_at(
        &mut self,
        chunk: &str,
        received_at: OffsetDateTime,
    ) -> Result<Option<SensorFrame>, DryerError> {
        self.buffer.push_str(chunk);
        self.buffer.push(' ');

        if !self.buffer.contains(TERMINATOR) {
            return Ok(None);
        }

        let record = std::mem::take(&mut self.buffer);
        debug!("Received full record: {:?}", record.trim());

        let fields = tokenize(&record);
        match build_frame(&fields, received_at) {
            Ok(frame) => Ok(Some(frame)),
            Err(e) => {
                warn!("Dropping record: {}", e);
                Err(e)
            }
        }
    }

    /// Text received since the last completed record
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// Split a record into `KEY:VALUE` pairs, later duplicates replacing earlier ones
fn tokenize(record: &str) -> HashMap<&str, &str> {
    let mut fields = HashMap::new();

    for token in record.split_whitespace() {
        match token.split_once(':') {
            Some((key, value)) if !key.is_empty() => {
                fields.insert(key, value);
            }
            _ => debug!("Ignoring stray token {:?}", token),
        }
    }

    fields
}

fn build_frame(
    fields: &HashMap<&str, &str>,
    received_at: OffsetDateTime,
) -> Result<SensorFrame, DryerError> {
    let field = |key: &str| -> Result<f64, DryerError> {
        let raw = fields
            .get(key)
            .ok_or_else(|| DryerError::MalformedFrame(format!("missing key {}", key)))?;

        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                DryerError::MalformedFrame(format!("non-numeric value for {}: {:?}", key, raw))
            })
    };

    let mut temperatures = [0.0; 9];
    for (slot, key) in temperatures.iter_mut().zip(TEMPERATURE_KEYS) {
        *slot = field(key)?;
    }

    Ok(SensorFrame {
        temperatures,
        humidity_1: field("H1")?,
        humidity_2: field("H2")?,
        t_ave_first: field("t_ave_first")?,
        t_ave_2nd: field("t_ave_2nd")?,
        h_ave: field("h_ave")?,
        pwm_1: field("pwm_1")?,
        pwm_2: field("pwm_2")?,
        received_at,
    })
}
