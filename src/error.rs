use thiserror::Error;

/// Recoverable failures of the control core.
///
/// None of these is fatal: the control cycle falls back to the last known
/// good value of the affected channel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DryerError {
    /// Terminator seen but the record was incomplete or non-numeric
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// Aggregated fuzzy output set is empty
    #[error("no fuzzy rule fired for temperature {temperature} and humidity {humidity}")]
    NoRuleFired { temperature: f64, humidity: f64 },
    /// Relative humidity outside [0, 100)
    #[error("relative humidity {0}% is outside [0, 100)")]
    InvalidHumidity(f64),
    /// Temperature outside the isotherm's domain
    #[error("temperature {0}°C is outside the isotherm domain")]
    InvalidTemperature(f64),
    /// Moisture never entered the target band before the ceiling
    #[error("moisture target not reached within {ceiling_secs} seconds")]
    TargetUnreachable { ceiling_secs: u64 },
}
