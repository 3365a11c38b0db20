/// Thin-layer drying time estimate for maize
///
/// Moisture decays exponentially from the harvest content towards the
/// Henderson isotherm equilibrium, simulated one second at a time.
use crate::error::DryerError;

// Isotherm constants
const C: f64 = 57.286;
const N: f64 = 1.544;
const K_BASE: f64 = 0.0002653;

const INITIAL_MOISTURE: f64 = 28.0; // % wet basis at harvest
const TARGET_LOW: f64 = 13.0;
const TARGET_HIGH: f64 = 14.0;

pub const DEFAULT_CEILING_SECS: u64 = 30 * 24 * 3600; // 30 days

/// Equilibrium moisture content (%) for the given air state
pub fn equilibrium_moisture(temperature: f64, relative_humidity: f64) -> Result<f64, DryerError> {
    if !(0.0..100.0).contains(&relative_humidity) {
        return Err(DryerError::InvalidHumidity(relative_humidity));
    }
    if !temperature.is_finite() || temperature + C <= 0.0 {
        return Err(DryerError::InvalidTemperature(temperature));
    }

    let numerator = -(1.0 - relative_humidity / 100.0).ln();
    let denominator = K_BASE * (temperature + C);
    Ok((numerator / denominator).powf(1.0 / N))
}

/// Drying rate constant (1/s)
pub fn rate_constant(temperature: f64) -> f64 {
    K_BASE * (-1.544 / (temperature + 273.15)).exp()
}

/// Working state of one simulation run
#[derive(Debug, Clone, Copy)]
struct DryingModelState {
    equilibrium: f64,
    rate: f64,
    elapsed_secs: u64,
    moisture: f64,
}

impl DryingModelState {
    fn new(equilibrium: f64, rate: f64) -> Self {
        Self {
            equilibrium,
            rate,
            elapsed_secs: 0,
            moisture: INITIAL_MOISTURE,
        }
    }

    fn update_moisture(&mut self) {
        let decay = (-self.rate * self.elapsed_secs as f64).exp();
        self.moisture = INITIAL_MOISTURE * decay + self.equilibrium * (1.0 - decay);
    }

    fn in_target_band(&self) -> bool {
        (TARGET_LOW..=TARGET_HIGH).contains(&self.moisture)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DryingTimeEstimator {
    ceiling_secs: u64,
}

impl Default for DryingTimeEstimator {
    fn default() -> Self {
        Self::with_ceiling(DEFAULT_CEILING_SECS)
    }
}

impl DryingTimeEstimator {
    /// Estimator that gives up after `ceiling_secs` of simulated time
    pub fn with_ceiling(ceiling_secs: u64) -> Self {
        Self { ceiling_secs }
    }

    /// Seconds until the grain moisture enters the 13-14 % band
    ///
    /// # Arguments
    /// * `temperature` - Average drying air temperature in °C
    /// * `relative_humidity` - Average relative humidity in %
    ///
    /// # Returns
    /// Elapsed seconds, `InvalidHumidity`/`InvalidTemperature` for inputs
    /// outside the isotherm domain, or `TargetUnreachable` when the band is
    /// not reached within the ceiling
    pub fn compute(&self, temperature: f64, relative_humidity: f64) -> Result<u64, DryerError> {
        let equilibrium = equilibrium_moisture(temperature, relative_humidity)?;
        let mut state = DryingModelState::new(equilibrium, rate_constant(temperature));

        for elapsed_secs in 0..=self.ceiling_secs {
            state.elapsed_secs = elapsed_secs;
            state.update_moisture();
            if state.in_target_band() {
                return Ok(elapsed_secs);
            }
        }

        Err(DryerError::TargetUnreachable {
            ceiling_secs: self.ceiling_secs,
        })
    }
}
