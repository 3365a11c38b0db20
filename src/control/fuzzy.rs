/// Mamdani fuzzy controller for the dryer temperature setpoint
///
/// Inputs are fuzzified with fixed triangular sets, rules combine with
/// min/max and the output is the centroid over the integer grid 25..=73.
use crate::error::DryerError;

// Output universe, shared with the temperature input
const OUTPUT_MIN: i32 = 25;
const OUTPUT_MAX: i32 = 73;

/// Linguistic labels of the temperature input and of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    Warm,
    High,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Low, Level::Warm, Level::High];

    fn index(self) -> usize {
        match self {
            Level::Low => 0,
            Level::Warm => 1,
            Level::High => 2,
        }
    }

    /// Membership set over the temperature (and output) universe
    pub fn set(self) -> Triangle {
        match self {
            Level::Low => Triangle::new(25.0, 31.0, 36.0),
            Level::Warm => Triangle::new(34.0, 43.0, 60.0),
            Level::High => Triangle::new(55.0, 70.0, 73.0),
        }
    }
}

/// Linguistic labels of the humidity input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Humidity {
    Low,
    Average,
    High,
}

impl Humidity {
    pub fn set(self) -> Triangle {
        match self {
            Humidity::Low => Triangle::new(0.0, 30.0, 40.0),
            Humidity::Average => Triangle::new(30.0, 50.0, 60.0),
            Humidity::High => Triangle::new(55.0, 60.0, 90.0),
        }
    }
}

/// Triangular membership function with feet at `a`, `c` and peak at `b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    a: f64,
    b: f64,
    c: f64,
}

impl Triangle {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn membership(&self, x: f64) -> f64 {
        if x == self.b {
            1.0
        } else if x > self.a && x < self.b {
            (x - self.a) / (self.b - self.a)
        } else if x > self.b && x < self.c {
            (self.c - x) / (self.c - self.b)
        } else {
            // Outside the support, and NaN
            0.0
        }
    }
}

/// `(any of temperature) & humidity -> output`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub temperature: &'static [Level],
    pub humidity: Humidity,
    pub output: Level,
}

impl Rule {
    /// Degree to which the antecedent holds for the crisp inputs
    pub fn firing_strength(&self, temperature: f64, humidity: f64) -> f64 {
        let temperature = self
            .temperature
            .iter()
            .map(|level| level.set().membership(temperature))
            .fold(0.0, f64::max);

        temperature.min(self.humidity.set().membership(humidity))
    }
}

pub const RULES: [Rule; 7] = [
    Rule {
        temperature: &[Level::High, Level::Warm, Level::Low],
        humidity: Humidity::High,
        output: Level::Low,
    },
    Rule {
        temperature: &[Level::High],
        humidity: Humidity::Low,
        output: Level::High,
    },
    Rule {
        temperature: &[Level::High],
        humidity: Humidity::Average,
        output: Level::Warm,
    },
    Rule {
        temperature: &[Level::Warm],
        humidity: Humidity::Low,
        output: Level::High,
    },
    Rule {
        temperature: &[Level::Warm],
        humidity: Humidity::Average,
        output: Level::Warm,
    },
    Rule {
        temperature: &[Level::Low],
        humidity: Humidity::Low,
        output: Level::High,
    },
    Rule {
        temperature: &[Level::Low],
        humidity: Humidity::Average,
        output: Level::Warm,
    },
];

#[derive(Debug, Default, Clone, Copy)]
pub struct FuzzyTemperatureController;

impl FuzzyTemperatureController {
    pub fn new() -> Self {
        Self
    }

    pub fn rules(&self) -> &'static [Rule] {
        &RULES
    }

    /// Aggregated strength per output label, indexed like `Level::ALL`
    pub fn activation(&self, temperature: f64, humidity: f64) -> [f64; 3] {
        let mut strengths = [0.0_f64; 3];
        for rule in self.rules() {
            let slot = &mut strengths[rule.output.index()];
            *slot = slot.max(rule.firing_strength(temperature, humidity));
        }
        strengths
    }

    /// Compute the crisp temperature adjustment
    ///
    /// # Arguments
    /// * `temperature` - Drying chamber temperature in °C
    /// * `humidity` - Relative humidity in %
    ///
    /// # Returns
    /// Centroid of the aggregated output set, or `NoRuleFired` when the
    /// aggregated set is empty
    pub fn compute(&self, temperature: f64, humidity: f64) -> Result<f64, DryerError> {
        let strengths = self.activation(temperature, humidity);

        let mut weighted = 0.0;
        let mut total = 0.0;
        for x in OUTPUT_MIN..=OUTPUT_MAX {
            let x = f64::from(x);
            let mu = Level::ALL
                .iter()
                .map(|level| level.set().membership(x).min(strengths[level.index()]))
                .fold(0.0, f64::max);
            weighted += x * mu;
            total += mu;
        }

        if total == 0.0 {
            return Err(DryerError::NoRuleFired {
                temperature,
                humidity,
            });
        }

        Ok(weighted / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_membership_shape() {
        let low = Level::Low.set();
        assert_eq!(low.membership(25.0), 0.0);
        assert_eq!(low.membership(28.0), 0.5);
        assert_eq!(low.membership(31.0), 1.0);
        assert_eq!(low.membership(33.5), 0.5);
        assert_eq!(low.membership(36.0), 0.0);
        assert_eq!(low.membership(80.0), 0.0);
        assert_eq!(low.membership(f64::NAN), 0.0);
    }

    #[test]
    fn rule_base_is_enumerable() {
        let controller = FuzzyTemperatureController::new();
        let rules = controller.rules();
        assert_eq!(rules.len(), 7);
        assert_eq!(rules[0].temperature.len(), 3);
        assert_eq!(rules[0].humidity, Humidity::High);
        assert_eq!(rules[0].output, Level::Low);
        assert_eq!(
            rules.iter().filter(|rule| rule.output == Level::High).count(),
            3
        );
    }

    #[test]
    fn dry_air_at_moderate_heat_pushes_output_high() {
        let controller = FuzzyTemperatureController::new();
        let output = controller.compute(35.3, 10.0).unwrap();
        assert!(output > 25.0 && output < 73.0);
        assert!(output > 55.0, "expected high region, got {}", output);
    }

    #[test]
    fn humid_air_pulls_output_towards_low() {
        let controller = FuzzyTemperatureController::new();
        let output = controller.compute(43.0, 75.0).unwrap();
        assert!((output - 31.0).abs() < (output - 70.0).abs());
        assert!(output < 36.0, "expected low region, got {}", output);
    }

    #[test]
    fn saturated_humidity_yields_low_centroid() {
        let controller = FuzzyTemperatureController::new();

        // 60 %RH is the peak of high and the right foot of average
        assert_eq!(controller.activation(43.0, 60.0), [1.0, 0.0, 0.0]);

        let output = controller.compute(43.0, 60.0).unwrap();
        assert!((output - 31.0).abs() < (output - 70.0).abs());
        assert!((output - 30.667).abs() < 0.01, "got {}", output);
    }

    #[test]
    fn warm_and_average_centres_on_warm() {
        let controller = FuzzyTemperatureController::new();
        let output = controller.compute(43.0, 50.0).unwrap();
        assert!(output > 43.0 && output < 48.0, "got {}", output);
    }

    #[test]
    fn no_rule_fired_is_reported() {
        let controller = FuzzyTemperatureController::new();

        // 90 %RH sits on the right foot of the high humidity set
        assert_eq!(
            controller.compute(43.0, 90.0),
            Err(DryerError::NoRuleFired {
                temperature: 43.0,
                humidity: 90.0
            })
        );
        // Average humidity with a temperature outside every set
        assert!(controller.compute(80.0, 45.0).is_err());
        assert!(controller.compute(f64::NAN, 45.0).is_err());
    }

    #[test]
    fn compute_is_idempotent() {
        let controller = FuzzyTemperatureController::new();
        assert_eq!(
            controller.compute(58.0, 35.0),
            controller.compute(58.0, 35.0)
        );
    }
}
