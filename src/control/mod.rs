pub mod cycle;
pub mod drying;
pub mod fuzzy;

pub use cycle::{ControlLoop, LastKnownGood};
pub use drying::DryingTimeEstimator;
pub use fuzzy::FuzzyTemperatureController;
