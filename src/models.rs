use time::OffsetDateTime;

/// One complete telemetry record from the dryer controller.
///
/// Only ever built by the frame parser once every field has been seen
/// and parsed, so consumers never observe a partially filled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFrame {
    pub temperatures: [f64; 9],
    pub humidity_1: f64,
    pub humidity_2: f64,
    pub t_ave_first: f64,
    pub t_ave_2nd: f64,
    pub h_ave: f64,
    pub pwm_1: f64,
    pub pwm_2: f64,
    /// Assigned on receipt, not by the device
    pub received_at: OffsetDateTime,
}

impl SensorFrame {
    /// Inputs for the fuzzy controller and the drying estimator
    pub fn control_inputs(&self) -> ControlInputs {
        ControlInputs {
            temperature: self.t_ave_2nd,
            humidity: self.h_ave,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInputs {
    pub temperature: f64,
    pub humidity: f64,
}

/// Value published for one output channel in a control cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelOutput<T> {
    /// Computed from the current frame
    Fresh(T),
    /// Computation failed; last known good value re-served
    Fallback(T),
    /// Computation failed and nothing has ever succeeded
    Unavailable,
}

impl<T: Copy> ChannelOutput<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            ChannelOutput::Fresh(v) | ChannelOutput::Fallback(v) => Some(*v),
            ChannelOutput::Unavailable => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, ChannelOutput::Fresh(_))
    }
}

/// Result of running one frame through the control cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub frame: SensorFrame,
    pub adjustment: ChannelOutput<f64>,
    pub drying_seconds: ChannelOutput<u64>,
}
