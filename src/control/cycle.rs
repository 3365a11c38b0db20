/// Control cycle: frames in, adjustment and drying estimate out
use log::{debug, warn};
use std::sync::{Arc, PoisonError, RwLock};
use time::OffsetDateTime;

use crate::control::{DryingTimeEstimator, FuzzyTemperatureController};
use crate::error::DryerError;
use crate::models::{ChannelOutput, CycleReport, SensorFrame};
use crate::telemetry::FrameParser;

/// Latest successful value of each output channel, with the capture time
/// of the frame it was computed from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub adjustment: Option<(f64, OffsetDateTime)>,
    pub drying_seconds: Option<(u64, OffsetDateTime)>,
}

/// Thread-safe holder for the last known good outputs
///
/// Written by the control cycle, read by whoever presents the values.
/// Both channels of a cycle are published under one write lock, so a
/// reader never sees a cycle half applied.
#[derive(Debug, Default)]
pub struct LastKnownGood {
    inner: RwLock<Snapshot>,
}

impl LastKnownGood {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish one cycle's results, re-serving stored values for failures
    pub fn publish(
        &self,
        adjustment: Result<f64, DryerError>,
        drying_seconds: Result<u64, DryerError>,
        at: OffsetDateTime,
    ) -> (ChannelOutput<f64>, ChannelOutput<u64>) {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        (
            record(&mut snapshot.adjustment, adjustment, at),
            record(&mut snapshot.drying_seconds, drying_seconds, at),
        )
    }
}

/// Store a success with its timestamp, or fall back to what the slot holds
fn record<T: Copy>(
    slot: &mut Option<(T, OffsetDateTime)>,
    result: Result<T, DryerError>,
    at: OffsetDateTime,
) -> ChannelOutput<T> {
    match (result, *slot) {
        (Ok(value), _) => {
            *slot = Some((value, at));
            ChannelOutput::Fresh(value)
        }
        (Err(_), Some((previous, _))) => ChannelOutput::Fallback(previous),
        (Err(_), None) => ChannelOutput::Unavailable,
    }
}

/// Feeds text chunks through the parser and both estimators
pub struct ControlLoop {
    parser: FrameParser,
    controller: FuzzyTemperatureController,
    estimator: DryingTimeEstimator,
    outputs: Arc<LastKnownGood>,
}

impl ControlLoop {
    pub fn new(estimator: DryingTimeEstimator, outputs: Arc<LastKnownGood>) -> Self {
        Self {
            parser: FrameParser::new(),
            controller: FuzzyTemperatureController::new(),
            estimator,
            outputs,
        }
    }

    /// Feed one chunk from the transport
    ///
    /// Returns a report only when the chunk completed a valid frame.
    /// Malformed frames are dropped here; the parser has already logged them.
    pub fn process_chunk(&mut self, chunk: &str) -> Option<CycleReport> {
        match self.parser.push(chunk) {
            Ok(Some(frame)) => Some(self.run_cycle(frame)),
            Ok(None) => {
                debug!("Waiting for terminator, {} bytes pending", self.parser.pending().len());
                None
            }
            Err(e) => {
                debug!("No frame this cycle: {}", e);
                None
            }
        }
    }

    /// Run both estimators on a frame and publish the results
    pub fn run_cycle(&self, frame: SensorFrame) -> CycleReport {
        let inputs = frame.control_inputs();

        let adjustment = self.controller.compute(inputs.temperature, inputs.humidity);
        if let Err(e) = &adjustment {
            warn!("Fuzzy computation failed, using last known good adjustment: {}", e);
        }

        let drying_seconds = self.estimator.compute(inputs.temperature, inputs.humidity);
        if let Err(e) = &drying_seconds {
            warn!("Drying estimate failed, using last known good value: {}", e);
        }

        let (adjustment, drying_seconds) =
            self.outputs.publish(adjustment, drying_seconds, frame.received_at);

        CycleReport {
            frame,
            adjustment,
            drying_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn record(t_ave_2nd: f64, h_ave: f64) -> String {
        format!(
            "T0:30 T1:30 T2:30 T3:30 T4:30 T5:30 T6:30 T7:30 T8:30 H1:50 H2:50 \
             t_ave_first:30 t_ave_2nd:{} h_ave:{} pwm_1:100 pwm_2:150",
            t_ave_2nd, h_ave
        )
    }

    fn control_loop() -> (ControlLoop, Arc<LastKnownGood>) {
        let outputs = Arc::new(LastKnownGood::new());
        let control = ControlLoop::new(DryingTimeEstimator::default(), outputs.clone());
        (control, outputs)
    }

    #[test]
    fn fresh_values_on_good_frame() {
        let (mut control, outputs) = control_loop();
        let report = control.process_chunk(&record(28.0, 52.08)).unwrap();

        assert!(report.adjustment.is_fresh());
        assert!(report.drying_seconds.is_fresh());
        assert_eq!(report.frame.pwm_2, 150.0);

        let at = report.frame.received_at;
        let snapshot = outputs.snapshot();
        assert_eq!(snapshot.adjustment, report.adjustment.value().map(|v| (v, at)));
        assert_eq!(snapshot.drying_seconds, report.drying_seconds.value().map(|v| (v, at)));
    }

    #[test]
    fn failures_fall_back_to_last_known_good() {
        let (mut control, outputs) = control_loop();
        let first = control.process_chunk(&record(28.0, 52.08)).unwrap();
        let before = outputs.snapshot();

        // Saturated air: no rule fires and the isotherm is undefined
        let second = control.process_chunk(&record(80.0, 100.0)).unwrap();

        assert_eq!(
            second.adjustment,
            ChannelOutput::Fallback(first.adjustment.value().unwrap())
        );
        assert_eq!(
            second.drying_seconds,
            ChannelOutput::Fallback(first.drying_seconds.value().unwrap())
        );
        assert_eq!(outputs.snapshot(), before);
    }

    #[test]
    fn failure_without_history_is_unavailable() {
        let (mut control, outputs) = control_loop();
        let report = control.process_chunk(&record(80.0, 100.0)).unwrap();

        assert_eq!(report.adjustment, ChannelOutput::Unavailable);
        assert_eq!(report.drying_seconds, ChannelOutput::Unavailable);
        assert_eq!(outputs.snapshot(), Snapshot::default());
    }

    #[test]
    fn channels_fall_back_independently() {
        let (mut control, _outputs) = control_loop();
        control.process_chunk(&record(28.0, 52.08)).unwrap();

        // Too hot for any temperature set, but the isotherm is defined
        let report = control.process_chunk(&record(80.0, 45.0)).unwrap();
        assert!(matches!(report.adjustment, ChannelOutput::Fallback(_)));
        assert!(report.drying_seconds.is_fresh());
    }

    #[test]
    fn failing_channel_keeps_its_own_timestamp() {
        let outputs = LastKnownGood::new();
        let t0 = OffsetDateTime::UNIX_EPOCH;
        let later = t0 + time::Duration::hours(5);

        outputs.publish(Ok(40.0), Ok(5378), t0);
        let (adjustment, drying_seconds) =
            outputs.publish(Ok(41.0), Err(DryerError::InvalidHumidity(100.0)), later);

        assert_eq!(adjustment, ChannelOutput::Fresh(41.0));
        assert_eq!(drying_seconds, ChannelOutput::Fallback(5378));

        let snapshot = outputs.snapshot();
        assert_eq!(snapshot.adjustment, Some((41.0, later)));
        assert_eq!(snapshot.drying_seconds, Some((5378, t0)));
    }

    #[test]
    fn malformed_and_partial_chunks_yield_nothing() {
        let (mut control, outputs) = control_loop();
        assert!(control.process_chunk("T0:30 T1:30").is_none());
        assert!(control.process_chunk("H1:50 pwm_2:1").is_none());
        assert_eq!(outputs.snapshot(), Snapshot::default());
        assert!(control.process_chunk(&record(28.0, 52.08)).is_some());
    }

    #[test]
    fn snapshot_readable_from_another_thread() {
        let outputs = Arc::new(LastKnownGood::new());
        let mut control = ControlLoop::new(DryingTimeEstimator::default(), outputs.clone());
        let report = control.process_chunk(&record(28.0, 52.08)).unwrap();

        let reader = thread::spawn(move || outputs.snapshot());
        let snapshot = reader.join().unwrap();
        assert_eq!(
            snapshot.drying_seconds.map(|(secs, _)| secs),
            report.drying_seconds.value()
        );
    }
}
