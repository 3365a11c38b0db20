mod config;
mod control;
mod error;
mod models;
mod serial;
mod telemetry;
mod utils;

use log::{debug, error, info, warn};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::time::interval;

use config::DryerConfig;
use control::{ControlLoop, DryingTimeEstimator, LastKnownGood};
use models::{ChannelOutput, CycleReport};
use serial::{spawn_reader, wait_for_port};
use utils::{duration_to_seconds, format_datetime, format_drying_time};

const LINE_CHANNEL_CAPACITY: usize = 64;

async fn main_loop(
    config: DryerConfig,
    outputs: Arc<LastKnownGood>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting maize dryer monitor");

    let port_name = wait_for_port(&config).await?;

    let (tx, mut rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    let _reader = spawn_reader(&port_name, &config, tx)?;

    let mut control = ControlLoop::new(
        DryingTimeEstimator::with_ceiling(config.max_drying_secs),
        outputs,
    );

    // Lines arrive in order from a single reader, so frames stay ordered
    while let Some(line) = rx.recv().await {
        debug!("Serial line: {:?}", line);

        if let Some(report) = control.process_chunk(&line) {
            log_report(&report);
        }
    }

    Err(format!("Serial reader on {} stopped", port_name).into())
}

fn log_report(report: &CycleReport) {
    let frame = &report.frame;

    info!("Frame received at {}:", format_datetime(&frame.received_at));
    info!("  Average temperature (1st stage): {:.2}°C", frame.t_ave_first);
    info!("  Average temperature (2nd stage): {:.2}°C", frame.t_ave_2nd);
    info!("  Average humidity: {:.2}%", frame.h_ave);
    info!("  PWM 1: {}  PWM 2: {}", frame.pwm_1, frame.pwm_2);

    debug!("  Temperatures T0..T8: {:?}", frame.temperatures);
    debug!("  Humidity H1: {:.2}%  H2: {:.2}%", frame.humidity_1, frame.humidity_2);

    log_channel("Temperature adjustment", report.adjustment, |value| {
        format!("{:.2}°C", value)
    });
    log_channel("Drying time", report.drying_seconds, format_drying_time);
}

fn log_channel<T: Copy>(label: &str, output: ChannelOutput<T>, render: impl Fn(T) -> String) {
    match output.value() {
        Some(value) if output.is_fresh() => info!("  {}: {}", label, render(value)),
        Some(value) => warn!("  {} (last known good): {}", label, render(value)),
        None => warn!("  {}: unavailable", label),
    }
}

/// Periodically publish the retained outputs, as a display would read them
async fn status_reporter(outputs: Arc<LastKnownGood>, period: tokio::time::Duration) {
    let mut ticker = interval(period);

    loop {
        ticker.tick().await;
        let snapshot = outputs.snapshot();
        let now = OffsetDateTime::now_utc();

        if snapshot.adjustment.is_none() && snapshot.drying_seconds.is_none() {
            info!("Status: waiting for first valid frame");
            continue;
        }

        let adjustment = match snapshot.adjustment {
            Some((value, at)) => format!(
                "{:.2}°C (updated {}s ago)",
                value,
                duration_to_seconds(now - at)
            ),
            None => "Error".to_string(),
        };
        let drying = match snapshot.drying_seconds {
            Some((secs, at)) => format!(
                "{} (updated {}s ago)",
                format_drying_time(secs),
                duration_to_seconds(now - at)
            ),
            None => "Error".to_string(),
        };

        info!("Status: adjustment {}, dry time {}", adjustment, drying);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match DryerConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let outputs = Arc::new(LastKnownGood::new());
    tokio::spawn(status_reporter(outputs.clone(), config.status_interval));

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        let _ = tx.send(());
    });

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config, outputs) => {
            match result {
                Ok(_) => info!("Monitor stopped"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
