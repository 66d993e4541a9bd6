//! Optical Pulse CLI
//!
//! Command-line interface for testing and demonstrating the pulse
//! pipeline against a synthetic sample source.

use clap::Parser;
use optical_pulse::{
    analysis::SampleClassifier,
    capture::{FileConfig, FrameSource, SyntheticSource},
    pipeline::{EventConsumer, PipelineConfig, PipelineDispatcher, PipelineListener},
    record::JsonRecordWriter,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "optical-pulse", version, about = "Camera PPG pulse pipeline demo")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Number of frames to process (overrides the config file).
    #[arg(short, long)]
    frames: Option<u32>,

    /// Run until interrupted instead of a fixed frame count.
    #[arg(long)]
    continuous: bool,

    /// Simulated heart rate for the synthetic source.
    #[arg(long, default_value_t = 72.0)]
    bpm: f64,
}

/// Listener logging consumer-side events to the terminal.
struct ConsoleListener;

impl PipelineListener for ConsoleListener {
    fn on_bpm_update(&mut self, bpm: u16, timestamp: i64) {
        info!(bpm, timestamp, "Heart rate update");
    }

    fn on_intelligent_start_progress(&mut self, progress: f32, ready: bool) {
        if ready {
            info!("Intelligent start ready, recording is official");
        } else {
            tracing::debug!(progress, "Intelligent start progress");
        }
    }

    fn on_camera_covered(&mut self, covered: bool) {
        if !covered {
            warn!("Camera not covered, place a finger over the lens");
        }
    }

    fn on_abnormal_heart_rate(&mut self, is_abnormal: bool) {
        if is_abnormal {
            warn!("Abnormal heart rate detected");
        }
    }

    fn on_declining_heart_rate(&mut self, is_declining: bool) {
        if is_declining {
            warn!("Heart rate declining");
        }
    }

    fn on_pressure_excessive(&mut self, is_excessive: bool) {
        if is_excessive {
            warn!("Pressure excessive, lighten the finger contact");
        }
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Optical Pulse v{}", optical_pulse::VERSION);
    info!("This is a demonstration using a synthetic sample source");

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    let mut source = SyntheticSource::with_bpm(args.bpm);
    if let Err(e) = source.open(&config.capture) {
        eprintln!("Failed to open frame source: {}", e);
        std::process::exit(1);
    }

    let writer = match JsonRecordWriter::create(&config.output.record_path) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!("Failed to create record file: {}", e);
            std::process::exit(1);
        }
    };

    let (mut dispatcher, events) = PipelineDispatcher::new(PipelineConfig::from(&config), writer);
    let consumer = match EventConsumer::spawn(events, Box::new(ConsoleListener)) {
        Ok(consumer) => consumer,
        Err(e) => {
            eprintln!("Failed to spawn event consumer: {}", e);
            std::process::exit(1);
        }
    };

    let mut classifier = SampleClassifier::new();
    dispatcher.start();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        }) {
            warn!(error = %e, "Failed to install interrupt handler");
        }
    }

    let continuous = args.continuous || config.output.continuous;
    let frame_count = args.frames.unwrap_or(config.output.frame_count);
    let frame_period = std::time::Duration::from_secs_f64(1.0 / config.capture.fps as f64);

    info!(
        continuous,
        frames = frame_count,
        "Processing samples..."
    );

    let mut processed: u64 = 0;
    while running.load(Ordering::SeqCst) {
        if !continuous && processed >= frame_count as u64 {
            break;
        }

        let sample = match source.next_sample() {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Sample production failed: {}", e);
                continue;
            }
        };

        let flags = classifier.classify(&sample);
        dispatcher.on_sample(sample.with_flags(flags));
        processed += 1;

        if continuous {
            // Pace the stream at the configured frame rate.
            std::thread::sleep(frame_period);
        }
    }

    dispatcher.stop();
    source.close();

    info!(
        samples = dispatcher.samples_processed(),
        records = dispatcher.records_written(),
        gate_passed = dispatcher.gate().passed(),
        "Run complete"
    );

    if let Some(reading) = dispatcher.latest_reading() {
        println!(
            "Final estimate: {} bpm (confidence {:.2})",
            reading.bpm, reading.confidence
        );
    } else {
        println!("No heart rate estimate produced");
    }

    // Disconnect the event channel and let the consumer drain.
    drop(dispatcher);
    consumer.join();
}
