//! Motion Window Collector CLI
//!
//! Collects one window of motion samples, asks for a collision label, and
//! uploads it.

use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use motion_window_collector::{
    collector::{SimulatedSensor, SimulatedSensorConfig},
    config::Config,
    core::compute_features,
    session::{CollectionSession, SessionEvent},
    telemetry::create_shared_log_with_persistence,
    upload::{HttpTransport, UploadError},
    VERSION,
};
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "motion-collector")]
#[command(version = VERSION)]
#[command(about = "Collect a window of motion samples and upload it as collision data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect one window and upload it
    Collect {
        /// Label the window as a collision
        #[arg(long, conflicts_with = "no_collision")]
        collision: bool,

        /// Label the window as a non-collision
        #[arg(long)]
        no_collision: bool,

        /// Print the request body instead of sending it
        #[arg(long)]
        dry_run: bool,

        /// Native rate of the simulated accelerometer (Hz)
        #[arg(long, default_value = "50")]
        accel_hz: f64,

        /// Native rate of the simulated gyroscope (Hz)
        #[arg(long, default_value = "59")]
        gyro_hz: f64,
    },

    /// Show configuration and cumulative statistics
    Status,

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            collision,
            no_collision,
            dry_run,
            accel_hz,
            gyro_hz,
        } => {
            let label = match (collision, no_collision) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cmd_collect(label, dry_run, accel_hz, gyro_hz);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn cmd_collect(label: Option<bool>, dry_run: bool, accel_hz: f64, gyro_hz: f64) {
    println!("Motion Window Collector v{VERSION}");
    println!();

    let config = Config::load().unwrap_or_default();
    let settings = match config.session_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let transport = match HttpTransport::new(config.request_timeout) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    println!("Starting collection...");
    println!("  Window: {} samples", settings.capacity);
    println!("  Sampling period: {}ms", settings.sampling_period.as_millis());
    println!("  Sensor rates: accel {accel_hz}Hz, gyro {gyro_hz}Hz (simulated)");
    println!("  Endpoint: {}", settings.endpoint);
    println!();
    println!("Press Ctrl+C to cancel");
    println!();

    let log = create_shared_log_with_persistence(config.stats_path());
    let sensor = Arc::new(SimulatedSensor::new(SimulatedSensorConfig::from_rates(
        accel_hz, gyro_hz,
    )));
    let session = CollectionSession::with_log(sensor, transport, settings, log.clone());
    let events = session.subscribe();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    if let Err(e) = session.start() {
        eprintln!("Error starting collection: {e}");
        std::process::exit(1);
    }

    let mut ready = false;
    while running.load(Ordering::SeqCst) && !ready {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(SessionEvent::SampleRecorded { count }) => {
                if count % 10 == 0 {
                    let capacity = session.snapshot().capacity;
                    println!("  Collected {count}/{capacity} samples");
                }
            }
            Ok(SessionEvent::WindowReady { window_id }) => {
                println!("Window {window_id} complete");
                ready = true;
            }
            Ok(_) => {}
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                eprintln!("Session disconnected unexpectedly");
                break;
            }
        }
    }

    if !ready {
        println!();
        println!("Collection cancelled, discarding partial window.");
        session.reset();
        save_log(&log);
        return;
    }

    let window = session.window();
    let features = compute_features(&window);
    println!();
    println!("Window summary:");
    println!(
        "  Duration: {:.1}s ({:.1} Hz)",
        features.duration_secs, features.effective_rate_hz
    );
    println!(
        "  Acceleration: mean {:.2}, std {:.2}, peak {:.2} m/s²",
        features.accel.mean, features.accel.std_dev, features.accel.peak
    );
    println!(
        "  Angular rate: mean {:.3}, std {:.3}, peak {:.3} rad/s",
        features.gyro.mean, features.gyro.std_dev, features.gyro.peak
    );
    println!("  Acceleration spikes: {}", features.acceleration_spikes);
    println!();

    let is_collision = match label.or_else(prompt_label) {
        Some(is_collision) => is_collision,
        None => {
            eprintln!("No label selected; window not uploaded.");
            session.reset();
            save_log(&log);
            std::process::exit(1);
        }
    };

    if dry_run {
        match session.preview_request(is_collision) {
            Ok(request) => match serde_json::to_string_pretty(&request) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error serializing request: {e}"),
            },
            Err(e) => eprintln!("Error building request: {e}"),
        }
        save_log(&log);
        return;
    }

    let classification = if is_collision {
        "collision"
    } else {
        "non-collision"
    };
    println!("Uploading ({classification})...");
    match runtime.block_on(session.submit(is_collision)) {
        Ok(response) => {
            println!("Upload succeeded ({})", response.status);
            println!("{}", response.body);
        }
        Err(UploadError::AlreadyUploaded) => {
            println!("This window was already uploaded. Run 'motion-collector collect' again for a new one.");
        }
        Err(e) => {
            eprintln!("Upload failed: {e}");
        }
    }

    save_log(&log);
    println!();
    println!("{}", log.summary());
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Motion Window Collector Status");
    println!("==============================");
    println!();

    println!("Configuration:");
    println!("  Window capacity: {} samples", config.window_capacity);
    println!("  Sampling period: {}ms", config.sampling_period.as_millis());
    println!("  Endpoint: {}", config.endpoint);
    println!("  Platform: {}", config.platform);
    println!("  Time zone: {}", config.timezone);
    if let Err(e) = config.validate() {
        println!("  Problem: {e}");
    }
    println!();

    let stats_path = config.stats_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                for key in [
                    "accel_events",
                    "gyro_events",
                    "samples_recorded",
                    "windows_completed",
                    "uploads_attempted",
                    "uploads_succeeded",
                    "uploads_failed",
                    "uploads_abandoned",
                ] {
                    if let Some(value) = stats.get(key) {
                        println!("  {}: {value}", key.replace('_', " "));
                    }
                }
            }
        }
    } else {
        println!("No previous collection data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Ask for the collision label on stdin.
fn prompt_label() -> Option<bool> {
    print!("Was this a collision? [y/n]: ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn save_log(log: &motion_window_collector::SharedCollectionLog) {
    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save collection stats: {e}");
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
