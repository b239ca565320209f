//! Demonstration of a full collect → classify → upload cycle.
//!
//! This example shows how to:
//! 1. Create a session on the simulated motion sensor
//! 2. Follow collection progress through session notifications
//! 3. Compute window features
//! 4. Submit through a custom transport (here one that only echoes)
//! 5. See the second submission rejected
//!
//! Run with: cargo run --example collect_demo

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use motion_window_collector::{
    collector::{SimulatedSensor, SimulatedSensorConfig},
    core::compute_features,
    session::{CollectionSession, SessionEvent, SessionSettings},
    upload::{Transport, TransportError, TransportResponse, UploadRequest},
};

/// Prints the request instead of sending it.
struct EchoTransport;

impl Transport for EchoTransport {
    async fn put(
        &self,
        endpoint: &str,
        request: &UploadRequest,
    ) -> Result<TransportResponse, TransportError> {
        let json = serde_json::to_string_pretty(request)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;
        println!("  PUT {endpoint}");
        for line in json.lines().take(12) {
            println!("    {line}");
        }
        println!("    ...");
        Ok(TransportResponse {
            status: 200,
            body: format!("{{\"saved\": {}}}", request.samples.len()),
        })
    }
}

#[tokio::main]
async fn main() {
    println!("Motion Window Collector - Collection Demo");
    println!("=========================================");
    println!();

    let sensor = Arc::new(SimulatedSensor::new(SimulatedSensorConfig::default()));
    let session = CollectionSession::new(sensor, EchoTransport, SessionSettings::default());
    let events = session.subscribe();

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    println!("Collecting 100 samples at 10 Hz (about 10 seconds)...");
    if let Err(e) = session.start() {
        eprintln!("Error starting collection: {e}");
        return;
    }

    // Wait for the window on a blocking thread so the runtime stays free
    let waiter = tokio::task::spawn_blocking(move || {
        while running.load(Ordering::SeqCst) {
            match events.recv_timeout(Duration::from_millis(100)) {
                Ok(SessionEvent::SampleRecorded { count }) if count % 25 == 0 => {
                    println!("  {count} samples");
                }
                Ok(SessionEvent::WindowReady { .. }) => return true,
                Ok(_) => {}
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
        false
    });

    if !waiter.await.unwrap_or(false) {
        println!("Cancelled.");
        session.reset();
        return;
    }

    let features = compute_features(&session.window());
    println!();
    println!("=== Window Completed ===");
    println!("  Samples: {}", features.sample_count);
    println!("  Duration: {:.1}s", features.duration_secs);
    println!("  Peak acceleration: {:.2} m/s²", features.accel.peak);
    println!("  Peak angular rate: {:.3} rad/s", features.gyro.peak);
    println!();

    println!("Submitting as non-collision:");
    match session.submit(false).await {
        Ok(response) => println!("  -> {} {}", response.status, response.body),
        Err(e) => println!("  -> failed: {e}"),
    }

    println!();
    println!("Submitting again:");
    match session.submit(false).await {
        Ok(_) => println!("  -> unexpectedly accepted"),
        Err(e) => println!("  -> rejected: {e}"),
    }

    println!();
    println!("{}", session.log().summary());
    println!();
    println!("Demo complete!");
}
