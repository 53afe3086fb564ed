//! Monitor receiver events.
//!
//! Subscribes to the event stream and prints every change the receiver
//! reports, whether caused by this program, a remote or the front panel.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p avrlib --example monitor_events -- /dev/ttyUSB0
//! ```

use std::time::Duration;

use avrlib::iscp::IscpBuilder;
use avrlib::{Receiver, ReceiverEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let serial_port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    println!("Connecting to receiver on {serial_port}...");

    let receiver = IscpBuilder::new()
        .serial_port(&serial_port)
        .build()
        .await?;

    // Subscribe before the startup queries are answered.
    let mut events = receiver.subscribe();
    println!("Monitoring for 60 seconds (try the remote or the volume knob)\n");

    println!("{:<12} Event", "Timestamp");
    println!("{:-<12} {:-<50}", "", "");

    let start = tokio::time::Instant::now();
    let deadline = start + Duration::from_secs(60);

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        match tokio::time::timeout(remaining, events.recv()).await {
            Ok(Ok(event)) => {
                let elapsed = start.elapsed();
                let timestamp = format!("{:>6}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis());

                match event {
                    ReceiverEvent::PowerChanged { state } => {
                        println!("{timestamp} PowerChanged  -> {state}");
                    }
                    ReceiverEvent::MuteChanged { state } => {
                        println!("{timestamp} MuteChanged   -> {state}");
                    }
                    ReceiverEvent::VolumeChanged { percent } => {
                        println!("{timestamp} VolumeChanged -> {percent:.1}%");
                    }
                    ReceiverEvent::InputChanged { input } => {
                        println!("{timestamp} InputChanged  -> {input}");
                    }
                    ReceiverEvent::Identified { payload } => {
                        println!("{timestamp} Identified    {payload}");
                    }
                    ReceiverEvent::Disconnected => {
                        println!("{timestamp} Disconnected");
                        break;
                    }
                }
            }
            Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(n))) => {
                println!("(missed {n} events due to lag)");
            }
            Ok(Err(tokio::sync::broadcast::error::RecvError::Closed)) => {
                println!("Event channel closed.");
                break;
            }
            Err(_) => break,
        }
    }

    println!("\nMonitoring complete.");
    receiver.shutdown().await?;
    Ok(())
}
