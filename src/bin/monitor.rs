//! Standalone Transient Monitor
//!
//! Runs the transient/beat tracker against the default input device so the
//! detector can be tuned without loading the plugin into a host. Prints
//! one line per detected onset with its offset from the nearest beat.
//!
//! Usage: monitor [bpm] [threshold]

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jamlink::audio::AudioProcessor;
use jamlink::bridge::SessionBridge;
use jamlink::constants::DEFAULT_TRANSIENT_THRESHOLD;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bpm: f32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(120.0);
    let threshold: f32 = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TRANSIENT_THRESHOLD);

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("no default input device")?;
    let config = device
        .default_input_config()
        .context("no default input config")?;
    let sample_rate = config.sample_rate().0 as f64;
    let channels = config.channels() as usize;

    tracing::info!(
        device = %device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate,
        channels,
        bpm,
        threshold,
        "starting transient monitor"
    );

    // No session thread: the snapshot is seeded once with a fixed tempo so
    // the phase clock free-runs at the requested BPM.
    let bridge = Arc::new(SessionBridge::new());
    bridge.snapshot.bpm.store(bpm, Ordering::Relaxed);
    bridge
        .snapshot
        .transient_threshold
        .store(threshold, Ordering::Relaxed);

    let mut processor = AudioProcessor::new(bridge.clone(), sample_rate);
    let mut left = Vec::new();
    let mut right = Vec::new();

    let stream = device
        .build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                left.clear();
                right.clear();
                for frame in data.chunks(channels) {
                    left.push(frame[0]);
                    right.push(*frame.get(1).unwrap_or(&frame[0]));
                }
                processor.process(&left, &right, &left, &right);
            },
            |err| tracing::error!("stream error: {}", err),
            None,
        )
        .context("failed to build input stream")?;
    stream.play().context("failed to start stream")?;

    let beat_ms = 60_000.0 / bpm as f64;
    println!("listening; play along and watch your offsets (Ctrl-C to quit)");
    loop {
        if let Some(offset) = bridge.snapshot.take_transient() {
            // Offset is in beat cycles; 0 means dead on the beat.
            let ms = offset as f64 * beat_ms;
            let verdict = if ms.abs() <= 10.0 {
                "on beat"
            } else if ms < 0.0 {
                "early"
            } else {
                "late"
            };
            println!("{:+7.1} ms  {}", ms, verdict);
        }
        std::thread::sleep(Duration::from_millis(16));
    }
}
