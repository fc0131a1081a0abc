//! Speaker playback
//!
//! Decodes MP3 synthesis output and plays it on the default output
//! device. Playback is blocking and polls a cancel flag so an interrupt
//! takes effect between chunks, not at the end of the clip.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Playback sample rate (matches common synthesis output)
const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// How often the cancel flag is polled during playback
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Decode MP3 bytes to mono f32 samples
///
/// # Errors
///
/// Returns error if the data is not decodable MP3
pub fn decode_mp3(data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|pair| {
                        let left = f32::from(pair[0]) / 32768.0;
                        let right = f32::from(pair.get(1).copied().unwrap_or(pair[0])) / 32768.0;
                        (left + right) / 2.0
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("mp3 decode failed: {e}"))),
        }
    }

    Ok(samples)
}

/// Play samples to the default output device, blocking until done or
/// cancelled
///
/// # Errors
///
/// Returns error if no output device is available or the stream fails
pub fn play_blocking(samples: Vec<f32>, cancel: &AtomicBool) -> Result<()> {
    if samples.is_empty() || cancel.load(Ordering::Relaxed) {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))?;
    let config = output_config(&device)?;
    let channels = config.channels as usize;

    let total = samples.len();
    let samples = Arc::new(samples);
    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let stream = {
        let samples = Arc::clone(&samples);
        let position = Arc::clone(&position);
        let finished = Arc::clone(&finished);

        device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let pos = position.fetch_add(1, Ordering::Relaxed);
                        let sample = samples.get(pos).copied().unwrap_or_else(|| {
                            finished.store(true, Ordering::Relaxed);
                            0.0
                        });
                        frame.fill(sample);
                    }
                },
                |err| tracing::error!(error = %err, "playback stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?
    };

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let expected = Duration::from_millis(
        (total as u64).saturating_mul(1000) / u64::from(PLAYBACK_SAMPLE_RATE) + 500,
    );
    let started = Instant::now();

    while !finished.load(Ordering::Relaxed) && !cancel.load(Ordering::Relaxed) {
        if started.elapsed() > expected {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    drop(stream);

    if cancel.load(Ordering::Relaxed) {
        tracing::debug!(played = position.load(Ordering::Relaxed), total, "playback interrupted");
    } else {
        tracing::debug!(total, "playback complete");
    }
    Ok(())
}

/// Pick a 24 kHz output config, preferring mono, falling back to stereo
fn output_config(device: &cpal::Device) -> Result<StreamConfig> {
    let rate = SampleRate(PLAYBACK_SAMPLE_RATE);
    let pick = |channels: u16| {
        device.supported_output_configs().ok().and_then(|mut configs| {
            configs.find(|c| {
                c.channels() == channels && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
            })
        })
    };

    pick(1)
        .or_else(|| pick(2))
        .map(|c| c.with_sample_rate(rate).config())
        .ok_or_else(|| Error::Audio("no 24 kHz output config".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecodable_input_yields_no_samples() {
        // no valid MP3 frame sync anywhere in the data
        assert!(decode_mp3(&[]).unwrap().is_empty());
        assert!(decode_mp3(&[0x00; 64]).unwrap_or_default().is_empty());
    }

    #[test]
    fn cancelled_playback_returns_without_a_device() {
        // cancel set before the call: must return Ok without touching audio
        let cancel = AtomicBool::new(true);
        assert!(play_blocking(vec![0.0; 2_400], &cancel).is_ok());
    }
}
