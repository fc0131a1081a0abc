//! Microphone capture

use std::sync::mpsc::{Receiver, channel};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Capture sample rate (16 kHz mono, what speech recognizers expect)
pub const SAMPLE_RATE: u32 = 16_000;

/// Records from the default input device
///
/// The stream callback ships sample chunks over a channel; `drain`
/// collects whatever arrived since the last call.
pub struct Recorder {
    device: Device,
    config: StreamConfig,
    live: Option<(Stream, Receiver<Vec<f32>>)>,
}

impl Recorder {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns error if no input device exists or none supports 16 kHz
    /// mono capture
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let config = input_config(&device)?;
        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "recorder ready"
        );

        Ok(Self {
            device,
            config,
            live: None,
        })
    }

    /// Begin capturing; a no-op if already capturing
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built or started
    pub fn start(&mut self) -> Result<()> {
        if self.live.is_some() {
            return Ok(());
        }

        let (tx, rx) = channel();
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(data.to_vec());
                },
                |err| tracing::error!(error = %err, "capture stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.live = Some((stream, rx));
        tracing::debug!("capture started");
        Ok(())
    }

    /// Collect the samples that arrived since the last drain
    #[must_use]
    pub fn drain(&self) -> Vec<f32> {
        let Some((_, rx)) = &self.live else {
            return Vec::new();
        };

        let mut samples = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            samples.extend(chunk);
        }
        samples
    }

    /// Stop capturing; pending chunks are discarded with the channel
    pub fn stop(&mut self) {
        if self.live.take().is_some() {
            tracing::debug!("capture stopped");
        }
    }

    /// True while the input stream is live
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.live.is_some()
    }
}

/// Find a 16 kHz mono input config on the device
fn input_config(device: &Device) -> Result<StreamConfig> {
    let rate = SampleRate(SAMPLE_RATE);

    device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .filter(|c| c.channels() == 1)
        .find(|c| c.min_sample_rate() <= rate && c.max_sample_rate() >= rate)
        .map(|c| c.with_sample_rate(rate).config())
        .ok_or_else(|| Error::Audio("no 16 kHz mono input config".to_string()))
}

/// Encode f32 samples as 16-bit PCM WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let as_audio_err = |e: hound::Error| Error::Audio(e.to_string());

    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(as_audio_err)?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let pcm = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(pcm).map_err(as_audio_err)?;
    }
    writer.finalize().map_err(as_audio_err)?;

    Ok(cursor.into_inner())
}
