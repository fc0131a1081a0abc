//! Utterance end-point detection
//!
//! Energy-based segmentation: an utterance is complete once enough
//! speech has been heard and sustained silence follows. The caller owns
//! the sample buffer; the detector only tracks timing.

/// RMS energy above which a chunk counts as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech before an utterance can complete (0.3 s at 16 kHz)
const MIN_SPEECH_SAMPLES: usize = 4_800;

/// Trailing silence that ends an utterance (0.75 s at 16 kHz)
const TRAILING_SILENCE_SAMPLES: usize = 12_000;

/// Tracks speech/silence timing across capture chunks
#[derive(Debug, Default)]
pub struct UtteranceDetector {
    speech_samples: usize,
    trailing_silence: usize,
}

impl UtteranceDetector {
    /// Create a detector in its initial state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one capture chunk; returns true once the utterance is complete
    pub fn feed(&mut self, samples: &[f32]) -> bool {
        if rms(samples) > ENERGY_THRESHOLD {
            self.speech_samples += samples.len();
            self.trailing_silence = 0;
        } else if self.speech_samples > 0 {
            self.trailing_silence += samples.len();
        }

        let complete = self.speech_samples >= MIN_SPEECH_SAMPLES
            && self.trailing_silence >= TRAILING_SILENCE_SAMPLES;
        if complete {
            tracing::debug!(
                speech = self.speech_samples,
                silence = self.trailing_silence,
                "utterance complete"
            );
        }
        complete
    }

    /// True once any speech has been heard
    #[must_use]
    pub const fn heard_speech(&self) -> bool {
        self.speech_samples > 0
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        self.speech_samples = 0;
        self.trailing_silence = 0;
    }
}

/// RMS energy of a sample chunk
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize) -> Vec<f32> {
        (0..len).map(|i| if i % 2 == 0 { 0.3 } else { -0.3 }).collect()
    }

    #[test]
    fn silence_alone_never_completes() {
        let mut detector = UtteranceDetector::new();
        for _ in 0..100 {
            assert!(!detector.feed(&vec![0.0; 1600]));
        }
        assert!(!detector.heard_speech());
    }

    #[test]
    fn speech_then_silence_completes() {
        let mut detector = UtteranceDetector::new();

        // half a second of speech
        assert!(!detector.feed(&tone(8_000)));
        assert!(detector.heard_speech());

        // not yet: silence too short
        assert!(!detector.feed(&vec![0.0; 4_000]));

        // sustained silence ends the utterance
        assert!(detector.feed(&vec![0.0; 8_000]));
    }

    #[test]
    fn short_blip_does_not_complete() {
        let mut detector = UtteranceDetector::new();
        detector.feed(&tone(1_000));
        assert!(!detector.feed(&vec![0.0; 20_000]));
    }

    #[test]
    fn speech_resumes_reset_the_silence_run() {
        let mut detector = UtteranceDetector::new();
        detector.feed(&tone(8_000));
        detector.feed(&vec![0.0; 8_000]);
        detector.feed(&tone(1_600));
        assert!(!detector.feed(&vec![0.0; 4_000]));
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut detector = UtteranceDetector::new();
        detector.feed(&tone(8_000));
        detector.reset();
        assert!(!detector.heard_speech());
    }

    #[test]
    fn rms_of_silence_is_near_zero() {
        assert!(rms(&[0.0; 64]) < 0.001);
        assert!(rms(&[]) < 0.001);
        assert!(rms(&[0.5; 64]) > 0.4);
    }
}
