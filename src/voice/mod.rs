//! Voice processing module
//!
//! Microphone capture, utterance segmentation, transcription, synthesis,
//! and playback. At most one speech task is live at a time; `SpeechTask`
//! owns it (see `speech.rs`).

mod capture;
mod detector;
mod playback;
mod speech;
mod stt;
mod tts;

pub use capture::{Recorder, SAMPLE_RATE, encode_wav};
pub use detector::{UtteranceDetector, rms};
pub use playback::{decode_mp3, play_blocking};
pub use speech::SpeechTask;
pub use stt::{Transcriber, Transcript};
pub use tts::Synthesizer;
