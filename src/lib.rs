//! sotto - voice-driven assistant for locally hosted language models
//!
//! Records microphone audio, transcribes it, forwards the text to a
//! local generate endpoint, interprets the reply, and speaks the result
//! back. The interesting part is the reply interpretation: URLs are
//! fetched and summarized aloud, a single fenced block can (with
//! explicit opt-in) be executed through the OS shell, and the remaining
//! prose is displayed, spoken, and persisted.
//!
//! # Pipeline
//!
//! ```text
//! microphone ──► transcription ──► prompt assembly ──► /api/generate
//!     ▲              (HTTP)       (history + memory)       (HTTP)
//!     │                                                      │
//! speech output ◄── interpretation ◄────────────────────────┘
//!   (HTTP TTS)        │        │
//!                  web fetch   guarded shell exec
//!                + summarize   (opt-in, confirmed)
//! ```
//!
//! External collaborators — speech recognition, speech synthesis, and
//! inference — are consumed over HTTP and treated as opaque.

pub mod assistant;
pub mod config;
pub mod console;
pub mod error;
pub mod history;
pub mod inference;
pub mod interpret;
pub mod memory;
pub mod prompt;
pub mod session;
pub mod shell;
pub mod voice;
pub mod web;

pub use assistant::Assistant;
pub use config::Config;
pub use error::{Error, Result};
pub use session::Session;
