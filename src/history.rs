//! Conversation history
//!
//! An ordered, append-only sequence of turns and events. Persistence
//! appends rendered lines to a UTF-8 text file; prior content is never
//! rewritten or validated on read. The in-memory window embedded into
//! prompts is capped; the file itself only grows.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::Result;

/// Who (or what) produced a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Transcribed or typed user input
    User,
    /// Model reply, fences stripped
    Assistant,
    /// Pipeline event: exec status, parse failure, fetched summary
    Event,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// One turn or event
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Local>,
}

impl HistoryEntry {
    fn render(&self) -> String {
        format!("[{}] {}: {}", self.at.format("%Y-%m-%d %I:%M %p"), self.role, self.text)
    }
}

/// Append-only conversation log with file persistence
pub struct ConversationLog {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
    flushed: usize,
    window: usize,
    header: Option<String>,
    header_written: bool,
}

impl ConversationLog {
    /// Create a log persisting to `path`, embedding at most `window`
    /// entries into prompts
    #[must_use]
    pub fn new(path: PathBuf, window: usize) -> Self {
        Self {
            path,
            entries: Vec::new(),
            flushed: 0,
            window,
            header: None,
            header_written: false,
        }
    }

    /// Set a header line written once, ahead of this run's first entries
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Record an entry
    pub fn record(&mut self, role: Role, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(%role, chars = text.len(), "history entry");
        self.entries.push(HistoryEntry {
            role,
            text,
            at: Local::now(),
        });
    }

    /// The capped recent window used for prompt assembly
    #[must_use]
    pub fn window(&self) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(self.window);
        &self.entries[start..]
    }

    /// Render the recent window as prompt text
    #[must_use]
    pub fn render_window(&self) -> String {
        self.window()
            .iter()
            .map(HistoryEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Append unflushed entries to the history file
    ///
    /// Saves are strictly additive: two consecutive saves never truncate
    /// or overwrite prior content.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written
    pub fn save(&mut self) -> Result<()> {
        if self.flushed == self.entries.len() {
            return Ok(());
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if !self.header_written {
            if let Some(header) = &self.header {
                writeln!(file, "{header}")?;
            }
            self.header_written = true;
        }

        for entry in &self.entries[self.flushed..] {
            writeln!(file, "{}", entry.render())?;
        }

        let written = self.entries.len() - self.flushed;
        self.flushed = self.entries.len();
        tracing::debug!(written, path = %self.path.display(), "history saved");
        Ok(())
    }

    /// Full on-disk transcript, as-is (used by memory refinement)
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read
    pub fn transcript(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }

    /// Number of in-memory entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been recorded this session
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_caps_prompt_entries() {
        let mut log = ConversationLog::new(std::env::temp_dir().join("unused.txt"), 3);
        for i in 0..10 {
            log.record(Role::User, format!("turn {i}"));
        }
        let window = log.window();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].text, "turn 7");
        assert_eq!(window[2].text, "turn 9");
    }

    #[test]
    fn window_smaller_than_cap_is_whole_log() {
        let mut log = ConversationLog::new(std::env::temp_dir().join("unused.txt"), 40);
        log.record(Role::User, "hello");
        assert_eq!(log.window().len(), 1);
    }

    #[test]
    fn rendered_entries_carry_role_labels() {
        let mut log = ConversationLog::new(std::env::temp_dir().join("unused.txt"), 40);
        log.record(Role::User, "hello");
        log.record(Role::Assistant, "hi");
        log.record(Role::Event, "executed command: ls");

        let rendered = log.render_window();
        assert!(rendered.contains("user: hello"));
        assert!(rendered.contains("assistant: hi"));
        assert!(rendered.contains("event: executed command: ls"));
    }
}
