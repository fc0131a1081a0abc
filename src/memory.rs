//! Memory catalog
//!
//! A free-text file summarizing past successful interactions, fed back
//! into every prompt. Refinement asks the model to merge the conversation
//! transcript into the current catalog and appends the result — the
//! catalog grows monotonically; nothing is ever replaced.

use std::io::Write;
use std::path::PathBuf;

use crate::Result;

/// Persisted free-text memory catalog
pub struct MemoryCatalog {
    path: PathBuf,
}

impl MemoryCatalog {
    /// Open a catalog at `path`; the file need not exist yet
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Full catalog contents; empty string if the file does not exist
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read
    pub fn load(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }

    /// Append a refined memory text to the catalog
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written
    pub fn append(&self, refined: &str) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{refined}")?;
        tracing::info!(chars = refined.len(), path = %self.path.display(), "memory appended");
        Ok(())
    }

    /// Build the refinement instruction sent to the model
    #[must_use]
    pub fn refine_prompt(transcript: &str, current_memory: &str) -> String {
        format!(
            "Analyze the conversation history and extract the details that \
             contributed to successful outcomes. Keep all previously stored \
             memory intact, integrate the newly found information, and \
             structure the result so a language model can recall it \
             efficiently on later runs.\n\n\
             Conversation History:\n{transcript}\n\n\
             Current Memory:\n{current_memory}\n"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let catalog = MemoryCatalog::new(std::env::temp_dir().join("sotto-no-such-memory.txt"));
        assert_eq!(catalog.load().unwrap(), "");
    }

    #[test]
    fn refine_prompt_embeds_both_inputs() {
        let prompt = MemoryCatalog::refine_prompt("user: fixed the printer", "knows LAN layout");
        assert!(prompt.contains("user: fixed the printer"));
        assert!(prompt.contains("knows LAN layout"));
        assert!(prompt.contains("Current Memory:"));
    }
}
