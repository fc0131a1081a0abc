//! Response interpretation
//!
//! Splits a free-text model reply into actionable parts: URLs to fetch
//! and summarize, at most one fenced command block, and the prose that
//! remains once fences are stripped. Extraction is heuristic regular
//! expression matching, not a grammar.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("fence regex"));

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("url regex"));

/// First-line tags recognized as language labels and stripped from
/// extracted blocks. `code` is the label the prompt template itself
/// instructs the model to use for generated code.
pub const LANGUAGE_TAGS: &[&str] = &[
    "python", "sh", "bash", "cmd", "cpp", "c++", "ruby", "javascript", "java", "go", "rust",
    "code",
];

/// Why no command could be extracted from a reply
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FenceError {
    /// No triple-backtick fence in the reply
    #[error("response contains no fenced block")]
    Missing,

    /// More than one fence; the reply is not in the expected format
    #[error("response contains more than one fenced block")]
    Ambiguous,

    /// A single fence was found but held nothing past its language tag
    #[error("fenced block contains no command")]
    Empty,
}

/// Everything actionable in one model reply
#[derive(Debug)]
pub struct Interpretation {
    /// Distinct URLs, in order of first appearance
    pub urls: Vec<String>,
    /// The single extracted command block, language tag stripped
    pub command: Result<String, FenceError>,
    /// The reply with all fenced blocks removed
    pub prose: String,
}

/// Interpret a raw model reply
#[must_use]
pub fn interpret(response: &str) -> Interpretation {
    Interpretation {
        urls: extract_urls(response),
        command: extract_command(response),
        prose: strip_fences(response),
    }
}

/// Extract distinct URLs in order of first appearance
///
/// Trailing closing punctuation is trimmed so URLs embedded in prose
/// ("see https://example.com.") resolve.
#[must_use]
pub fn extract_urls(response: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in URL.find_iter(response) {
        let url = m.as_str().trim_end_matches([')', ']', '.', ',', ';', ':', '"', '\'']);
        if !seen.iter().any(|u| u == url) {
            seen.push(url.to_string());
        }
    }
    seen
}

/// Extract the command from a reply holding exactly one fenced block
///
/// # Errors
///
/// Returns [`FenceError::Missing`] when no fence is present,
/// [`FenceError::Ambiguous`] when more than one is, and
/// [`FenceError::Empty`] when the single block holds nothing to run.
pub fn extract_command(response: &str) -> Result<String, FenceError> {
    let mut blocks = FENCE.captures_iter(response);

    let first = blocks.next().ok_or(FenceError::Missing)?;
    if blocks.next().is_some() {
        return Err(FenceError::Ambiguous);
    }

    let body = first[1].trim();
    let command = strip_language_tag(body);
    if command.is_empty() {
        return Err(FenceError::Empty);
    }
    Ok(command)
}

/// Remove a recognized language tag from the block's first line
///
/// Unrecognized first lines are kept: the whole block is the command.
fn strip_language_tag(block: &str) -> String {
    let mut lines = block.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };

    if LANGUAGE_TAGS.contains(&first.trim().to_lowercase().as_str()) {
        lines.collect::<Vec<_>>().join("\n").trim().to_string()
    } else {
        block.to_string()
    }
}

/// Remove every fenced block, leaving the prose to display and speak
#[must_use]
pub fn strip_fences(response: &str) -> String {
    FENCE.replace_all(response, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_with_tag_strips_tag() {
        let response = "See ```bash\nls -la\n```";
        assert_eq!(extract_command(response).unwrap(), "ls -la");
    }

    #[test]
    fn unknown_first_line_is_kept() {
        let response = "```\necho hi\nuname -a\n```";
        assert_eq!(extract_command(response).unwrap(), "echo hi\nuname -a");
    }

    #[test]
    fn no_fence_is_missing() {
        assert_eq!(extract_command("plain prose"), Err(FenceError::Missing));
        assert_eq!(extract_command(""), Err(FenceError::Missing));
    }

    #[test]
    fn two_fences_are_ambiguous() {
        let response = "```bash\nls\n``` and ```bash\npwd\n```";
        assert_eq!(extract_command(response), Err(FenceError::Ambiguous));
    }

    #[test]
    fn tag_only_block_is_empty() {
        assert_eq!(extract_command("```bash\n```"), Err(FenceError::Empty));
    }

    #[test]
    fn case_insensitive_tags() {
        let response = "```Python\nprint('hi')\n```";
        assert_eq!(extract_command(response).unwrap(), "print('hi')");
    }

    #[test]
    fn urls_are_distinct_and_ordered() {
        let response = "compare https://a.example/x and https://b.example, \
                        then https://a.example/x again";
        assert_eq!(
            extract_urls(response),
            vec!["https://a.example/x", "https://b.example"]
        );
    }

    #[test]
    fn url_trailing_punctuation_is_trimmed() {
        assert_eq!(
            extract_urls("(see https://example.com/page)."),
            vec!["https://example.com/page"]
        );
    }

    #[test]
    fn no_urls_is_empty() {
        assert!(extract_urls("nothing to fetch here").is_empty());
    }

    #[test]
    fn strip_fences_leaves_prose() {
        let response = "Run this:\n```bash\nls\n```\nthen report back.";
        assert_eq!(strip_fences(response), "Run this:\n\nthen report back.");
    }

    #[test]
    fn interpret_collects_all_parts() {
        let response = "Fetch https://example.com then run ```bash\nuptime\n```";
        let parts = interpret(response);
        assert_eq!(parts.urls, vec!["https://example.com"]);
        assert_eq!(parts.command.as_deref(), Ok("uptime"));
        assert!(!parts.prose.contains("```"));
    }
}
