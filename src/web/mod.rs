//! Web lookup support
//!
//! URLs in a model reply are fetched, reduced to their visible text, and
//! sent back to the model for summarization.

mod extract;
mod fetch;

pub use extract::visible_text;
pub use fetch::PageFetcher;

/// Bare summarization prompt for fetched page text (bypasses the turn
/// template)
#[must_use]
pub fn summarize_prompt(page_text: &str) -> String {
    format!("SUMMARIZE: {page_text}")
}
