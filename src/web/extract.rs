//! Visible-text extraction from HTML
//!
//! Reduces a fetched page to the text a reader would see: script and
//! style content is dropped, and only text sitting inside block-level
//! containers (`div`, `span`, `p`) is kept.

use scraper::Html;

/// Container tags whose text is considered page content
const CONTENT_TAGS: &[&str] = &["div", "span", "p"];

/// Tags whose entire subtree is discarded
const DISCARD_TAGS: &[&str] = &["script", "style"];

/// Extract the visible text of an HTML document
#[must_use]
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut in_content = false;
        let mut discarded = false;
        for ancestor in node.ancestors() {
            if let Some(element) = ancestor.value().as_element() {
                let name = element.name();
                if DISCARD_TAGS.contains(&name) {
                    discarded = true;
                    break;
                }
                if CONTENT_TAGS.contains(&name) {
                    in_content = true;
                }
            }
        }

        if in_content && !discarded {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_block_level_text() {
        let html = "<html><body><div>first</div><p>second</p><span>third</span></body></html>";
        assert_eq!(visible_text(html), "first second third");
    }

    #[test]
    fn drops_script_and_style() {
        let html = "<html><body>\
                    <p>kept</p>\
                    <script>var dropped = 1;</script>\
                    <style>.dropped { color: red }</style>\
                    </body></html>";
        assert_eq!(visible_text(html), "kept");
    }

    #[test]
    fn drops_script_nested_in_content() {
        let html = "<div>before<script>alert('x')</script>after</div>";
        assert_eq!(visible_text(html), "before after");
    }

    #[test]
    fn ignores_text_outside_content_tags() {
        let html = "<html><body><h1>heading</h1><p>body text</p></body></html>";
        assert_eq!(visible_text(html), "body text");
    }

    #[test]
    fn nested_markup_inside_paragraph_is_kept() {
        let html = "<p>plain <b>bold</b> tail</p>";
        assert_eq!(visible_text(html), "plain bold tail");
    }

    #[test]
    fn empty_document_yields_empty_text() {
        assert_eq!(visible_text(""), "");
    }
}
