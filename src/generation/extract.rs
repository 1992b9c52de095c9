//! Heuristics for pulling an image reference out of free-form model output.
//!
//! The chat-completions protocol has no structured image field, so precedence
//! matters: markdown image link, then any embedded URL, then a leading bare token.

use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[.*?\]\((.*?)\)").expect("valid markdown image pattern"));

static HTTP_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://[^\s)]+)").expect("valid url pattern"));

/// First absolute HTTP(S) URL embedded in `text`.
pub fn find_url(text: &str) -> Option<&str> {
    HTTP_URL
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

fn markdown_image(text: &str) -> Option<&str> {
    MARKDOWN_IMAGE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|url| !url.is_empty())
}

fn leading_token(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.starts_with("http") {
        trimmed.split_whitespace().next()
    } else {
        None
    }
}

pub fn image_reference(content: &str) -> Option<String> {
    markdown_image(content)
        .or_else(|| find_url(content))
        .or_else(|| leading_token(content))
        .map(str::to_string)
}
