//! Derives the exact POST target for each protocol from the loosely specified
//! base URL a user typed into their settings.
//!
//! Both derivations are plain string manipulation. A malformed base URL yields a
//! malformed endpoint, which then surfaces as a transport or 404 failure.

use once_cell::sync::Lazy;
use regex::Regex;

/// Public endpoint of the native provider, used when no base URL is configured.
pub const NATIVE_DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com";

/// Public endpoint of the chat-completions provider, used when no base URL is configured.
pub const COMPAT_DEFAULT_BASE: &str = "https://api.openai.com/v1";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const VERSION_SEGMENT: &str = "/v1";
const EXTENDED_VERSION_SEGMENT: &str = "/v1beta";
const EXTENDED_VERSION_MARKER: &str = "v1beta";

static KEY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([?&]key=)[^&]*").expect("valid key pattern"));

fn base_or(raw: &str, default: &'static str) -> String {
    let trimmed = raw.trim();
    let base = if trimmed.is_empty() { default } else { trimmed };
    base.strip_suffix('/').unwrap_or(base).to_string()
}

/// Versioned native base, e.g. `https://host/v1beta`.
pub fn native_base(raw: &str) -> String {
    let mut base = base_or(raw, NATIVE_DEFAULT_BASE);

    if let Some(stripped) = base.strip_suffix(CHAT_COMPLETIONS_PATH) {
        base = stripped.to_string();
    }

    if let Some(unversioned) = base.strip_suffix(VERSION_SEGMENT) {
        format!("{}{}", unversioned, EXTENDED_VERSION_SEGMENT)
    } else if base.contains(EXTENDED_VERSION_MARKER) {
        base
    } else {
        format!("{}{}", base, EXTENDED_VERSION_SEGMENT)
    }
}

/// `{base}/models/{model}:generateContent?key={api_key}`
pub fn native_endpoint(raw: &str, model: &str, api_key: &str) -> String {
    format!(
        "{}/models/{}:generateContent?key={}",
        native_base(raw),
        model,
        api_key
    )
}

/// Full chat-completions URL, used verbatim as the POST target.
pub fn compat_endpoint(raw: &str) -> String {
    let base = base_or(raw, COMPAT_DEFAULT_BASE);

    if base.ends_with(CHAT_COMPLETIONS_PATH) {
        base
    } else if base.ends_with(VERSION_SEGMENT) {
        format!("{}{}", base, CHAT_COMPLETIONS_PATH)
    } else {
        format!("{}{}{}", base, VERSION_SEGMENT, CHAT_COMPLETIONS_PATH)
    }
}

/// Masks the `key=` query value so endpoints can be logged.
pub fn redact_key(endpoint: &str) -> String {
    KEY_PARAM.replace_all(endpoint, "${1}***").into_owned()
}
