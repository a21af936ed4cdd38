//! Page title and technology fingerprints from raw HTTP responses.

mod engine;
mod frameworks;

use once_cell::sync::Lazy;
use regex::Regex;

pub use engine::{FingerEngine, FingerRule};
pub use frameworks::{Framework, Frameworks, Source};

static TITLE_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok());

/// Text of the first `<title>` element with whitespace runs collapsed, or an
/// empty string.
pub fn match_title(body: &str) -> String {
    let Some(re) = TITLE_REGEX.as_ref() else { return String::new() };
    re.captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Splits a raw response into its header block and body. Text that does not
/// start with a status line is treated as body only.
pub fn split_raw(raw: &str) -> (&str, &str) {
    if !raw.starts_with("HTTP/") {
        return ("", raw);
    }
    for sep in ["\r\n\r\n", "\n\n"] {
        if let Some(i) = raw.find(sep) {
            return (&raw[..i], &raw[i + sep.len()..]);
        }
    }
    (raw, "")
}
