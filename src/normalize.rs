//! Validation and canonicalization of user-supplied profile identifiers.

use once_cell::sync::Lazy;
use regex::Regex;

/// Host prefix that marks an identifier as an already-formatted URL.
pub(crate) const HOST_PREFIX: &str = "https://www.tiktok.com/";

/// Prefix every canonical profile URL starts with.
pub(crate) const PROFILE_URL_PREFIX: &str = "https://www.tiktok.com/@";

// Anchored at the start only: a prefix match is enough to accept.
static IDENTIFIER_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"^https://www\.tiktok\.com/@[\w.\-]+").unwrap(),
        Regex::new(r"^@[\w.\-]+").unwrap(),
        Regex::new(r"^[\w.\-]+").unwrap(),
    ]
});

static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([\w.\-]+)").unwrap());

/// Checks whether an identifier looks like a profile URL, "@handle" or bare handle.
///
/// The last pattern accepts any input whose first character is a word
/// character, dot or hyphen, so this is a loose check: it rejects empty input
/// and input starting with whitespace or punctuation, little else.
pub(crate) fn validate(input: &str) -> bool {
    let valid = IDENTIFIER_PATTERNS.iter().any(|p| p.is_match(input));
    tracing::debug!("Identifier '{}' valid: {}", input, valid);
    valid
}

/// Turns an identifier into a full profile URL.
///
/// Input already on the TikTok host is returned unchanged; otherwise leading
/// "@" characters are dropped and the profile URL prefix is prepended.
pub(crate) fn format(input: &str) -> String {
    if input.starts_with(HOST_PREFIX) {
        return input.to_string();
    }
    format!("{}{}", PROFILE_URL_PREFIX, input.trim_start_matches('@'))
}

/// Extracts the handle following the first "@" in a profile URL.
pub(crate) fn username_from_url(url: &str) -> Option<String> {
    USERNAME_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
