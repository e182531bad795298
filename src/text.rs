//! Charset resolution for names stored in fixed-size replay fields.
//!
//! Player and map names were written by clients running in different
//! locales. A field is decoded by trying, in order, UTF-8, the legacy
//! Korean multi-byte encoding (EUC-KR / CP949), and finally the longest
//! plain-ASCII prefix. The first decoding that passes the caller's
//! predicate wins.

use encoding_rs::EUC_KR;
use serde::Serialize;

/// The text encoding a name was resolved with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    /// Unicode variable-width (UTF-8).
    Utf8,
    /// Legacy regional multi-byte encoding (EUC-KR / CP949).
    EucKr,
    /// Bytewise ASCII prefix.
    Ascii,
}

/// Punctuation allowed in player names besides letters and digits.
const NAME_PUNCTUATION: &str = "[]()_-.`~!@#$%^&*+=|{}:;'<>,? ";

/// Maximum visible characters in a player name.
pub const MAX_NAME_CHARS: usize = 24;

/// Decodes `bytes` with each supported charset in order and returns the
/// first result accepted by `accept`.
pub fn decode_with<F>(bytes: &[u8], accept: F) -> Option<(String, Charset)>
where
    F: Fn(&str) -> bool,
{
    if bytes.is_empty() {
        return None;
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        if accept(s) {
            return Some((s.to_string(), Charset::Utf8));
        }
    }

    if let Some(s) = EUC_KR.decode_without_bom_handling_and_without_replacement(bytes) {
        if accept(&s) {
            return Some((s.into_owned(), Charset::EucKr));
        }
    }

    let ascii_len = bytes.iter().position(|b| !b.is_ascii()).unwrap_or(bytes.len());
    if ascii_len > 0 {
        // Only reached with an all-ASCII prefix, so this cannot fail.
        let prefix = String::from_utf8_lossy(&bytes[..ascii_len]);
        if accept(&prefix) {
            return Some((prefix.into_owned(), Charset::Ascii));
        }
    }

    None
}

/// Decodes a player name field.
#[must_use]
pub fn decode_name(bytes: &[u8]) -> Option<(String, Charset)> {
    decode_with(bytes, is_valid_name)
}

/// Returns whether `name` looks like a real player name.
///
/// A valid name has 1 to 24 visible characters, contains at least one
/// letter or digit, and otherwise only uses a small punctuation set.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let trimmed = name.trim();
    let count = trimmed.chars().count();
    if count == 0 || count > MAX_NAME_CHARS {
        return false;
    }
    trimmed.chars().any(char::is_alphanumeric)
        && trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || NAME_PUNCTUATION.contains(c))
}

/// Strings that show up near the map name field but never are a map name.
const MAP_NAME_DENYLIST: &[&str] = &[
    "starcraft",
    "brood war",
    "blizzard",
    "blizzard entertainment",
    "replay",
    "untitled",
    "unnamed",
    "rers",
    "sers",
    "cmds",
];

/// Returns whether `name` is an acceptable map name candidate.
///
/// Accepts 3 to 32 characters with a printable ratio above 0.9 that are
/// not on the boilerplate denylist.
#[must_use]
pub fn is_plausible_map_name(name: &str) -> bool {
    let trimmed = name.trim();
    let count = trimmed.chars().count();
    if !(3..=32).contains(&count) || printable_ratio(trimmed) <= 0.9 {
        return false;
    }
    if !trimmed.chars().any(char::is_alphanumeric) {
        return false;
    }
    let lower = trimmed.to_lowercase();
    !MAP_NAME_DENYLIST.contains(&lower.as_str())
}

/// Returns the share of characters in `s` that are printable.
///
/// Returns `0.0` for an empty string.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn printable_ratio(s: &str) -> f64 {
    let total = s.chars().count();
    if total == 0 {
        return 0.0;
    }
    let printable = s
        .chars()
        .filter(|c| !c.is_control() && *c != char::REPLACEMENT_CHARACTER)
        .count();
    printable as f64 / total as f64
}
