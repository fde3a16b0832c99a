//! Path canonicalization.
//!
//! # Responsibilities
//! - Percent-decode path strings
//! - Collapse repeated separators and strip trailing ones
//! - Apply Unicode NFC so equivalent spellings compare equal
//! - Decide whether an incoming path must be redirected to its canonical form
//!
//! # Design Decisions
//! - Decoding runs to a fixed point, which keeps `normalize` idempotent
//! - Invalid UTF-8 produced by decoding is replaced lossily rather than rejected
//! - The canonical form always starts with `/` and never ends with one (except root)

use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

/// Canonicalize a path.
///
/// `"/hello%20world///"` becomes `"/hello world"`, `""` becomes `"/"`.
pub fn normalize(path: &str) -> String {
    let decoded = decode_fully(path);
    let trimmed = decoded.trim_end_matches('/');

    let mut collapsed = String::with_capacity(trimmed.len() + 1);
    collapsed.push('/');
    let mut previous_was_separator = true;
    for ch in trimmed.chars() {
        if ch == '/' {
            if previous_was_separator {
                continue;
            }
            previous_was_separator = true;
        } else {
            previous_was_separator = false;
        }
        collapsed.push(ch);
    }

    collapsed.nfc().collect()
}

/// Returns the location an incoming path should be redirected to, if any.
///
/// A single trailing separator and one level of percent-encoding are
/// tolerated because route matching already treats those spellings as equal.
/// Anything else that `normalize` would rewrite (repeated separators, encoded
/// separators, double encoding) yields the re-encoded canonical path.
pub fn canonical_redirect(raw_path: &str) -> Option<String> {
    // `%2F` changes the segment structure, so it is never a mere spelling.
    if has_encoded_separator(raw_path) {
        return Some(encode_path(&normalize(raw_path)));
    }

    let decoded = decode_once(raw_path);
    let tolerated = match decoded.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => &*decoded,
    };

    let canonical = normalize(raw_path);
    if tolerated == canonical {
        None
    } else {
        Some(encode_path(&canonical))
    }
}

/// Percent-encode every segment of a path, leaving the separators intact.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn decode_once(path: &str) -> Cow<'_, str> {
    if !has_escape(path) {
        return Cow::Borrowed(path);
    }
    let bytes = urlencoding::decode_binary(path.as_bytes());
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

// Every pass either shortens the string or removes a '%', so this terminates.
fn decode_fully(path: &str) -> Cow<'_, str> {
    let mut current = Cow::Borrowed(path);
    while has_escape(&current) {
        let next = decode_once(&current).into_owned();
        if next == current {
            break;
        }
        current = Cow::Owned(next);
    }
    current
}

fn has_encoded_separator(path: &str) -> bool {
    path.as_bytes()
        .windows(3)
        .any(|w| w[0] == b'%' && w[1] == b'2' && (w[2] == b'F' || w[2] == b'f'))
}

fn has_escape(path: &str) -> bool {
    path.as_bytes()
        .windows(3)
        .any(|w| w[0] == b'%' && w[1].is_ascii_hexdigit() && w[2].is_ascii_hexdigit())
}
