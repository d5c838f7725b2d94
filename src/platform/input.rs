//! Keyboard input normalization

/// Map a key name (as reported by `KeyboardEvent.key`) to the letter it strikes.
///
/// Only single ASCII letters qualify; named keys such as `Shift` or `Enter`
/// return `None`.
pub fn normalize_key(key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase()),
        _ => None,
    }
}
