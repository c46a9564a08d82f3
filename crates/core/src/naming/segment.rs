//! Segment cleaning, formatting and code composition.

use super::sequence::SequenceValue;
use crate::types::NamingLevel;

/// Separator between a parent code and a child segment (`WH-1-Z-A`).
pub const CODE_SEPARATOR: char = '-';

/// Separator between hierarchy parts of a display name (`WH-1 - Z-A`).
pub const DISPLAY_SEPARATOR: &str = " - ";

/// Reduce a stored segment name to the bare sequence value.
///
/// Strips the configured prefix from the start of the segment, then removes
/// every separator and surrounding whitespace: `Z-A` → `A`, `R01` → `01`.
///
/// ```
/// use tech_store_core::clean_segment;
///
/// assert_eq!(clean_segment("WH-12", "WH"), "12");
/// assert_eq!(clean_segment("Z-IV", "Z"), "IV");
/// assert_eq!(clean_segment("C", "Z"), "C");
/// ```
#[must_use]
pub fn clean_segment(segment: &str, prefix: &str) -> String {
    let trimmed = segment.trim();
    let without_prefix = if prefix.is_empty() {
        trimmed
    } else {
        trimmed.strip_prefix(prefix).unwrap_or(trimmed)
    };

    without_prefix
        .chars()
        .filter(|c| *c != CODE_SEPARATOR)
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Render an allocated value as a segment name for `level`.
///
/// Numeric racks and shelves are zero-padded to two digits with no separator
/// (`R01`); every other combination joins prefix and value with a dash
/// (`WH-1`, `Z-A`, `Z-I`). An empty prefix yields the bare value.
#[must_use]
pub fn format_segment(level: NamingLevel, prefix: &str, value: &SequenceValue) -> String {
    match value {
        SequenceValue::Number(n) if level.pads_numbers() => format!("{prefix}{n:02}"),
        _ if prefix.is_empty() => value.to_string(),
        _ => format!("{prefix}{CODE_SEPARATOR}{value}"),
    }
}

/// Compose a location code from its parent's code and its own segment.
///
/// Top-level locations (no parent) use the segment as their code.
#[must_use]
pub fn compose_code(parent_code: Option<&str>, segment: &str) -> String {
    match parent_code {
        Some(parent) => format!("{parent}{CODE_SEPARATOR}{segment}"),
        None => segment.to_owned(),
    }
}

/// Join hierarchy parts into a display name (`WH-1 - Z-A - R01`).
#[must_use]
pub fn join_display<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(DISPLAY_SEPARATOR)
}
