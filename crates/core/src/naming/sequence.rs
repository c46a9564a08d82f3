//! Sequence allocator for location segments.
//!
//! Given the cleaned values already used under a parent scope, computes the
//! next unused value in the ordering of a naming pattern. Allocation is a
//! pure function: no counters are kept between calls.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::roman::{from_roman, to_roman};
use crate::types::NamingPattern;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit-run pattern is valid"));

/// A freshly allocated sequence value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SequenceValue {
    /// Value of a numeric pattern.
    Number(u32),
    /// Value of an alphabetic or Roman numeral pattern.
    Text(String),
}

impl fmt::Display for SequenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Errors that can occur while allocating the next value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// The next value cannot be represented in the pattern.
    #[error("{pattern} sequence exhausted after {last}")]
    Overflow {
        /// Pattern being allocated.
        pattern: NamingPattern,
        /// Largest value already in use.
        last: String,
    },
}

/// Compute the next value after every entry of `existing` under `pattern`.
///
/// `existing` holds pre-cleaned values (prefix and separators removed).
/// Entries that do not belong to the pattern are ignored.
///
/// ```
/// use tech_store_core::{NamingPattern, SequenceValue, next_value};
///
/// let next = next_value(&["1", "2"], NamingPattern::Numeric).unwrap();
/// assert_eq!(next, SequenceValue::Number(3));
///
/// let next = next_value(&["A", "B"], NamingPattern::Alphabetic).unwrap();
/// assert_eq!(next.to_string(), "C");
///
/// let next = next_value(&["I", "II", "III"], NamingPattern::RomanNumerals).unwrap();
/// assert_eq!(next.to_string(), "IV");
/// ```
///
/// # Errors
///
/// Returns [`SequenceError::Overflow`] when the successor of the largest
/// value is not representable (numeric overflow or Roman values past 3999).
pub fn next_value<S: AsRef<str>>(
    existing: &[S],
    pattern: NamingPattern,
) -> Result<SequenceValue, SequenceError> {
    match pattern {
        NamingPattern::Numeric => next_numeric(existing),
        NamingPattern::Alphabetic => Ok(next_alphabetic(existing)),
        NamingPattern::RomanNumerals => next_roman(existing),
    }
}

fn next_numeric<S: AsRef<str>>(existing: &[S]) -> Result<SequenceValue, SequenceError> {
    let max = existing
        .iter()
        .filter_map(|value| DIGIT_RUN.find(value.as_ref()))
        .filter_map(|run| run.as_str().parse::<u32>().ok())
        .max();

    match max {
        None => Ok(SequenceValue::Number(1)),
        Some(last) => last
            .checked_add(1)
            .map(SequenceValue::Number)
            .ok_or_else(|| SequenceError::Overflow {
                pattern: NamingPattern::Numeric,
                last: last.to_string(),
            }),
    }
}

fn next_alphabetic<S: AsRef<str>>(existing: &[S]) -> SequenceValue {
    let max = existing
        .iter()
        .map(AsRef::as_ref)
        .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_ascii_uppercase)
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    SequenceValue::Text(max.map_or_else(|| "A".to_owned(), |last| increment_letters(&last)))
}

fn next_roman<S: AsRef<str>>(existing: &[S]) -> Result<SequenceValue, SequenceError> {
    // Entries that fail to parse are skipped rather than aborting allocation.
    let max = existing
        .iter()
        .filter_map(|value| from_roman(value.as_ref()).ok())
        .max();

    let next = max.map_or(1, |last| last.saturating_add(1));
    to_roman(next)
        .map(SequenceValue::Text)
        .map_err(|_| SequenceError::Overflow {
            pattern: NamingPattern::RomanNumerals,
            last: max.unwrap_or_default().to_string(),
        })
}

/// Successor of an upper-case letter sequence in spreadsheet-column order.
///
/// `A → B`, `Z → AA`, `AZ → BA`, `ZZ → AAA`. An empty input yields `A`.
///
/// The legacy location tooling only stepped single letters and stopped at
/// `Z → AA`; it had no successor for a multi-letter value. The carry across
/// several letters extends that rule, and agrees with it up to `AA`.
#[must_use]
pub fn increment_letters(letters: &str) -> String {
    let mut bytes: Vec<u8> = letters.bytes().map(|b| b.to_ascii_uppercase()).collect();

    for byte in bytes.iter_mut().rev() {
        if *byte == b'Z' {
            *byte = b'A';
        } else {
            *byte += 1;
            return String::from_utf8_lossy(&bytes).into_owned();
        }
    }

    // Every position wrapped (or the input was empty): grow by one letter.
    bytes.insert(0, b'A');
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EMPTY: [&str; 0] = [];

    #[test]
    fn test_first_values() {
        assert_eq!(
            next_value(&EMPTY, NamingPattern::Numeric).unwrap(),
            SequenceValue::Number(1)
        );
        assert_eq!(
            next_value(&EMPTY, NamingPattern::Alphabetic).unwrap(),
            SequenceValue::Text("A".to_owned())
        );
        assert_eq!(
            next_value(&EMPTY, NamingPattern::RomanNumerals).unwrap(),
            SequenceValue::Text("I".to_owned())
        );
    }

    #[test]
    fn test_numeric_uses_first_digit_run() {
        let next = next_value(&["01", "2b7", "x10"], NamingPattern::Numeric).unwrap();
        assert_eq!(next, SequenceValue::Number(11));
    }

    #[test]
    fn test_numeric_ignores_values_without_digits() {
        let next = next_value(&["A", "B", "3"], NamingPattern::Numeric).unwrap();
        assert_eq!(next, SequenceValue::Number(4));
    }

    #[test]
    fn test_numeric_overflow() {
        let max = u32::MAX.to_string();
        let err = next_value(&[max.as_str()], NamingPattern::Numeric).unwrap_err();
        assert!(matches!(err, SequenceError::Overflow { .. }));
    }

    #[test]
    fn test_alphabetic_is_case_insensitive() {
        let next = next_value(&["a", "C", "b"], NamingPattern::Alphabetic).unwrap();
        assert_eq!(next.to_string(), "D");
    }

    #[test]
    fn test_alphabetic_wraps_after_z() {
        let next = next_value(&["Y", "Z"], NamingPattern::Alphabetic).unwrap();
        assert_eq!(next.to_string(), "AA");
    }

    #[test]
    fn test_alphabetic_longer_sequences_rank_higher() {
        let next = next_value(&["Z", "AA"], NamingPattern::Alphabetic).unwrap();
        assert_eq!(next.to_string(), "AB");
    }

    #[test]
    fn test_alphabetic_skips_non_letters() {
        let next = next_value(&["A", "1", "B2"], NamingPattern::Alphabetic).unwrap();
        assert_eq!(next.to_string(), "B");
    }

    #[test]
    fn test_roman_skips_malformed_entries() {
        let next = next_value(&["I", "II", "oops", "III"], NamingPattern::RomanNumerals).unwrap();
        assert_eq!(next.to_string(), "IV");
    }

    #[test]
    fn test_roman_overflow() {
        let err = next_value(&["MMMCMXCIX"], NamingPattern::RomanNumerals).unwrap_err();
        assert!(matches!(err, SequenceError::Overflow { .. }));
    }

    #[test]
    fn test_increment_letters() {
        assert_eq!(increment_letters(""), "A");
        assert_eq!(increment_letters("A"), "B");
        assert_eq!(increment_letters("Z"), "AA");
        assert_eq!(increment_letters("AZ"), "BA");
        assert_eq!(increment_letters("ZZ"), "AAA");
    }

    #[test]
    fn test_next_value_is_strictly_greater() {
        for n in 1..=200_u32 {
            let existing: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
            let next = next_value(&existing, NamingPattern::Numeric).unwrap();
            assert_eq!(next, SequenceValue::Number(n + 1));

            let romans: Vec<String> = (1..=n).map(|i| to_roman(i).unwrap()).collect();
            let next = next_value(&romans, NamingPattern::RomanNumerals).unwrap();
            assert_eq!(from_roman(&next.to_string()).unwrap(), n + 1);
        }

        let mut letters = vec!["A".to_owned()];
        for _ in 0..100 {
            let next = next_value(&letters, NamingPattern::Alphabetic).unwrap().to_string();
            assert!(!letters.contains(&next), "{next} was already allocated");
            letters.push(next);
        }
        assert_eq!(letters.last().map(String::as_str), Some("CW"));
    }
}
