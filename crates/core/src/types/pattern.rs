//! Naming patterns for allocated location segments.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Ordering scheme used to allocate the next segment value at a level.
///
/// ## Examples
///
/// ```
/// use tech_store_core::NamingPattern;
///
/// assert_eq!("Roman Numerals".parse(), Ok(NamingPattern::RomanNumerals));
/// assert_eq!("alphabetic".parse(), Ok(NamingPattern::Alphabetic));
/// assert!("Hex".parse::<NamingPattern>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NamingPattern {
    /// 1, 2, 3, ...
    #[default]
    Numeric,
    /// A, B, ..., Z, AA, AB, ...
    Alphabetic,
    /// I, II, III, IV, ...
    #[serde(rename = "Roman Numerals", alias = "RomanNumerals")]
    RomanNumerals,
}

impl NamingPattern {
    /// Display label of the pattern.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "Numeric",
            Self::Alphabetic => "Alphabetic",
            Self::RomanNumerals => "Roman Numerals",
        }
    }
}

impl fmt::Display for NamingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NamingPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "numeric" => Ok(Self::Numeric),
            "alphabetic" => Ok(Self::Alphabetic),
            "roman" | "romannumerals" => Ok(Self::RomanNumerals),
            _ => Err(format!("invalid naming pattern: {s}")),
        }
    }
}
