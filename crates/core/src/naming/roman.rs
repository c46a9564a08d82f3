//! Roman numeral codec.

/// Largest value representable in standard subtractive notation.
pub const MAX_ROMAN: u32 = 3999;

const NUMERALS: [(u32, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Errors that can occur when encoding or decoding Roman numerals.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RomanError {
    /// The input string is empty.
    #[error("roman numeral cannot be empty")]
    Empty,
    /// The input contains a character that is not a Roman symbol.
    #[error("invalid roman numeral symbol '{0}'")]
    InvalidSymbol(char),
    /// The symbols do not add up to a positive value.
    #[error("malformed roman numeral '{0}'")]
    Malformed(String),
    /// The value cannot be written in standard notation.
    #[error("{0} is outside the roman numeral range 1..=3999")]
    OutOfRange(u32),
}

/// Encode a positive integer in standard subtractive notation.
///
/// ```
/// use tech_store_core::to_roman;
///
/// assert_eq!(to_roman(14).unwrap(), "XIV");
/// assert_eq!(to_roman(1994).unwrap(), "MCMXCIV");
/// assert!(to_roman(0).is_err());
/// ```
///
/// # Errors
///
/// Returns [`RomanError::OutOfRange`] for 0 and values above [`MAX_ROMAN`].
pub fn to_roman(n: u32) -> Result<String, RomanError> {
    if n == 0 || n > MAX_ROMAN {
        return Err(RomanError::OutOfRange(n));
    }

    let mut remaining = n;
    let mut roman = String::new();
    for (value, symbol) in NUMERALS {
        while remaining >= value {
            roman.push_str(symbol);
            remaining -= value;
        }
    }
    Ok(roman)
}

/// Decode a Roman numeral, ignoring case and surrounding whitespace.
///
/// Scans right to left, subtracting a symbol whose value is below the
/// largest value seen so far and adding it otherwise.
///
/// # Errors
///
/// Returns an error if the input is empty, contains a non-Roman character,
/// or does not evaluate to a positive number.
pub fn from_roman(s: &str) -> Result<u32, RomanError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(RomanError::Empty);
    }

    let mut total: i64 = 0;
    let mut max_seen: u32 = 0;
    for c in trimmed.chars().rev() {
        let value = symbol_value(c).ok_or(RomanError::InvalidSymbol(c))?;
        if value < max_seen {
            total -= i64::from(value);
        } else {
            total += i64::from(value);
            max_seen = value;
        }
    }

    match u32::try_from(total) {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(RomanError::Malformed(trimmed.to_owned())),
    }
}

const fn symbol_value(c: char) -> Option<u32> {
    match c.to_ascii_uppercase() {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}
