//! Newtype string keys for type-safe record references.
//!
//! Master-data records are keyed by human-readable strings rather than
//! surrogate integers: a location by its hierarchical code, an item group
//! and a unit of measure by their names. Use the `define_key!` macro to
//! create wrappers that prevent accidentally mixing keys of different record
//! types.

/// Errors that can occur when parsing a record key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The input is empty or only whitespace.
    #[error("key cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("key must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Macro to define a type-safe string key wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()` trimming surrounding whitespace and rejecting empty or
///   oversized input
/// - `Display`, `FromStr`, `AsRef<str>` and `Borrow<str>` implementations
///
/// # Example
///
/// ```rust
/// # use tech_store_core::define_key;
/// define_key!(BarcodeKey);
/// define_key!(RfidKey);
///
/// let barcode = BarcodeKey::parse("  4006381333931 ").unwrap();
/// assert_eq!(barcode.as_str(), "4006381333931");
///
/// // These are different types, so this won't compile:
/// // let _: RfidKey = barcode;
/// ```
#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Maximum length of a key, matching the primary key width of the
            /// backing store.
            pub const MAX_LENGTH: usize = 140;

            /// Parse a key from a string, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns an error if the trimmed input is empty or longer than
            /// [`Self::MAX_LENGTH`] characters.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::key::KeyError> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err($crate::types::key::KeyError::Empty);
                }
                if trimmed.chars().count() > Self::MAX_LENGTH {
                    return Err($crate::types::key::KeyError::TooLong {
                        max: Self::MAX_LENGTH,
                    });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the key and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::key::KeyError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(key: $name) -> Self {
                key.0
            }
        }
    };
}

// Define standard record keys
define_key!(LocationCode);
define_key!(ItemGroupName);
define_key!(UomName);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let code = LocationCode::parse("  WH-1-Z-A ").unwrap();
        assert_eq!(code.as_str(), "WH-1-Z-A");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(LocationCode::parse(""), Err(KeyError::Empty));
        assert_eq!(LocationCode::parse("   "), Err(KeyError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "A".repeat(LocationCode::MAX_LENGTH + 1);
        assert!(matches!(
            ItemGroupName::parse(&long),
            Err(KeyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_serde_is_transparent() {
        let name = UomName::parse("Kilogram").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"Kilogram\"");

        let parsed: UomName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_borrow_allows_str_lookup() {
        let mut codes = std::collections::BTreeSet::new();
        codes.insert(LocationCode::parse("WH-1").unwrap());
        assert!(codes.contains("WH-1"));
    }
}
