//! Location naming: numeral codecs, sequence allocation and segment formatting.
//!
//! Everything in this module is a pure function of its inputs. Callers gather
//! the existing sibling segments from storage, clean them with
//! [`clean_segment`], ask [`next_value`] for the next value in the level's
//! pattern, and render it with [`format_segment`].

pub mod roman;
pub mod segment;
pub mod sequence;

pub use roman::{MAX_ROMAN, RomanError, from_roman, to_roman};
pub use segment::{
    CODE_SEPARATOR, DISPLAY_SEPARATOR, clean_segment, compose_code, format_segment, join_display,
};
pub use sequence::{SequenceError, SequenceValue, increment_letters, next_value};
