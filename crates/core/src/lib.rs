//! Technical Store Core - Shared types and naming algorithms.
//!
//! This crate provides the building blocks used across the Technical Store
//! System components:
//! - `registry` - Master-data registry (locations, item groups, units of measure)
//! - `cli` - Command-line tools for seeding and managing master data
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no logging. Everything here is a deterministic function of its
//! inputs, which keeps the location naming rules independently testable.
//!
//! # Modules
//!
//! - [`types`] - Location types, naming patterns and type-safe string keys
//! - [`naming`] - Roman numeral codec, sequence allocator and segment formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod naming;
pub mod types;

pub use naming::{
    CODE_SEPARATOR, DISPLAY_SEPARATOR, MAX_ROMAN, RomanError, SequenceError, SequenceValue,
    clean_segment, compose_code, format_segment, from_roman, increment_letters, join_display,
    next_value, to_roman,
};
pub use types::*;
