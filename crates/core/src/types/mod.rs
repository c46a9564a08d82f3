//! Core types for the Technical Store System.
//!
//! This module provides type-safe wrappers for the master-data domain.

pub mod key;
pub mod location_type;
pub mod pattern;

pub use key::*;
pub use location_type::{LocationType, NamingLevel};
pub use pattern::NamingPattern;
