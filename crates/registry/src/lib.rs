//! Technical Store Registry library.
//!
//! Master-data management for the Technical Store System: storage
//! locations with generated hierarchical codes, item groups and units of
//! measure. The crate is storage agnostic; it talks to a backing record
//! store through the traits in [`db`] and ships an in-memory implementation.
//!
//! # Location pipeline
//!
//! On insert, the hierarchy validator runs first, then the code builder
//! assigns the immutable code, then the display name is derived. System
//! statistics are updated once the record is stored. On later saves only the
//! display name is regenerated.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use error::{ErrorKind, RegistryError, ValidationError};
