//! Utility functions for the IPTV relay
//!
//! - `utils::datetime` for flexible datetime parsing, storage and Xtream formatting
//! - `utils::url` for upstream base URL normalization and log-safe hosts

pub mod datetime;
pub mod url;
