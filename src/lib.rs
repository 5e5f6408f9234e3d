//! IPTV relay library
//!
//! Maps public Xtream-style credentials onto real upstream IPTV servers and
//! relays `player_api.php` and `xmltv.php` traffic between clients and those
//! servers. A small session-authenticated management API maintains the
//! connection records.

pub mod assets;
pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod proxy;
pub mod repositories;
pub mod services;
pub mod utils;
pub mod web;
