//! HTTP handlers organized by domain

pub mod auth;
pub mod connections;
pub mod health;
pub mod xtream;
