//! Repository pattern implementation for data access
//!
//! Components depend on the [`ConnectionStore`] and [`UserStore`] traits and
//! receive a concrete implementation at construction time, which keeps the
//! proxy core independent of SQLite and lets tests swap the backing store.

pub mod connection;
pub mod traits;
pub mod user;

pub use connection::ConnectionRepository;
pub use traits::*;
pub use user::UserRepository;
