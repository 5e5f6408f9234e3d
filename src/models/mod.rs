//! Domain models shared by the store, the proxy and the management API

pub mod connection;
pub mod user;

pub use connection::*;
pub use user::*;
