//! Xtream proxy core
//!
//! Turns an inbound `player_api.php` / `xmltv.php` request, once its public
//! credentials have been resolved, into an upstream request and relays the
//! answer back to the client.
//!
//! - [`translator`] builds the outbound URL, header allow-list and timeout
//! - [`relay`] performs the upstream call and shapes the downstream response

pub mod relay;
pub mod translator;

pub use relay::{UpstreamClient, UpstreamStream};
pub use translator::{RequestTranslator, UpstreamRequest, XtreamEndpoint, XtreamQuery};
