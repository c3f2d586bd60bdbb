// Room listings API - server core
//
// HTTP surface over the `discovery` library: configuration, JWT-derived
// requester context, per-IP rate limiting and the listing endpoints.

pub mod config;
pub mod domains;
pub mod server;

pub use config::*;
