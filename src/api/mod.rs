//! HTTP API for the admin panel and public site.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
