//! Message board service
//!
//! REST endpoints over a document store plus a client for the About page.

pub mod about;
pub mod api;
pub mod client;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod store;
