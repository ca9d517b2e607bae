//! Request handler module
//!
//! Responsible for the middleware chain wrapped around every route.

pub mod body;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
