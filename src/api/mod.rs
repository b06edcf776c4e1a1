//! HTTP layer: route handlers, the index endpoint and router setup

/// Extractors rejecting with the API error body
pub mod extract;

/// Route handlers grouped by resource
pub mod handlers;

/// API documentation and index endpoint
pub mod index;

/// Router initialization and middleware
pub mod init;

pub use init::initialize_router;
