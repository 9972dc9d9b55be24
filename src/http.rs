//! HTTP module.
//!
//! Request and response types plus the handler and middleware traits the
//! static file server plugs into.

pub use static_cache_http::*;
