//! Core module.
//!
//! The caching engine: configuration, cache stores, entries, path
//! resolution, negotiation and the serving middleware.
//!
//! # Examples
//!
//! ```rust
//! use static_cache::core::negotiation::accepts_gzip;
//!
//! assert!(accepts_gzip(Some("gzip, br")));
//! ```

pub use static_cache_core::*;
