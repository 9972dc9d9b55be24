//! # static-cache-core
//!
//! Caching static file server for the static-cache request pipeline.
//!
//! Files under a root directory are described by in-memory cache entries
//! holding their MIME type, modification time, size, MD5 and (optionally)
//! their contents. Requests are answered from those entries with:
//! - `ETag` / `Content-MD5` / `Last-Modified` validators and 304 responses
//! - gzip negotiation, either buffered and cached or streamed on the fly
//! - precompiled `.gz` siblings
//! - lazy detection of files changed on disk
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use static_cache_core::{StaticCache, StaticCacheConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> static_cache_core::Result<()> {
//! let config = StaticCacheConfig::new("public")
//!     .with_prefix("/static")
//!     .with_buffer(true)
//!     .with_gzip(true)
//!     .with_dynamic(true);
//! let static_files = StaticCache::new(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - [`config`] - Configuration
//! - [`store`] - Cache backends
//! - [`entry`] - Cache entries and the entry loader
//! - [`path`] - Request path resolution
//! - [`conditional`] - Freshness of conditional requests
//! - [`negotiation`] - Accept-Encoding negotiation
//! - [`compression`] - Gzip encoding
//! - [`stream`] - File body streams
//! - [`preload`] - Startup preloading
//! - [`middleware`] - The serving middleware
//! - [`error`] - Error types

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod compression;
pub mod conditional;
pub mod config;
pub mod entry;
pub mod error;
pub mod middleware;
pub mod negotiation;
pub mod path;
pub mod preload;
pub mod store;
pub mod stream;

pub use config::{FileFilter, StaticCacheConfig};
pub use entry::{FileEntry, SharedEntry, load_file};
pub use error::{Result, StaticCacheError};
pub use middleware::{Served, StaticCache};
pub use path::{PathResolver, Resolution};
pub use preload::preload;
pub use store::{FileManager, FileMap, FileStore, LruFileStore};
