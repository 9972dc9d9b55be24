//! # static-cache
//!
//! Cached static-asset serving for async request pipelines.
//!
//! A [`StaticCache`] sits in a [`MiddlewareChain`] in front of the rest of an
//! application. It answers GET and HEAD requests for files under its root
//! directory from an in-process cache and passes every other request on.
//!
//! ## Features
//!
//! - **Preloading**: every file under the root is cached at startup
//! - **Dynamic loading**: files added later are loaded on first request
//! - **Conditional requests**: `ETag`, `Content-MD5` and `Last-Modified`
//!   validators with 304 responses
//! - **Gzip**: negotiated via `Accept-Encoding`, buffered or streamed,
//!   optionally from precompiled `.gz` files
//! - **Pluggable stores**: a plain map by default, or a bounded
//!   [`LruFileStore`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use static_cache::http::{Handler, MiddlewareChain, Request, Response, Result};
//! use static_cache::{StaticCache, StaticCacheConfig};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct App;
//!
//! #[async_trait]
//! impl Handler for App {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Ok(Response::ok().with_body("Hello from the app"))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = StaticCacheConfig::new("public")
//!     .with_prefix("/static")
//!     .with_gzip(true)
//!     .with_max_age(86400);
//!
//! let app = MiddlewareChain::new(Arc::new(App))
//!     .with_middleware(Arc::new(StaticCache::new(config).await?));
//!
//! let response = app.handle(Request::get("/static/app.js")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - [`http`] - Request/response model and the `Handler` / `Middleware` traits
//! - [`core`] - The caching engine

pub mod core;
pub mod http;

pub use static_cache_core::{
	FileEntry, FileFilter, FileManager, FileMap, FileStore, LruFileStore, Served, SharedEntry,
	StaticCache, StaticCacheConfig, StaticCacheError,
};
pub use static_cache_http::{Handler, Middleware, MiddlewareChain, Request, Response};
