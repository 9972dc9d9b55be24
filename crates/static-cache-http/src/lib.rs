//! # static-cache-http
//!
//! Request/response model and pipeline traits shared by the static-cache crates.
//!
//! The types here are intentionally small: a [`Request`] carries the method,
//! URI, version and headers of an incoming request, and a [`Response`] carries
//! a status, headers and a [`Body`] that is either empty, a fully buffered
//! byte string or a byte stream.
//!
//! Request processing is composed from [`Handler`]s and [`Middleware`]s. A
//! middleware either answers a request itself or passes it on to the next
//! handler in the chain.
//!
//! ## Example
//!
//! ```rust
//! use static_cache_http::{Handler, Request, Response, Result};
//! use async_trait::async_trait;
//!
//! struct NotFound;
//!
//! #[async_trait]
//! impl Handler for NotFound {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Ok(Response::not_found())
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod middleware;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::Request;
pub use response::{Body, BoxError, Response, StreamBody};

// Re-export the HTTP primitives so downstream crates share one version.
pub use hyper::header;
pub use hyper::{HeaderMap, Method, StatusCode, Uri, Version};
