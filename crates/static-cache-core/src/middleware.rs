//! Static file serving middleware
//!
//! [`StaticCache`] answers GET and HEAD requests for files under its root
//! and hands every other request to the next handler.
//!
//! ## Example
//!
//! ```rust,no_run
//! use static_cache_core::{StaticCache, StaticCacheConfig};
//! use static_cache_http::{Handler, MiddlewareChain, Request, Response, Result};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct NotFound;
//!
//! #[async_trait]
//! impl Handler for NotFound {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Ok(Response::not_found())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = StaticCacheConfig::new("public")
//!     .with_prefix("/static")
//!     .with_gzip(true)
//!     .with_max_age(3600);
//! let static_files = StaticCache::new(config).await?;
//!
//! let chain = MiddlewareChain::new(Arc::new(NotFound))
//!     .with_middleware(Arc::new(static_files));
//! let response = chain.handle(Request::get("/static/app.js")).await?;
//! # Ok(())
//! # }
//! ```

use crate::compression::{MIN_COMPRESS_SIZE, gzip_blocking, gzip_stream};
use crate::conditional::{http_date, is_fresh};
use crate::config::StaticCacheConfig;
use crate::entry::{SharedEntry, load_file};
use crate::error::{Result, StaticCacheError};
use crate::negotiation::{accepts_gzip, is_compressible};
use crate::path::{PathResolver, Resolution, resolve_root};
use crate::preload::preload;
use crate::store::FileManager;
use crate::stream::{file_stream, hashing_stream};
use async_trait::async_trait;
use bytes::Bytes;
use static_cache_http::header::{
	ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, ETAG,
	HeaderName, HeaderValue, LAST_MODIFIED, VARY,
};
use static_cache_http::{Body, Handler, Method, Middleware, Request, Response, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// Outcome of [`StaticCache::serve`]
#[derive(Debug)]
pub enum Served {
	/// The request was answered from the cache
	Response(Response),
	/// The request is not for a cached or servable file
	Declined,
}

impl Served {
	/// Returns `true` if the request was declined
	pub fn is_declined(&self) -> bool {
		matches!(self, Served::Declined)
	}

	/// Returns the response, if one was produced
	pub fn into_response(self) -> Option<Response> {
		match self {
			Served::Response(response) => Some(response),
			Served::Declined => None,
		}
	}
}

/// Caching static file server
///
/// Construction resolves the root directory and, unless disabled, preloads
/// every file under it. Requests are then answered from the cache, loading
/// uncached files on demand in dynamic mode.
pub struct StaticCache {
	config: StaticCacheConfig,
	root: PathBuf,
	files: FileManager,
	resolver: PathResolver,
}

impl StaticCache {
	/// Creates a server backed by a plain in-memory map.
	///
	/// # Errors
	///
	/// Fails if preloading fails.
	pub async fn new(config: StaticCacheConfig) -> Result<Self> {
		Self::with_store(config, FileManager::default()).await
	}

	/// Creates a server backed by `files`.
	///
	/// Entries already present in `files` are kept; preloading completes them
	/// in place.
	///
	/// # Errors
	///
	/// Fails if the root cannot be resolved or preloading fails.
	pub async fn with_store(config: StaticCacheConfig, files: FileManager) -> Result<Self> {
		let root = resolve_root(&config.dir)?;
		if config.preload {
			preload(&root, &config, &files).await?;
		}
		let resolver = PathResolver::new(&config, root.clone());

		Ok(Self {
			config,
			root,
			files,
			resolver,
		})
	}

	/// The cache backing this server
	pub fn files(&self) -> &FileManager {
		&self.files
	}

	/// Absolute root directory
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Active configuration
	pub fn config(&self) -> &StaticCacheConfig {
		&self.config
	}

	/// Answers `request` from the cache, or declines it.
	///
	/// # Errors
	///
	/// Fails if a file chosen for serving cannot be stat'd, read or
	/// compressed. Requests this server does not handle are
	/// [`Served::Declined`], never errors.
	pub async fn serve(&self, request: &Request) -> Result<Served> {
		let resolution = self
			.resolver
			.resolve(&request.method, request.path(), &self.files)
			.await;

		let (key, entry) = match resolution {
			Resolution::Declined => return Ok(Served::Declined),
			Resolution::Cached { key, entry } => (key, entry),
			Resolution::Load { key, name } => {
				let entry = load_file(&name, &self.root, &self.config, &self.files).await?;
				(key, entry)
			}
		};

		self.respond(request, &key, &entry).await.map(Served::Response)
	}

	/// Re-stats a streamed entry, invalidating its hash if the file changed
	async fn refresh(&self, entry: &SharedEntry) -> Result<()> {
		let (path, cached) = {
			let file = entry.read();
			if file.is_buffered() {
				return Ok(());
			}
			(file.path.clone(), file.last_modified)
		};

		let metadata = tokio::fs::metadata(&path)
			.await
			.map_err(|e| StaticCacheError::io(&path, e))?;
		let modified = metadata
			.modified()
			.map_err(|e| StaticCacheError::io(&path, e))?;

		if modified != cached {
			let mut file = entry.write();
			file.last_modified = modified;
			file.length = metadata.len();
			file.content_hash = None;
			debug!(path = %path.display(), length = file.length, "static file changed on disk");
		}
		Ok(())
	}

	async fn respond(&self, request: &Request, key: &str, entry: &SharedEntry) -> Result<Response> {
		let mut response = Response::ok();
		if self.config.gzip {
			response
				.headers
				.insert(VARY, HeaderValue::from_static("Accept-Encoding"));
		}

		self.refresh(entry).await?;
		let file = entry.read().clone();

		response.set_header(LAST_MODIFIED.as_str(), &http_date(file.last_modified));
		let etag = file.etag();
		if let Some(etag) = &etag {
			response.set_header(ETAG.as_str(), etag);
		}

		if is_fresh(&request.headers, etag.as_deref(), file.last_modified) {
			trace!(key, "not modified");
			response.status = StatusCode::NOT_MODIFIED;
			return Ok(response);
		}

		let accept_gzip = accepts_gzip(request.header(ACCEPT_ENCODING));
		let cached_gzip = file.compressed.as_ref().filter(|_| accept_gzip);

		let length = cached_gzip.map_or(file.length, |compressed| compressed.len() as u64);
		response.set_header(CONTENT_TYPE.as_str(), &file.content_type);
		response.headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
		response.set_header(CACHE_CONTROL.as_str(), &file.cache_control_value());
		if let Some(hash) = &file.content_hash {
			response.set_header(CONTENT_MD5.as_str(), hash);
		}

		if request.method == Method::HEAD {
			if cached_gzip.is_some() {
				response
					.headers
					.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
			}
			return Ok(response);
		}

		if let Some(compressed) = &file.compressed {
			if accept_gzip {
				return Ok(full_body(response, compressed.clone(), true));
			}
			if let Some(buffer) = &file.buffer {
				return Ok(full_body(response, buffer.clone(), false));
			}
		}

		let should_gzip = self.config.gzip
			&& file.length > MIN_COMPRESS_SIZE
			&& accept_gzip
			&& is_compressible(&file.content_type);

		if let Some(buffer) = file.buffer {
			if !should_gzip {
				return Ok(full_body(response, buffer, false));
			}

			let compressed = match self.precompiled(key) {
				Some(precompiled) => precompiled,
				None => gzip_blocking(buffer).await?,
			};
			entry.write().compressed = Some(compressed.clone());
			trace!(key, length = compressed.len(), "cached gzip copy");
			return Ok(full_body(response, compressed, true));
		}

		let source = tokio::fs::File::open(&file.path)
			.await
			.map_err(|e| StaticCacheError::io(&file.path, e))?;
		let mut body = file_stream(source);
		if file.content_hash.is_none() {
			body = hashing_stream(body, entry.clone(), file.last_modified);
		}
		if should_gzip {
			response.headers.remove(CONTENT_LENGTH);
			response
				.headers
				.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
			body = gzip_stream(body);
		} else {
			response
				.headers
				.insert(CONTENT_LENGTH, HeaderValue::from(file.length));
		}
		response.body = Body::Stream(body);
		Ok(response)
	}

	/// Buffered contents of the `.gz` sibling of `key`, when enabled
	fn precompiled(&self, key: &str) -> Option<Bytes> {
		if !self.config.use_precompiled_gzip {
			return None;
		}
		let sibling = self.files.get(&format!("{}.gz", key))?;
		let buffer = sibling.read().buffer.clone();
		buffer
	}
}

/// Finishes a response with an in-memory body of the given encoding
fn full_body(mut response: Response, body: Bytes, gzip: bool) -> Response {
	if gzip {
		response
			.headers
			.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
	}
	response
		.headers
		.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
	response.with_body(body)
}

#[async_trait]
impl Middleware for StaticCache {
	async fn process(
		&self,
		request: Request,
		next: Arc<dyn Handler>,
	) -> static_cache_http::Result<Response> {
		match self.serve(&request).await? {
			Served::Response(response) => Ok(response),
			Served::Declined => next.handle(request).await,
		}
	}

	fn should_continue(&self, request: &Request) -> bool {
		request.method == Method::GET || request.method == Method::HEAD
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::entry::FileEntry;
	use crate::store::FileMap;
	use rstest::rstest;
	use tempfile::TempDir;

	async fn serve(cache: &StaticCache, request: Request) -> Response {
		cache
			.serve(&request)
			.await
			.unwrap()
			.into_response()
			.expect("request was declined")
	}

	#[rstest]
	#[tokio::test]
	async fn test_serves_preloaded_file() {
		let temp_dir = TempDir::new().unwrap();
		std::fs::write(temp_dir.path().join("index.js"), "a").unwrap();
		let cache = StaticCache::new(StaticCacheConfig::new(temp_dir.path()))
			.await
			.unwrap();

		let response = serve(&cache, Request::get("/index.js")).await;
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.header("content-length"), Some("1"));
		assert_eq!(response.header("cache-control"), Some("public, max-age=0"));
		assert_eq!(response.header("etag"), Some("\"DMF1ucDxtqgxw5niaXcmYQ==\""));
		assert_eq!(response.header("content-md5"), Some("DMF1ucDxtqgxw5niaXcmYQ=="));
		assert!(response.header("last-modified").is_some());
		assert!(response.header("vary").is_none());
		assert!(response.body.is_stream());
		assert_eq!(response.body.collect().await.unwrap(), Bytes::from("a"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_head_has_headers_without_body() {
		let temp_dir = TempDir::new().unwrap();
		std::fs::write(temp_dir.path().join("index.js"), "abc").unwrap();
		let cache = StaticCache::new(StaticCacheConfig::new(temp_dir.path()))
			.await
			.unwrap();

		let response = serve(&cache, Request::head("/index.js")).await;
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.header("content-length"), Some("3"));
		assert!(matches!(response.body, Body::Empty));
	}

	#[rstest]
	#[tokio::test]
	async fn test_declines_unknown_file() {
		let temp_dir = TempDir::new().unwrap();
		let cache = StaticCache::new(StaticCacheConfig::new(temp_dir.path()))
			.await
			.unwrap();

		let served = cache.serve(&Request::get("/missing.js")).await.unwrap();
		assert!(served.is_declined());
	}

	#[rstest]
	#[tokio::test]
	async fn test_precompiled_sibling_used() {
		let temp_dir = TempDir::new().unwrap();
		let content = "console.log('precompiled');\n".repeat(100);
		std::fs::write(temp_dir.path().join("app.js"), &content).unwrap();
		std::fs::write(temp_dir.path().join("app.js.gz"), b"pretend-gzip").unwrap();

		let config = StaticCacheConfig::new(temp_dir.path())
			.with_buffer(true)
			.with_gzip(true)
			.with_precompiled_gzip(true);
		let cache = StaticCache::new(config).await.unwrap();

		let request = Request::get("/app.js").with_header("accept-encoding", "gzip");
		let response = serve(&cache, request).await;
		assert_eq!(response.header("content-encoding"), Some("gzip"));
		assert_eq!(response.header("content-length"), Some("12"));
		assert_eq!(
			response.body.collect().await.unwrap(),
			Bytes::from_static(b"pretend-gzip")
		);

		let entry = cache.files().get("/app.js").unwrap();
		assert_eq!(entry.read().compressed.as_deref(), Some(&b"pretend-gzip"[..]));
	}

	#[rstest]
	#[tokio::test]
	async fn test_cached_compressed_copy_falls_back_to_stream() {
		let temp_dir = TempDir::new().unwrap();
		let content = "p { margin: 0; }\n".repeat(100);
		std::fs::write(temp_dir.path().join("app.css"), &content).unwrap();

		let map = FileMap::new();
		let cache = StaticCache::with_store(
			StaticCacheConfig::new(temp_dir.path()).with_gzip(true),
			FileManager::from(map.clone()),
		)
		.await
		.unwrap();
		map.get("/app.css").unwrap().write().compressed = Some(Bytes::from_static(b"zz"));

		let response = serve(&cache, Request::get("/app.css")).await;
		assert!(response.header("content-encoding").is_none());
		let expected_length = content.len().to_string();
		assert_eq!(response.header("content-length"), Some(expected_length.as_str()));
		assert_eq!(response.body.collect().await.unwrap(), content.as_bytes());
	}

	#[rstest]
	#[case(Method::GET, true)]
	#[case(Method::HEAD, true)]
	#[case(Method::POST, false)]
	#[case(Method::PUT, false)]
	#[case(Method::DELETE, false)]
	#[tokio::test]
	async fn test_chain_skips_other_methods(#[case] method: Method, #[case] runs: bool) {
		let temp_dir = TempDir::new().unwrap();
		let cache = StaticCache::new(StaticCacheConfig::new(temp_dir.path()))
			.await
			.unwrap();

		let request = Request::with_method(method, "/index.js");
		assert_eq!(cache.should_continue(&request), runs);
	}

	#[rstest]
	#[tokio::test]
	async fn test_seeded_entry_without_file_errors() {
		let temp_dir = TempDir::new().unwrap();
		let map = FileMap::new();
		map.insert(
			"/ghost.js",
			FileEntry {
				path: temp_dir.path().join("ghost.js"),
				..FileEntry::default()
			},
		);
		let cache = StaticCache::with_store(
			StaticCacheConfig::new(temp_dir.path()),
			FileManager::from(map),
		)
		.await
		.unwrap();

		let err = cache.serve(&Request::get("/ghost.js")).await.unwrap_err();
		assert!(matches!(err, StaticCacheError::Io { .. }));
	}
}
