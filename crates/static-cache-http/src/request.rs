//! Incoming request

use hyper::header::{AsHeaderName, HeaderMap};
use hyper::{Method, Uri, Version};

/// An incoming HTTP request as seen by the pipeline.
///
/// Only the request line and headers are modelled; static asset serving
/// never consumes a request body.
#[derive(Debug, Clone)]
pub struct Request {
	/// Request method
	pub method: Method,
	/// Request target
	pub uri: Uri,
	/// Protocol version
	pub version: Version,
	/// Request headers
	pub headers: HeaderMap,
}

impl Request {
	/// Creates a request from its parts
	///
	/// # Examples
	///
	/// ```
	/// use static_cache_http::{HeaderMap, Method, Request, Uri, Version};
	///
	/// let request = Request::new(
	///     Method::GET,
	///     Uri::from_static("/index.js?v=1"),
	///     Version::HTTP_11,
	///     HeaderMap::new(),
	/// );
	/// assert_eq!(request.path(), "/index.js");
	/// ```
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
		}
	}

	/// Creates a GET request for `uri` with no headers
	///
	/// # Panics
	///
	/// Panics if `uri` is not a valid request target.
	pub fn get(uri: &str) -> Self {
		Self::with_method(Method::GET, uri)
	}

	/// Creates a HEAD request for `uri` with no headers
	///
	/// # Panics
	///
	/// Panics if `uri` is not a valid request target.
	pub fn head(uri: &str) -> Self {
		Self::with_method(Method::HEAD, uri)
	}

	/// Creates a request with the given method for `uri` with no headers
	///
	/// # Panics
	///
	/// Panics if `uri` is not a valid request target.
	pub fn with_method(method: Method, uri: &str) -> Self {
		let uri = uri.parse::<Uri>().expect("invalid request uri");
		Self::new(method, uri, Version::HTTP_11, HeaderMap::new())
	}

	/// Adds a header, builder style. Invalid names or values are ignored.
	///
	/// # Examples
	///
	/// ```
	/// use static_cache_http::Request;
	///
	/// let request = Request::get("/app.css").with_header("accept-encoding", "gzip");
	/// assert_eq!(request.header("accept-encoding"), Some("gzip"));
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = hyper::header::HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = hyper::header::HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Returns the path component of the URI, without the query string
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Returns a header value as a string, if present and valid
	pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}
}
