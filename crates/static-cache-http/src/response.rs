//! Outgoing response and body representation

use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt};
use hyper::StatusCode;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::pin::Pin;

/// Boxed error carried by streamed bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for streaming body
pub type StreamBody = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// Response body
#[derive(Default)]
pub enum Body {
	/// No body (HEAD responses, 304)
	#[default]
	Empty,
	/// Fully buffered body
	Full(Bytes),
	/// Body produced incrementally
	Stream(StreamBody),
}

impl Body {
	/// Wraps a stream as a body
	pub fn from_stream<S>(stream: S) -> Self
	where
		S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
	{
		Self::Stream(Box::pin(stream))
	}

	/// Returns `true` for [`Body::Empty`] and zero-length buffers.
	///
	/// Streams are never considered empty without being read.
	pub fn is_empty(&self) -> bool {
		match self {
			Body::Empty => true,
			Body::Full(bytes) => bytes.is_empty(),
			Body::Stream(_) => false,
		}
	}

	/// Returns `true` if the body is streamed
	pub fn is_stream(&self) -> bool {
		matches!(self, Body::Stream(_))
	}

	/// Collects the whole body into memory
	///
	/// # Errors
	///
	/// Returns the first error yielded by a streamed body.
	pub async fn collect(self) -> crate::Result<Bytes> {
		match self {
			Body::Empty => Ok(Bytes::new()),
			Body::Full(bytes) => Ok(bytes),
			Body::Stream(stream) => {
				let buf = stream
					.try_fold(BytesMut::new(), |mut acc, chunk| async move {
						acc.extend_from_slice(&chunk);
						Ok(acc)
					})
					.await
					.map_err(|e| crate::Error::Body(e.to_string()))?;
				Ok(buf.freeze())
			}
		}
	}
}

impl fmt::Debug for Body {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Body::Empty => f.write_str("Body::Empty"),
			Body::Full(bytes) => f.debug_tuple("Body::Full").field(&bytes.len()).finish(),
			Body::Stream(_) => f.write_str("Body::Stream(..)"),
		}
	}
}

impl From<Bytes> for Body {
	fn from(bytes: Bytes) -> Self {
		Body::Full(bytes)
	}
}

impl From<Vec<u8>> for Body {
	fn from(bytes: Vec<u8>) -> Self {
		Body::Full(Bytes::from(bytes))
	}
}

impl From<&'static str> for Body {
	fn from(s: &'static str) -> Self {
		Body::Full(Bytes::from_static(s.as_bytes()))
	}
}

impl From<String> for Body {
	fn from(s: String) -> Self {
		Body::Full(Bytes::from(s))
	}
}

/// HTTP Response
#[derive(Debug)]
pub struct Response {
	/// Status code
	pub status: StatusCode,
	/// Response headers
	pub headers: HeaderMap,
	/// Response body
	pub body: Body,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use static_cache_http::{Response, StatusCode};
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Body::Empty,
		}
	}

	/// Create a Response with HTTP 200 OK status
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// Create a Response with HTTP 304 Not Modified status
	pub fn not_modified() -> Self {
		Self::new(StatusCode::NOT_MODIFIED)
	}

	/// Create a Response with HTTP 404 Not Found status
	///
	/// # Examples
	///
	/// ```
	/// use static_cache_http::{Response, StatusCode};
	///
	/// let response = Response::not_found();
	/// assert_eq!(response.status, StatusCode::NOT_FOUND);
	/// ```
	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	/// Set the response body
	pub fn with_body(mut self, body: impl Into<Body>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response
	///
	/// Invalid header names or values are silently skipped.
	///
	/// # Examples
	///
	/// ```
	/// use static_cache_http::Response;
	///
	/// let response = Response::ok().with_header("X-Custom-Header", "custom-value");
	/// assert_eq!(response.header("x-custom-header"), Some("custom-value"));
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		self.set_header(name, value);
		self
	}

	/// Sets a header in place. Invalid names or values are skipped.
	pub fn set_header(&mut self, name: &str, value: &str) {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
	}

	/// Returns a header value as a string, if present and valid
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}
}
