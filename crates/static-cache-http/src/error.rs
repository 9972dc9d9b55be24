//! Pipeline error type

use std::error::Error as StdError;

/// Errors surfaced by handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// I/O failure while producing a response
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// Failure inside a handler or middleware, carrying its source
	#[error("Internal error: {0}")]
	Internal(#[source] Box<dyn StdError + Send + Sync>),

	/// Failure while reading a streamed body
	#[error("Body error: {0}")]
	Body(String),
}

impl Error {
	/// Wraps an arbitrary error as [`Error::Internal`]
	pub fn internal<E>(error: E) -> Self
	where
		E: StdError + Send + Sync + 'static,
	{
		Self::Internal(Box::new(error))
	}
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
