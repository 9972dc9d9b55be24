//! Error types for static-cache

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or serving static files
#[derive(Debug, Error)]
pub enum StaticCacheError {
	/// Filesystem operation failed on a path the engine decided to serve
	#[error("IO error on {}: {source}", path.display())]
	Io {
		/// Path that was being accessed
		path: PathBuf,
		/// Underlying error
		#[source]
		source: io::Error,
	},

	/// Recursive directory walk failed during preload
	#[error("Directory walk failed: {0}")]
	Walk(#[from] walkdir::Error),

	/// Settings could not be parsed
	#[error("Invalid configuration: {0}")]
	Config(#[from] serde_json::Error),

	/// Gzip encoding failed
	#[error("Compression failed: {0}")]
	Compression(String),

	/// A blocking task was cancelled or panicked
	#[error("Blocking task failed: {0}")]
	Join(#[from] tokio::task::JoinError),
}

impl StaticCacheError {
	/// Builds a [`StaticCacheError::Io`] for `path`
	pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
		Self::Io {
			path: path.as_ref().to_path_buf(),
			source,
		}
	}
}

impl From<StaticCacheError> for static_cache_http::Error {
	fn from(error: StaticCacheError) -> Self {
		match error {
			StaticCacheError::Io { source, .. } => static_cache_http::Error::Io(source),
			other => static_cache_http::Error::internal(other),
		}
	}
}

/// Result type for static-cache operations
pub type Result<T> = std::result::Result<T, StaticCacheError>;
