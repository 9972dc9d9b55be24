//! Request path resolution
//!
//! Maps a request path to a cache key and decides whether the request is ours
//! to answer. Every rejection is a [`Resolution::Declined`], never an error,
//! so the pipeline can hand the request to the next handler.

use crate::config::StaticCacheConfig;
use crate::entry::{SharedEntry, public_key};
use crate::error::{Result, StaticCacheError};
use crate::store::FileManager;
use percent_encoding::percent_decode_str;
use static_cache_http::Method;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::trace;

/// Lexically normalizes a `/`-separated URL path.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment and
/// never climbs above the root of an absolute path, and a trailing slash is
/// kept.
///
/// # Examples
///
/// ```rust
/// use static_cache_core::path::normalize_url_path;
///
/// assert_eq!(normalize_url_path("//index.js"), "/index.js");
/// assert_eq!(normalize_url_path("/a/./b/../c/"), "/a/c/");
/// assert_eq!(normalize_url_path("/../../etc/passwd"), "/etc/passwd");
/// ```
pub fn normalize_url_path(path: &str) -> String {
	if path.is_empty() {
		return ".".to_string();
	}

	let absolute = path.starts_with('/');
	let trailing = path.ends_with('/');
	let mut segments: Vec<&str> = Vec::new();

	for segment in path.split('/') {
		match segment {
			"" | "." => {}
			".." => {
				if segments.last().is_some_and(|s| *s != "..") {
					segments.pop();
				} else if !absolute {
					segments.push("..");
				}
			}
			other => segments.push(other),
		}
	}

	let mut normalized = segments.join("/");
	if absolute {
		normalized.insert(0, '/');
	}
	if normalized.is_empty() {
		normalized.push('.');
	}
	if trailing && !normalized.ends_with('/') {
		normalized.push('/');
	}
	normalized
}

/// Lexically normalizes a filesystem path without touching the disk
pub fn normalize_fs_path(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
					normalized.pop();
				} else if !normalized.has_root() {
					normalized.push("..");
				}
			}
			other => normalized.push(other.as_os_str()),
		}
	}
	normalized
}

/// Absolute, normalized form of the served root directory.
///
/// # Errors
///
/// Fails if the current directory is needed and cannot be determined.
pub fn resolve_root(dir: &Path) -> Result<PathBuf> {
	let absolute = std::path::absolute(dir).map_err(|e| StaticCacheError::io(dir, e))?;
	Ok(normalize_fs_path(&absolute))
}

/// Outcome of resolving a request path
pub enum Resolution {
	/// The key is cached
	Cached {
		/// Public cache key
		key: String,
		/// Cached entry
		entry: SharedEntry,
	},
	/// The key is not cached but names a regular file inside the root
	Load {
		/// Public cache key the loaded entry will be stored under
		key: String,
		/// Root-relative, `/`-separated file name
		name: String,
	},
	/// Not a request this layer answers
	Declined,
}

impl fmt::Debug for Resolution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Resolution::Cached { key, .. } => f.debug_struct("Cached").field("key", key).finish(),
			Resolution::Load { key, name } => f
				.debug_struct("Load")
				.field("key", key)
				.field("name", name)
				.finish(),
			Resolution::Declined => f.write_str("Declined"),
		}
	}
}

/// Resolves request paths against the cache and, in dynamic mode, the root
#[derive(Debug, Clone)]
pub struct PathResolver {
	url_prefix: String,
	file_prefix: String,
	alias: HashMap<String, String>,
	dynamic: bool,
	root: PathBuf,
}

impl PathResolver {
	/// Creates a resolver for `config`, serving files under `root`.
	///
	/// `root` should already be absolute and normalized (see [`resolve_root`]).
	pub fn new(config: &StaticCacheConfig, root: impl Into<PathBuf>) -> Self {
		Self {
			url_prefix: config.url_prefix(),
			file_prefix: config.file_prefix(),
			alias: config.alias.clone(),
			dynamic: config.dynamic,
			root: root.into(),
		}
	}

	/// Normalized URL prefix, always ending in `/`
	pub fn url_prefix(&self) -> &str {
		&self.url_prefix
	}

	/// Root directory files are loaded from
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Resolves a request to a cached entry, a loadable file, or a decline.
	///
	/// # Examples
	///
	/// ```rust
	/// use static_cache_core::{FileManager, PathResolver, Resolution, StaticCacheConfig};
	/// use static_cache_http::Method;
	///
	/// # tokio_test::block_on(async {
	/// let config = StaticCacheConfig::new("public").with_prefix("/static");
	/// let resolver = PathResolver::new(&config, "/srv/public");
	/// let files = FileManager::default();
	///
	/// let resolution = resolver.resolve(&Method::GET, "/other/a.js", &files).await;
	/// assert!(matches!(resolution, Resolution::Declined));
	/// # });
	/// ```
	pub async fn resolve(
		&self,
		method: &Method,
		request_path: &str,
		files: &FileManager,
	) -> Resolution {
		if *method != Method::GET && *method != Method::HEAD {
			trace!(%method, path = request_path, "declined: method");
			return Resolution::Declined;
		}
		if !request_path.starts_with(&self.url_prefix) {
			trace!(path = request_path, prefix = %self.url_prefix, "declined: outside prefix");
			return Resolution::Declined;
		}

		let decoded = match percent_decode_str(request_path).decode_utf8() {
			Ok(decoded) => decoded,
			Err(_) => {
				trace!(path = request_path, "declined: undecodable path");
				return Resolution::Declined;
			}
		};
		let mut key = normalize_url_path(&decoded);
		if let Some(target) = self.alias.get(&key) {
			key = target.clone();
		}

		if let Some(entry) = files.get(&key) {
			return Resolution::Cached { key, entry };
		}
		if !self.dynamic {
			trace!(key = %key, "declined: not cached");
			return Resolution::Declined;
		}

		match self.loadable_name(&key).await {
			Some(name) => {
				let key = public_key(&self.url_prefix, &name);
				Resolution::Load { key, name }
			}
			None => Resolution::Declined,
		}
	}

	/// Root-relative name for an uncached key, if it names a servable file
	async fn loadable_name(&self, key: &str) -> Option<String> {
		let basename = key.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
		if basename.starts_with('.') {
			trace!(key, "declined: hidden file");
			return None;
		}

		let mut name = key.strip_prefix('/').unwrap_or(key);
		if self.url_prefix != "/" {
			match name.strip_prefix(self.file_prefix.as_str()) {
				Some(stripped) => name = stripped,
				None => {
					trace!(key, "declined: outside file prefix");
					return None;
				}
			}
		}

		let full_path = normalize_fs_path(&self.root.join(name));
		if !full_path.starts_with(&self.root) {
			trace!(key, path = %full_path.display(), "declined: outside root");
			return None;
		}

		match tokio::fs::metadata(&full_path).await {
			Ok(metadata) if metadata.is_file() => Some(name.to_string()),
			Ok(_) => {
				trace!(key, "declined: not a regular file");
				None
			}
			Err(error) => {
				trace!(key, %error, "declined: stat failed");
				None
			}
		}
	}
}
