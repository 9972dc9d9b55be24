//! Cache entries and the entry loader

use crate::config::StaticCacheConfig;
use crate::error::{Result, StaticCacheError};
use crate::path::normalize_url_path;
use crate::store::FileManager;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use md5::{Digest, Md5};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// Entry shared between the store, in-flight requests and streaming hashers
pub type SharedEntry = Arc<RwLock<FileEntry>>;

/// Cached metadata (and optionally content) for one served file.
///
/// Legal field combinations:
/// - `content_hash` is only meaningful for the current `last_modified`;
///   whoever changes `last_modified` clears it.
/// - `buffer` is only populated in buffered mode. Entries without a buffer are
///   re-stat'd and streamed from `path` on every request.
/// - `compressed` holds a gzip copy of the content. Once set it is kept for
///   the lifetime of the entry.
#[derive(Debug, Clone)]
pub struct FileEntry {
	/// Absolute source path
	pub path: PathBuf,

	/// `Content-Type` value
	pub content_type: String,

	/// Modification time observed at the last stat
	pub last_modified: SystemTime,

	/// Uncompressed length in bytes
	pub length: u64,

	/// Base64 MD5 of the content, used as ETag and Content-MD5
	pub content_hash: Option<String>,

	/// Literal `Cache-Control` override
	pub cache_control: Option<String>,

	/// `max-age` in seconds when no override is set
	pub max_age: u64,

	/// File contents (buffered mode only)
	pub buffer: Option<Bytes>,

	/// Gzip-encoded copy of the contents
	pub compressed: Option<Bytes>,
}

impl Default for FileEntry {
	fn default() -> Self {
		Self {
			path: PathBuf::new(),
			content_type: mime_guess::mime::APPLICATION_OCTET_STREAM.to_string(),
			last_modified: SystemTime::UNIX_EPOCH,
			length: 0,
			content_hash: None,
			cache_control: None,
			max_age: 0,
			buffer: None,
			compressed: None,
		}
	}
}

impl FileEntry {
	/// Creates an empty entry carrying a per-file `max-age`.
	///
	/// Seeding a store with such an entry before preload lets a single file
	/// override the configured `max_age`.
	///
	/// # Examples
	///
	/// ```rust
	/// use static_cache_core::{FileEntry, FileMap};
	///
	/// let files = FileMap::new();
	/// files.insert("/package.json", FileEntry::with_max_age(1));
	/// assert_eq!(files.len(), 1);
	/// ```
	pub fn with_max_age(max_age: u64) -> Self {
		Self {
			max_age,
			..Self::default()
		}
	}

	/// Wraps the entry for sharing
	pub fn into_shared(self) -> SharedEntry {
		Arc::new(RwLock::new(self))
	}

	/// Returns `true` if contents are held in memory
	pub fn is_buffered(&self) -> bool {
		self.buffer.is_some()
	}

	/// `Cache-Control` value for this entry
	///
	/// # Examples
	///
	/// ```rust
	/// use static_cache_core::FileEntry;
	///
	/// assert_eq!(FileEntry::with_max_age(60).cache_control_value(), "public, max-age=60");
	/// ```
	pub fn cache_control_value(&self) -> String {
		match &self.cache_control {
			Some(value) => value.clone(),
			None => format!("public, max-age={}", self.max_age),
		}
	}

	/// Quoted ETag, if the content hash is known
	pub fn etag(&self) -> Option<String> {
		self.content_hash.as_deref().map(format_etag)
	}
}

/// Quotes a content hash for use as a strong ETag
pub fn format_etag(hash: &str) -> String {
	if hash.starts_with('"') || hash.starts_with("W/\"") {
		hash.to_string()
	} else {
		format!("\"{}\"", hash)
	}
}

/// Base64-encoded MD5 digest of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
	STANDARD.encode(Md5::digest(bytes))
}

/// Resolves the `Content-Type` for a path.
///
/// Text-like types get a UTF-8 charset; unknown extensions fall back to
/// `application/octet-stream`.
///
/// # Examples
///
/// ```rust
/// use static_cache_core::entry::content_type_for;
///
/// assert_eq!(content_type_for("/style.css"), "text/css; charset=utf-8");
/// assert_eq!(content_type_for("/logo.png"), "image/png");
/// assert_eq!(content_type_for("/LICENSE"), "application/octet-stream");
/// ```
pub fn content_type_for(path: &str) -> String {
	let mime = mime_guess::from_path(path).first_or_octet_stream();
	let needs_charset = mime.type_() == mime_guess::mime::TEXT
		|| matches!(mime.subtype().as_str(), "javascript" | "json")
		|| mime.suffix().is_some_and(|s| s == mime_guess::mime::JSON);

	if needs_charset && mime.get_param(mime_guess::mime::CHARSET).is_none() {
		format!("{}; charset=utf-8", mime.essence_str())
	} else {
		mime.to_string()
	}
}

/// Public cache key of a root-relative file name, e.g. `/static/app.js`
pub fn public_key(url_prefix: &str, name: &str) -> String {
	normalize_url_path(&format!("{}/{}", url_prefix, name))
}

/// Loads `name` (relative to `dir`) into the store and returns its entry.
///
/// An entry already stored under the public key is completed in place, so
/// per-file settings seeded before preload survive. The entry is always
/// written back to `files` before returning.
///
/// # Errors
///
/// Fails if the file cannot be stat'd or read. Callers only load files whose
/// existence they already checked, so this is propagated rather than treated
/// as a miss.
pub async fn load_file(
	name: &str,
	dir: &Path,
	config: &StaticCacheConfig,
	files: &FileManager,
) -> Result<SharedEntry> {
	let key = public_key(&config.url_prefix(), name);
	let entry = files
		.get(&key)
		.unwrap_or_else(|| FileEntry::default().into_shared());

	let path = dir.join(name);
	let metadata = tokio::fs::metadata(&path)
		.await
		.map_err(|e| StaticCacheError::io(&path, e))?;
	let modified = metadata
		.modified()
		.map_err(|e| StaticCacheError::io(&path, e))?;
	let bytes = tokio::fs::read(&path)
		.await
		.map_err(|e| StaticCacheError::io(&path, e))?;
	let hash = content_hash(&bytes);

	{
		let mut file = entry.write();
		file.path = path;
		file.cache_control = config.cache_control.clone();
		if file.max_age == 0 {
			file.max_age = config.max_age;
		}
		file.content_type = content_type_for(&key);
		file.last_modified = modified;
		file.length = metadata.len();
		file.content_hash = Some(hash);
		if config.buffer {
			file.buffer = Some(Bytes::from(bytes));
		}

		debug!(
			key = %key,
			path = %file.path.display(),
			content_type = %file.content_type,
			length = file.length,
			buffered = file.is_buffered(),
			"loaded static file"
		);
	}

	files.set(&key, entry.clone());
	Ok(entry)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::FileMap;
	use rstest::rstest;
	use tempfile::TempDir;

	#[rstest]
	#[case("/index.js", "javascript")]
	#[case("/package.json", "application/json; charset=utf-8")]
	#[case("/README.md", "text/markdown; charset=utf-8")]
	#[case("/index.html", "text/html; charset=utf-8")]
	#[case("/image.png", "image/png")]
	#[case("/archive.unknownext", "application/octet-stream")]
	fn test_content_type_for(#[case] path: &str, #[case] expected: &str) {
		assert!(
			content_type_for(path).contains(expected),
			"{} -> {}",
			path,
			content_type_for(path)
		);
	}

	#[rstest]
	fn test_content_hash_is_base64_md5() {
		// md5("a") = 0cc175b9c0f1b6a831c399e269772661
		assert_eq!(content_hash(b"a"), "DMF1ucDxtqgxw5niaXcmYQ==");
	}

	#[rstest]
	#[case("abc", "\"abc\"")]
	#[case("\"abc\"", "\"abc\"")]
	#[case("W/\"abc\"", "W/\"abc\"")]
	fn test_format_etag(#[case] hash: &str, #[case] expected: &str) {
		assert_eq!(format_etag(hash), expected);
	}

	#[rstest]
	#[case("/", "index.js", "/index.js")]
	#[case("/static/", "a.js", "/static/a.js")]
	#[case("/static/", "css/app.css", "/static/css/app.css")]
	fn test_public_key(#[case] prefix: &str, #[case] name: &str, #[case] expected: &str) {
		assert_eq!(public_key(prefix, name), expected);
	}

	#[rstest]
	fn test_cache_control_override() {
		let entry = FileEntry {
			cache_control: Some("no-cache".to_string()),
			max_age: 30,
			..FileEntry::default()
		};
		assert_eq!(entry.cache_control_value(), "no-cache");
	}

	#[rstest]
	#[tokio::test]
	async fn test_load_file_streamed() {
		let temp_dir = TempDir::new().unwrap();
		std::fs::write(temp_dir.path().join("index.js"), "a").unwrap();

		let map = FileMap::new();
		let files = FileManager::from(map.clone());
		let config = StaticCacheConfig::new(temp_dir.path()).with_max_age(10);

		let entry = load_file("index.js", temp_dir.path(), &config, &files)
			.await
			.unwrap();

		let file = entry.read();
		assert_eq!(file.length, 1);
		assert_eq!(file.max_age, 10);
		assert_eq!(file.content_hash.as_deref(), Some("DMF1ucDxtqgxw5niaXcmYQ=="));
		assert!(file.buffer.is_none());
		assert!(file.content_type.contains("javascript"));
		assert_eq!(file.path, temp_dir.path().join("index.js"));
		assert!(map.contains_key("/index.js"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_load_file_buffered_with_prefix() {
		let temp_dir = TempDir::new().unwrap();
		std::fs::write(temp_dir.path().join("app.css"), "body {}").unwrap();

		let map = FileMap::new();
		let files = FileManager::from(map.clone());
		let config = StaticCacheConfig::new(temp_dir.path())
			.with_buffer(true)
			.with_prefix("/static");

		let entry = load_file("app.css", temp_dir.path(), &config, &files)
			.await
			.unwrap();

		assert_eq!(entry.read().buffer.as_deref(), Some(&b"body {}"[..]));
		assert!(map.contains_key("/static/app.css"));
		assert!(!map.contains_key("/app.css"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_load_file_keeps_seeded_max_age() {
		let temp_dir = TempDir::new().unwrap();
		std::fs::write(temp_dir.path().join("package.json"), "{}").unwrap();

		let map = FileMap::new();
		map.insert("/package.json", FileEntry::with_max_age(1));
		let seeded = map.get("/package.json").unwrap();

		let files = FileManager::from(map.clone());
		let config = StaticCacheConfig::new(temp_dir.path())
			.with_max_age(99)
			.with_cache_control("private");

		let entry = load_file("package.json", temp_dir.path(), &config, &files)
			.await
			.unwrap();

		assert!(Arc::ptr_eq(&seeded, &entry));
		assert_eq!(entry.read().max_age, 1);
		assert_eq!(entry.read().cache_control.as_deref(), Some("private"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_load_file_missing_propagates() {
		let temp_dir = TempDir::new().unwrap();
		let files = FileManager::default();
		let config = StaticCacheConfig::new(temp_dir.path());

		let err = load_file("missing.js", temp_dir.path(), &config, &files)
			.await
			.unwrap_err();
		assert!(matches!(err, StaticCacheError::Io { .. }));
		assert!(files.get("/missing.js").is_none());
	}
}
