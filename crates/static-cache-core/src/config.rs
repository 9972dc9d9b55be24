//! Configuration for static-cache

use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Selects which files under the root are preloaded
#[derive(Clone, Default)]
pub enum FileFilter {
	/// Every regular file is accepted
	#[default]
	All,
	/// Only the listed root-relative paths are accepted
	AllowList(Vec<String>),
	/// A predicate over the root-relative path (always `/`-separated)
	Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl FileFilter {
	/// Returns `true` if `name` passes the filter
	///
	/// # Examples
	///
	/// ```rust
	/// use static_cache_core::FileFilter;
	///
	/// let filter = FileFilter::AllowList(vec!["index.js".to_string()]);
	/// assert!(filter.accepts("index.js"));
	/// assert!(!filter.accepts("Makefile"));
	/// ```
	pub fn accepts(&self, name: &str) -> bool {
		match self {
			FileFilter::All => true,
			FileFilter::AllowList(names) => names.iter().any(|n| n == name),
			FileFilter::Predicate(predicate) => predicate(name),
		}
	}
}

impl fmt::Debug for FileFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FileFilter::All => f.write_str("All"),
			FileFilter::AllowList(names) => f.debug_tuple("AllowList").field(names).finish(),
			FileFilter::Predicate(_) => f.write_str("Predicate(..)"),
		}
	}
}

/// Configuration for the static file cache
///
/// All fields are optional when deserialized; missing fields take the
/// defaults listed on each field. The file filter can only be set in code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticCacheConfig {
	/// Root directory to serve (default: current working directory)
	pub dir: PathBuf,

	/// `max-age` used to synthesize `Cache-Control` (default: 0)
	pub max_age: u64,

	/// Literal `Cache-Control` value overriding `max_age`
	pub cache_control: Option<String>,

	/// Keep file contents in memory instead of streaming them per request
	pub buffer: bool,

	/// Negotiate gzip with clients via `Accept-Encoding`
	pub gzip: bool,

	/// Use a buffered `<path>.gz` sibling entry instead of compressing on the fly
	pub use_precompiled_gzip: bool,

	/// Whole-path aliases, e.g. `/package` -> `/package.json`
	pub alias: HashMap<String, String>,

	/// URL prefix the files are served under (default: none)
	pub prefix: String,

	/// Files accepted by preload
	#[serde(skip)]
	pub filter: FileFilter,

	/// Load files that were not cached at startup on first request
	pub dynamic: bool,

	/// Load every file under the root at startup (default: true)
	pub preload: bool,
}

impl Default for StaticCacheConfig {
	fn default() -> Self {
		Self {
			dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
			max_age: 0,
			cache_control: None,
			buffer: false,
			gzip: false,
			use_precompiled_gzip: false,
			alias: HashMap::new(),
			prefix: String::new(),
			filter: FileFilter::All,
			dynamic: false,
			preload: true,
		}
	}
}

impl StaticCacheConfig {
	/// Creates a configuration serving `dir` with default settings
	///
	/// # Examples
	///
	/// ```rust
	/// use static_cache_core::StaticCacheConfig;
	///
	/// let config = StaticCacheConfig::new("public")
	///     .with_prefix("/static")
	///     .with_gzip(true)
	///     .with_max_age(3600);
	/// assert_eq!(config.url_prefix(), "/static/");
	/// ```
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			..Self::default()
		}
	}

	/// Parses settings from a JSON document
	///
	/// # Errors
	///
	/// Returns [`crate::StaticCacheError::Config`] if the document is invalid.
	pub fn from_json_str(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Reads settings from a JSON file
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read or parsed.
	pub fn from_json_file(path: &Path) -> Result<Self> {
		let content =
			std::fs::read_to_string(path).map_err(|e| crate::StaticCacheError::io(path, e))?;
		Self::from_json_str(&content)
	}

	/// Sets the default `max-age` in seconds
	pub fn with_max_age(mut self, max_age: u64) -> Self {
		self.max_age = max_age;
		self
	}

	/// Sets a literal `Cache-Control` value
	pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
		self.cache_control = Some(cache_control.into());
		self
	}

	/// Enables or disables in-memory buffering
	pub fn with_buffer(mut self, buffer: bool) -> Self {
		self.buffer = buffer;
		self
	}

	/// Enables or disables gzip negotiation
	pub fn with_gzip(mut self, gzip: bool) -> Self {
		self.gzip = gzip;
		self
	}

	/// Enables or disables use of precompiled `.gz` siblings
	pub fn with_precompiled_gzip(mut self, enabled: bool) -> Self {
		self.use_precompiled_gzip = enabled;
		self
	}

	/// Adds a whole-path alias
	pub fn with_alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
		self.alias.insert(from.into(), to.into());
		self
	}

	/// Sets the URL prefix
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	/// Sets the preload filter
	pub fn with_filter(mut self, filter: FileFilter) -> Self {
		self.filter = filter;
		self
	}

	/// Sets a predicate preload filter
	///
	/// # Examples
	///
	/// ```rust
	/// use static_cache_core::StaticCacheConfig;
	///
	/// let config = StaticCacheConfig::new(".")
	///     .with_filter_fn(|name| !name.contains("node_modules"));
	/// assert!(config.filter.accepts("index.js"));
	/// assert!(!config.filter.accepts("node_modules/a/index.js"));
	/// ```
	pub fn with_filter_fn<F>(self, predicate: F) -> Self
	where
		F: Fn(&str) -> bool + Send + Sync + 'static,
	{
		self.with_filter(FileFilter::Predicate(Arc::new(predicate)))
	}

	/// Sets an allow-list preload filter
	pub fn with_allow_list<I, S>(self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.with_filter(FileFilter::AllowList(
			names.into_iter().map(Into::into).collect(),
		))
	}

	/// Enables or disables dynamic loading
	pub fn with_dynamic(mut self, dynamic: bool) -> Self {
		self.dynamic = dynamic;
		self
	}

	/// Enables or disables preloading at startup
	pub fn with_preload(mut self, preload: bool) -> Self {
		self.preload = preload;
		self
	}

	/// URL prefix with exactly one trailing slash (`""` becomes `/`)
	pub fn url_prefix(&self) -> String {
		format!("{}/", self.prefix.trim_end_matches('/'))
	}

	/// URL prefix as it appears in a root-relative file name, e.g. `static/`
	pub fn file_prefix(&self) -> String {
		let prefix = self.url_prefix();
		prefix.trim_start_matches('/').to_string()
	}
}
