//! Served-directory fixtures for static-cache-core tests

use async_trait::async_trait;
use flate2::read::GzDecoder;
use static_cache_http::{Handler, Request, Response, Result};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir as TempDirType;
use tracing_subscriber::EnvFilter;

/// Size of the compressible stylesheet in [`site_dir`]
pub const COMPRESSIBLE_SIZE: usize = 2000;

/// Wrapper for tempfile TempDir exposing the served root
pub struct TempDir {
	inner: TempDirType,
	root: PathBuf,
}

impl TempDir {
	fn new(inner: TempDirType, root: PathBuf) -> Self {
		Self { inner, root }
	}

	/// Directory to serve
	pub fn path(&self) -> &Path {
		&self.root
	}

	/// The temp dir holding the served root
	pub fn outer(&self) -> &Path {
		self.inner.path()
	}
}

/// Creates a served directory with a typical mix of files:
///
/// - `index.js` containing `a`
/// - `package.json`
/// - `app.css`, compressible and [`COMPRESSIBLE_SIZE`] bytes long
/// - `logo.png`, small and binary
/// - `.env`, a hidden file
/// - `sub/`, a directory with `sub/nested.js`
pub fn site_dir() -> TempDir {
	let temp_dir = TempDirType::new().unwrap();
	let root = temp_dir.path().join("public");
	fs::create_dir(&root).unwrap();

	fs::write(root.join("index.js"), "a").unwrap();
	fs::write(root.join("package.json"), r#"{ "name": "static-cache" }"#).unwrap();

	let rule = "body { color: red; }\n";
	let mut css = rule.repeat(COMPRESSIBLE_SIZE / rule.len() + 1);
	css.truncate(COMPRESSIBLE_SIZE);
	fs::write(root.join("app.css"), css).unwrap();

	fs::write(root.join("logo.png"), b"\x89PNG\r\n\x1a\n").unwrap();
	fs::write(root.join(".env"), "SECRET=1").unwrap();

	fs::create_dir(root.join("sub")).unwrap();
	fs::write(root.join("sub/nested.js"), "export default 1;").unwrap();

	// outside the served root
	fs::write(temp_dir.path().join("secret.txt"), "top secret").unwrap();

	TempDir::new(temp_dir, root)
}

/// Creates a served directory with nested and hidden directories
pub fn nested_dir() -> TempDir {
	let temp_dir = site_dir();
	let root = temp_dir.path();

	fs::create_dir_all(root.join("css/vendor")).unwrap();
	fs::write(root.join("css/vendor/reset.css"), "* { margin: 0; }").unwrap();
	fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
	fs::write(root.join("node_modules/pkg/index.js"), "module.exports = 1;").unwrap();

	temp_dir
}

/// Creates a served directory whose only content sits in dot-directories
pub fn hidden_dir() -> TempDir {
	let temp_dir = TempDirType::new().unwrap();
	let root = temp_dir.path().join("public");
	fs::create_dir_all(root.join(".git/objects")).unwrap();
	fs::write(root.join(".git/HEAD"), "ref: refs/heads/main").unwrap();
	fs::write(root.join(".git/objects/ab"), "blob").unwrap();
	fs::write(root.join(".gitignore"), "target").unwrap();
	TempDir::new(temp_dir, root)
}

/// Rewrites `path` and moves its mtime forward so the change is detectable
pub fn touch_later(path: &Path, content: &str) {
	let previous = fs::metadata(path).unwrap().modified().unwrap();
	let mut file = File::create(path).unwrap();
	file.write_all(content.as_bytes()).unwrap();
	file.set_modified(previous + Duration::from_secs(10)).unwrap();
}

/// Rewrites `path` and moves its mtime ten seconds into the past
pub fn touch_earlier(path: &Path, content: &str) {
	let previous = fs::metadata(path).unwrap().modified().unwrap();
	let mut file = File::create(path).unwrap();
	file.write_all(content.as_bytes()).unwrap();
	file.set_modified(previous - Duration::from_secs(10)).unwrap();
}

/// Routes engine logs to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// Decompresses a gzip body
pub fn gunzip(data: &[u8]) -> Vec<u8> {
	let mut decoder = GzDecoder::new(data);
	let mut out = Vec::new();
	decoder.read_to_end(&mut out).unwrap();
	out
}

/// Downstream handler answering every request with 404
pub struct NotFound;

#[async_trait]
impl Handler for NotFound {
	async fn handle(&self, _request: Request) -> Result<Response> {
		Ok(Response::not_found().with_body("not found"))
	}
}
