//! Startup preloading of the served directory

use crate::config::StaticCacheConfig;
use crate::entry::load_file;
use crate::error::Result;
use crate::store::FileManager;
use std::path::{Component, Path};
use std::time::Instant;
use tracing::info;
use walkdir::{DirEntry, WalkDir};

fn is_hidden(entry: &DirEntry) -> bool {
	entry.file_name().to_string_lossy().starts_with('.')
}

/// Lists every regular file under `dir` as a sorted, `/`-separated relative name.
///
/// Dot-files are skipped, and dot-directories are not descended into.
/// Symbolic links are followed.
///
/// # Errors
///
/// Returns [`crate::StaticCacheError::Walk`] if a directory cannot be read.
pub fn collect_files(dir: &Path) -> Result<Vec<String>> {
	let walker = WalkDir::new(dir)
		.follow_links(true)
		.min_depth(1)
		.into_iter()
		.filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

	let mut names = Vec::new();
	for entry in walker {
		let entry = entry?;
		if !entry.file_type().is_file() {
			continue;
		}

		let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
		let name = relative
			.components()
			.filter_map(|component| match component {
				Component::Normal(part) => Some(part.to_string_lossy()),
				_ => None,
			})
			.collect::<Vec<_>>()
			.join("/");
		names.push(name);
	}

	names.sort();
	Ok(names)
}

/// Loads every file under `dir` accepted by the configured filter into `files`.
///
/// Files are loaded one after another; the first failure aborts the preload.
/// Returns the number of files loaded.
///
/// # Errors
///
/// Fails if the directory walk or loading any accepted file fails.
pub async fn preload(dir: &Path, config: &StaticCacheConfig, files: &FileManager) -> Result<usize> {
	let started = Instant::now();
	let walk_root = dir.to_path_buf();
	let names = tokio::task::spawn_blocking(move || collect_files(&walk_root)).await??;
	let found = names.len();

	let mut loaded = 0;
	for name in names.iter().filter(|name| config.filter.accepts(name)) {
		load_file(name, dir, config, files).await?;
		loaded += 1;
	}

	info!(
		dir = %dir.display(),
		found,
		loaded,
		elapsed_ms = started.elapsed().as_millis() as u64,
		"preloaded static files"
	);
	Ok(loaded)
}
