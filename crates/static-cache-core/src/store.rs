//! Cache store adapter
//!
//! The engine talks to its cache through [`FileManager`], which is fixed at
//! construction to one of two backends:
//!
//! - [`FileMap`]: a plain, unbounded mapping (the default)
//! - any injected [`FileStore`], e.g. the bounded [`LruFileStore`], whose
//!   eviction policy is opaque to the engine

use crate::entry::{FileEntry, SharedEntry};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Get/set contract for externally supplied cache stores.
///
/// Implementations decide capacity and eviction on their own; `set` never
/// fails from the engine's point of view.
pub trait FileStore: Send + Sync {
	/// Returns the entry stored under `key`
	fn get(&self, key: &str) -> Option<SharedEntry>;

	/// Stores `entry` under `key`
	fn set(&self, key: &str, entry: SharedEntry);
}

/// Plain unbounded mapping from public path to entry.
///
/// Clones share the same underlying map, so a caller can keep a handle to
/// inspect or seed the cache the engine uses.
#[derive(Clone, Default)]
pub struct FileMap {
	entries: Arc<RwLock<HashMap<String, SharedEntry>>>,
}

impl FileMap {
	/// Creates an empty map
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the entry stored under `key`
	pub fn get(&self, key: &str) -> Option<SharedEntry> {
		self.entries.read().get(key).cloned()
	}

	/// Stores a shared entry under `key`
	pub fn set(&self, key: &str, entry: SharedEntry) {
		self.entries.write().insert(key.to_string(), entry);
	}

	/// Seeds an entry under `key`
	pub fn insert(&self, key: &str, entry: FileEntry) {
		self.set(key, entry.into_shared());
	}

	/// Returns `true` if an entry exists for `key`
	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.read().contains_key(key)
	}

	/// Number of cached entries
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` if the map holds no entries
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Cached keys, sorted
	pub fn keys(&self) -> Vec<String> {
		let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
		keys.sort();
		keys
	}
}

impl FileStore for FileMap {
	fn get(&self, key: &str) -> Option<SharedEntry> {
		FileMap::get(self, key)
	}

	fn set(&self, key: &str, entry: SharedEntry) {
		FileMap::set(self, key, entry)
	}
}

impl fmt::Debug for FileMap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FileMap").field("keys", &self.keys()).finish()
	}
}

/// Bounded store that evicts the least recently used entry on overflow.
///
/// Both `get` and `set` count as a use of the key.
pub struct LruFileStore {
	inner: Mutex<LruCache<String, SharedEntry>>,
}

impl LruFileStore {
	/// Creates a store holding at most `capacity` entries
	///
	/// # Examples
	///
	/// ```rust
	/// use static_cache_core::{FileEntry, FileStore, LruFileStore};
	/// use std::num::NonZeroUsize;
	///
	/// let store = LruFileStore::new(NonZeroUsize::new(1).unwrap());
	/// store.set("/a.js", FileEntry::default().into_shared());
	/// store.set("/b.js", FileEntry::default().into_shared());
	/// assert!(store.get("/a.js").is_none());
	/// assert!(store.get("/b.js").is_some());
	/// ```
	pub fn new(capacity: NonZeroUsize) -> Self {
		Self {
			inner: Mutex::new(LruCache::new(capacity)),
		}
	}

	/// Returns `true` if `key` is cached, without touching its recency
	pub fn contains(&self, key: &str) -> bool {
		self.inner.lock().contains(key)
	}

	/// Number of cached entries
	pub fn len(&self) -> usize {
		self.inner.lock().len()
	}

	/// Returns `true` if the store holds no entries
	pub fn is_empty(&self) -> bool {
		self.inner.lock().is_empty()
	}

	/// Maximum number of entries
	pub fn capacity(&self) -> NonZeroUsize {
		self.inner.lock().cap()
	}
}

impl FileStore for LruFileStore {
	fn get(&self, key: &str) -> Option<SharedEntry> {
		self.inner.lock().get(key).cloned()
	}

	fn set(&self, key: &str, entry: SharedEntry) {
		self.inner.lock().put(key.to_string(), entry);
	}
}

impl fmt::Debug for LruFileStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.lock();
		f.debug_struct("LruFileStore")
			.field("len", &inner.len())
			.field("capacity", &inner.cap())
			.finish()
	}
}

/// Uniform get/set over the configured cache backend.
///
/// The variant is chosen once and never changes, so callers never need to
/// know which backend they hold.
#[derive(Clone)]
pub enum FileManager {
	/// Plain mapping
	Map(FileMap),
	/// Injected store with its own eviction policy
	Store(Arc<dyn FileStore>),
}

impl FileManager {
	/// Wraps an injected store
	pub fn from_store<S: FileStore + 'static>(store: Arc<S>) -> Self {
		FileManager::Store(store)
	}

	/// Returns the entry stored under `key`
	pub fn get(&self, key: &str) -> Option<SharedEntry> {
		match self {
			FileManager::Map(map) => map.get(key),
			FileManager::Store(store) => store.get(key),
		}
	}

	/// Stores `entry` under `key`
	pub fn set(&self, key: &str, entry: SharedEntry) {
		match self {
			FileManager::Map(map) => map.set(key, entry),
			FileManager::Store(store) => store.set(key, entry),
		}
	}
}

impl Default for FileManager {
	fn default() -> Self {
		FileManager::Map(FileMap::new())
	}
}

impl From<FileMap> for FileManager {
	fn from(map: FileMap) -> Self {
		FileManager::Map(map)
	}
}

impl From<Arc<dyn FileStore>> for FileManager {
	fn from(store: Arc<dyn FileStore>) -> Self {
		FileManager::Store(store)
	}
}

impl fmt::Debug for FileManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FileManager::Map(map) => f.debug_tuple("Map").field(map).finish(),
			FileManager::Store(_) => f.write_str("Store(..)"),
		}
	}
}
