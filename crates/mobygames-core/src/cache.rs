//! Two-tier cache for scraper results
//!
//! Entries live in memory for the session and are written to a
//! [`PersistentCache`] backend only when [`CacheStore::flush`] is called.
//! Each namespace is read from the backend the first time it is touched.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, ScraperError};
use crate::types::CacheKey;

pub type Entries = BTreeMap<String, Value>;

/// Purpose of a cached value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Ranked search results
    Candidates,
    /// Merged [`GameMetadata`](crate::types::GameMetadata)
    Metadata,
    /// Unfiltered asset list of a candidate
    Internal,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Candidates, Namespace::Metadata, Namespace::Internal];

    pub fn name(self) -> &'static str {
        match self {
            Namespace::Candidates => "candidates",
            Namespace::Metadata => "metadata",
            Namespace::Internal => "internal",
        }
    }
}

/// Durable storage behind the in-memory cache
pub trait PersistentCache: Send {
    /// Reads every entry of a namespace; a namespace never saved is empty
    fn load(&self, namespace: Namespace) -> Result<Entries>;

    /// Acquires the storage for writing
    ///
    /// The returned session is released when dropped, whether or not
    /// every save succeeded.
    fn acquire(&self) -> Result<Box<dyn CacheSession + '_>>;
}

/// Write access to a [`PersistentCache`], held for the duration of a flush
pub trait CacheSession {
    fn save(&mut self, namespace: Namespace, entries: &Entries) -> Result<()>;
}

/// JSON files in a directory, one per namespace
///
/// Files are named `<prefix>_<namespace>.json`. Saves go through a
/// temporary file and a rename so a failed write leaves the previous
/// file intact.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
    prefix: String,
}

impl JsonFileCache {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.to_string(),
        }
    }

    pub fn path_for(&self, namespace: Namespace) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", self.prefix, namespace.name()))
    }
}

impl PersistentCache for JsonFileCache {
    fn load(&self, namespace: Namespace) -> Result<Entries> {
        let path = self.path_for(namespace);
        if !path.exists() {
            return Ok(Entries::new());
        }
        let raw = fs::read(&path)?;
        serde_json::from_slice(&raw)
            .map_err(|e| ScraperError::Cache(format!("{}: {}", path.display(), e)))
    }

    fn acquire(&self) -> Result<Box<dyn CacheSession + '_>> {
        fs::create_dir_all(&self.dir)?;
        tracing::debug!(dir = %self.dir.display(), "Disk cache acquired");
        Ok(Box::new(JsonFileSession {
            cache: self,
            pending: Vec::new(),
        }))
    }
}

struct JsonFileSession<'a> {
    cache: &'a JsonFileCache,
    /// Temporary files not yet renamed into place
    pending: Vec<PathBuf>,
}

impl JsonFileSession<'_> {
    fn write_json(tmp: &Path, entries: &Entries) -> Result<()> {
        let mut writer = std::io::BufWriter::new(fs::File::create(tmp)?);
        serde_json::to_writer(&mut writer, entries).map_err(|e| ScraperError::Cache(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }
}

impl CacheSession for JsonFileSession<'_> {
    fn save(&mut self, namespace: Namespace, entries: &Entries) -> Result<()> {
        let path = self.cache.path_for(namespace);
        let tmp = path.with_extension("json.tmp");
        self.pending.push(tmp.clone());

        Self::write_json(&tmp, entries)?;
        fs::rename(&tmp, &path)?;

        self.pending.retain(|p| p != &tmp);
        tracing::debug!(namespace = namespace.name(), entries = entries.len(), "Cache namespace saved");
        Ok(())
    }
}

impl Drop for JsonFileSession<'_> {
    fn drop(&mut self) {
        for tmp in self.pending.drain(..) {
            if let Err(e) = fs::remove_file(&tmp) {
                tracing::warn!(path = %tmp.display(), error = %e, "Could not remove temporary cache file");
            }
        }
        tracing::debug!(dir = %self.cache.dir.display(), "Disk cache released");
    }
}

/// Backend that persists nothing, used when no cache directory is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryCache;

struct NullSession;

impl CacheSession for NullSession {
    fn save(&mut self, _namespace: Namespace, _entries: &Entries) -> Result<()> {
        Ok(())
    }
}

impl PersistentCache for MemoryCache {
    fn load(&self, _namespace: Namespace) -> Result<Entries> {
        Ok(Entries::new())
    }

    fn acquire(&self) -> Result<Box<dyn CacheSession + '_>> {
        Ok(Box::new(NullSession))
    }
}

#[derive(Default)]
struct NamespaceCache {
    entries: Entries,
    dirty: bool,
    /// Durable copy could not be read; it is never overwritten
    load_failed: bool,
}

/// Namespaced key/value cache owned by one scraper instance
pub struct CacheStore {
    backend: Box<dyn PersistentCache>,
    namespaces: HashMap<Namespace, NamespaceCache>,
}

impl CacheStore {
    pub fn new(backend: Box<dyn PersistentCache>) -> Self {
        Self {
            backend,
            namespaces: HashMap::new(),
        }
    }

    /// In-memory only store
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryCache))
    }

    fn namespace(&mut self, namespace: Namespace) -> &mut NamespaceCache {
        let backend = &self.backend;
        self.namespaces.entry(namespace).or_insert_with(|| {
            let (entries, load_failed) = match backend.load(namespace) {
                Ok(entries) => (entries, false),
                Err(e) => {
                    tracing::warn!(namespace = namespace.name(), error = %e, "Cache load failed, starting empty");
                    (Entries::new(), true)
                }
            };
            tracing::debug!(namespace = namespace.name(), entries = entries.len(), "Cache namespace loaded");
            NamespaceCache {
                entries,
                dirty: false,
                load_failed,
            }
        })
    }

    pub fn has(&mut self, namespace: Namespace, key: &CacheKey) -> bool {
        self.namespace(namespace).entries.contains_key(key.as_str())
    }

    /// Returns the cached value, or `None` if absent or of another shape
    pub fn get<T: DeserializeOwned>(&mut self, namespace: Namespace, key: &CacheKey) -> Option<T> {
        let value = self.namespace(namespace).entries.get(key.as_str())?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(namespace = namespace.name(), key = %key, error = %e, "Discarding unreadable cache entry");
                None
            }
        }
    }

    pub fn put<T: Serialize>(&mut self, namespace: Namespace, key: &CacheKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| ScraperError::Cache(e.to_string()))?;
        let ns = self.namespace(namespace);
        ns.entries.insert(key.as_str().to_string(), value);
        ns.dirty = true;
        Ok(())
    }

    /// Writes every modified namespace to the backend
    ///
    /// Namespaces are saved independently: one failing does not stop the
    /// others, and the storage is released either way. The first error is
    /// returned. A namespace whose file failed to load is kept in memory
    /// only.
    pub fn flush(&mut self) -> Result<()> {
        let mut session = self.backend.acquire()?;
        let mut first_error = None;

        for namespace in Namespace::ALL {
            let Some(ns) = self.namespaces.get_mut(&namespace) else {
                continue;
            };
            if !ns.dirty {
                continue;
            }
            if ns.load_failed {
                tracing::warn!(
                    namespace = namespace.name(),
                    "Not saving cache namespace, its file could not be read"
                );
                continue;
            }
            match session.save(namespace, &ns.entries) {
                Ok(()) => ns.dirty = false,
                Err(e) => {
                    tracing::error!(namespace = namespace.name(), error = %e, "Cache flush failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        drop(session);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn key(name: &str) -> CacheKey {
        CacheKey::new(name, "Nintendo NES")
    }

    #[test]
    fn test_memory_put_get() {
        let mut store = CacheStore::in_memory();
        assert!(!store.has(Namespace::Metadata, &key("a")));

        store.put(Namespace::Metadata, &key("a"), &vec!["x".to_string()]).unwrap();
        assert!(store.has(Namespace::Metadata, &key("a")));
        assert_eq!(
            store.get::<Vec<String>>(Namespace::Metadata, &key("a")),
            Some(vec!["x".to_string()])
        );
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut store = CacheStore::in_memory();
        store.put(Namespace::Candidates, &key("a"), &1u32).unwrap();
        assert!(!store.has(Namespace::Metadata, &key("a")));
        assert!(!store.has(Namespace::Internal, &key("a")));
    }

    #[test]
    fn test_get_wrong_shape_is_none() {
        let mut store = CacheStore::in_memory();
        store.put(Namespace::Metadata, &key("a"), &"text").unwrap();
        assert_eq!(store.get::<u32>(Namespace::Metadata, &key("a")), None);
    }

    #[test]
    fn test_flush_and_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = CacheStore::new(Box::new(JsonFileCache::new(dir.path(), "MobyGames")));
            store.put(Namespace::Metadata, &key("castlevania"), &"cached").unwrap();
            store.flush().unwrap();
        }

        let backend = JsonFileCache::new(dir.path(), "MobyGames");
        assert!(backend.path_for(Namespace::Metadata).exists());
        assert!(!backend.path_for(Namespace::Candidates).exists());

        let mut store = CacheStore::new(Box::new(backend));
        assert_eq!(
            store.get::<String>(Namespace::Metadata, &key("castlevania")),
            Some("cached".to_string())
        );
    }

    #[test]
    fn test_unflushed_entries_are_not_durable() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = CacheStore::new(Box::new(JsonFileCache::new(dir.path(), "MobyGames")));
            store.put(Namespace::Internal, &key("a"), &1u32).unwrap();
        }
        let mut store = CacheStore::new(Box::new(JsonFileCache::new(dir.path(), "MobyGames")));
        assert!(!store.has(Namespace::Internal, &key("a")));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileCache::new(dir.path(), "MobyGames");
        fs::write(backend.path_for(Namespace::Candidates), b"{not json").unwrap();

        let mut store = CacheStore::new(Box::new(backend));
        assert!(!store.has(Namespace::Candidates, &key("a")));
    }

    #[test]
    fn test_unreadable_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileCache::new(dir.path(), "MobyGames");
        let path = backend.path_for(Namespace::Candidates);
        fs::write(&path, b"{not json").unwrap();

        let mut store = CacheStore::new(Box::new(backend));
        store.put(Namespace::Candidates, &key("a"), &1u32).unwrap();
        store.put(Namespace::Metadata, &key("a"), &2u32).unwrap();
        store.flush().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"{not json");
        assert!(dir.path().join("MobyGames_metadata.json").exists());
        assert!(store.has(Namespace::Candidates, &key("a")));
    }

    /// Backend whose metadata namespace always fails to save
    struct FlakyBackend {
        saved: Arc<Mutex<Vec<Namespace>>>,
        released: Arc<Mutex<bool>>,
    }

    struct FlakySession<'a>(&'a FlakyBackend);

    impl CacheSession for FlakySession<'_> {
        fn save(&mut self, namespace: Namespace, _entries: &Entries) -> Result<()> {
            if namespace == Namespace::Metadata {
                return Err(ScraperError::Cache("disk full".to_string()));
            }
            self.0.saved.lock().unwrap().push(namespace);
            Ok(())
        }
    }

    impl Drop for FlakySession<'_> {
        fn drop(&mut self) {
            *self.0.released.lock().unwrap() = true;
        }
    }

    impl PersistentCache for FlakyBackend {
        fn load(&self, _namespace: Namespace) -> Result<Entries> {
            Ok(Entries::new())
        }

        fn acquire(&self) -> Result<Box<dyn CacheSession + '_>> {
            Ok(Box::new(FlakySession(self)))
        }
    }

    #[test]
    fn test_flush_is_best_effort_per_namespace() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let released = Arc::new(Mutex::new(false));
        let mut store = CacheStore::new(Box::new(FlakyBackend {
            saved: saved.clone(),
            released: released.clone(),
        }));

        store.put(Namespace::Candidates, &key("a"), &1u32).unwrap();
        store.put(Namespace::Metadata, &key("a"), &2u32).unwrap();
        store.put(Namespace::Internal, &key("a"), &3u32).unwrap();

        let result = store.flush();
        assert!(matches!(result, Err(ScraperError::Cache(_))));
        assert_eq!(
            *saved.lock().unwrap(),
            vec![Namespace::Candidates, Namespace::Internal]
        );
        assert!(*released.lock().unwrap());
    }

    #[test]
    fn test_flush_skips_clean_namespaces() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let mut store = CacheStore::new(Box::new(FlakyBackend {
            saved: saved.clone(),
            released: Arc::new(Mutex::new(false)),
        }));
        store.put(Namespace::Internal, &key("a"), &3u32).unwrap();
        store.flush().unwrap();
        store.flush().unwrap();
        assert_eq!(*saved.lock().unwrap(), vec![Namespace::Internal]);
    }
}
