use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::constants::FAVORITES_KEY;
use crate::models::{Video, VideoId};
use crate::utils::{AppError, AppResult};

/// Key/value persistence for favorite id sets
pub trait FavoritesStore: Send + Sync {
    /// Ids stored under `key`; empty when nothing was stored yet
    fn get(&self, key: &str) -> AppResult<HashSet<String>>;
    fn set(&self, key: &str, ids: &HashSet<String>) -> AppResult<()>;
}

fn lock_error<T>(_: T) -> AppError {
    AppError::Storage("favorites lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct MemoryFavoritesStore {
    entries: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryFavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FavoritesStore for MemoryFavoritesStore {
    fn get(&self, key: &str) -> AppResult<HashSet<String>> {
        let entries = self.entries.read().map_err(lock_error)?;
        Ok(entries.get(key).cloned().unwrap_or_default())
    }

    fn set(&self, key: &str, ids: &HashSet<String>) -> AppResult<()> {
        let mut entries = self.entries.write().map_err(lock_error)?;
        entries.insert(key.to_string(), ids.clone());
        Ok(())
    }
}

/// File-backed store: one JSON object mapping each key to a sorted id list.
#[derive(Debug)]
pub struct JsonFavoritesStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, BTreeSet<String>>>,
}

impl JsonFavoritesStore {
    /// Opens the store at `path`, starting empty when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let entries: BTreeMap<String, BTreeSet<String>> = serde_json::from_str(&contents)?;
            debug!("Loaded {} favorites keys from {:?}", entries.len(), path);
            entries
        } else {
            info!("No favorites file at {:?}, starting empty", path);
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, BTreeSet<String>>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!("Favorites saved to {:?}", self.path);
        Ok(())
    }
}

impl FavoritesStore for JsonFavoritesStore {
    fn get(&self, key: &str) -> AppResult<HashSet<String>> {
        let entries = self.entries.read().map_err(lock_error)?;
        Ok(entries
            .get(key)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn set(&self, key: &str, ids: &HashSet<String>) -> AppResult<()> {
        let mut entries = self.entries.write().map_err(lock_error)?;
        let mut updated = entries.clone();
        updated.insert(key.to_string(), ids.iter().cloned().collect());
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }
}

/// Favorite lessons, kept under a single store key.
#[derive(Clone)]
pub struct FavoritesService {
    store: Arc<dyn FavoritesStore>,
}

impl std::fmt::Debug for FavoritesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesService")
            .field("key", &FAVORITES_KEY)
            .finish()
    }
}

impl FavoritesService {
    pub fn new(store: Arc<dyn FavoritesStore>) -> Self {
        Self { store }
    }

    pub fn is_favorite(&self, id: &VideoId) -> AppResult<bool> {
        Ok(self.store.get(FAVORITES_KEY)?.contains(id.as_str()))
    }

    /// Flips the favorite flag of `id` and returns the new state.
    pub fn toggle(&self, id: &VideoId) -> AppResult<bool> {
        let mut ids = self.store.get(FAVORITES_KEY)?;
        let now_favorite = if ids.remove(id.as_str()) {
            false
        } else {
            ids.insert(id.to_string());
            true
        };
        self.store.set(FAVORITES_KEY, &ids)?;

        debug!("Video {} favorite: {}", id, now_favorite);
        Ok(now_favorite)
    }

    /// The favorite subset of `catalog`, in catalog order.
    pub fn favorite_videos(&self, catalog: &[Video]) -> AppResult<Vec<Video>> {
        let ids = self.store.get(FAVORITES_KEY)?;
        Ok(catalog
            .iter()
            .filter(|video| ids.contains(video.id.as_str()))
            .cloned()
            .collect())
    }
}
