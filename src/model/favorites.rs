//! Persisted favorites: the set of song urls the user has marked

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

const FAVORITES_FILE: &str = ".cache/favorites.json";

/// Favorite song ids (urls), shared across the app and persisted as a JSON
/// array of strings. Membership is independent of whichever view is active.
#[derive(Clone)]
pub struct FavoriteStore {
    ids: Arc<RwLock<HashSet<String>>>,
    path: PathBuf,
}

impl FavoriteStore {
    pub fn new() -> Self {
        Self::at(PathBuf::from(FAVORITES_FILE))
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            ids: Arc::new(RwLock::new(HashSet::new())),
            path,
        }
    }

    pub async fn load_from_disk(&self) -> Result<()> {
        use std::fs;

        if self.path.exists() {
            let content = fs::read_to_string(&self.path)?;
            let urls: Vec<String> = serde_json::from_str(&content)?;
            let mut ids = self.ids.write().await;
            *ids = urls.into_iter().collect();
        }
        Ok(())
    }

    pub async fn save_to_disk(&self) -> Result<()> {
        use std::fs;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let ids = self.ids.read().await;
        let urls: Vec<&String> = ids.iter().collect();
        let content = serde_json::to_string(&urls)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Flip membership; returns the new state. The caller persists.
    pub async fn toggle(&self, url: &str) -> bool {
        let mut ids = self.ids.write().await;
        if ids.remove(url) {
            false
        } else {
            ids.insert(url.to_string());
            true
        }
    }

    pub async fn is_favorite(&self, url: &str) -> bool {
        self.ids.read().await.contains(url)
    }

    pub async fn snapshot(&self) -> HashSet<String> {
        self.ids.read().await.clone()
    }
}

impl Default for FavoriteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FavoriteStore {
        let path = std::env::temp_dir().join(format!(
            "tunelist-favorites-{}-{}.json",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        FavoriteStore::at(path)
    }

    #[tokio::test]
    async fn toggling_twice_restores_membership() {
        let store = temp_store("double-toggle");
        assert!(store.toggle("a.mp3").await);
        assert!(store.is_favorite("a.mp3").await);
        assert!(!store.toggle("a.mp3").await);
        assert!(!store.is_favorite("a.mp3").await);
    }

    #[tokio::test]
    async fn every_toggle_is_observable_on_disk() {
        let store = temp_store("persist");

        store.toggle("a.mp3").await;
        store.save_to_disk().await.unwrap();
        let on_disk = std::fs::read_to_string(&store.path).unwrap();
        assert!(on_disk.contains("a.mp3"));

        store.toggle("a.mp3").await;
        store.save_to_disk().await.unwrap();
        let on_disk = std::fs::read_to_string(&store.path).unwrap();
        assert!(!on_disk.contains("a.mp3"));
    }

    #[tokio::test]
    async fn survives_a_reload() {
        let store = temp_store("reload");
        store.toggle("a.mp3").await;
        store.toggle("b.mp3").await;
        store.save_to_disk().await.unwrap();

        let reloaded = FavoriteStore::at(store.path.clone());
        reloaded.load_from_disk().await.unwrap();
        assert!(reloaded.is_favorite("a.mp3").await);
        assert!(reloaded.is_favorite("b.mp3").await);
        assert!(!reloaded.is_favorite("c.mp3").await);
    }
}
