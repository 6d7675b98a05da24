//! Cached track durations keyed by song url

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

const DURATIONS_FILE: &str = ".cache/durations.json";

/// Format milliseconds as the `m:ss` display string used everywhere a
/// duration is shown or cached.
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Lazily discovered track durations, persisted as a JSON url-to-string
/// map so they survive across sessions and tracks are only probed once.
#[derive(Clone)]
pub struct DurationCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
    path: PathBuf,
}

impl DurationCache {
    pub fn new() -> Self {
        Self::at(PathBuf::from(DURATIONS_FILE))
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            path,
        }
    }

    pub async fn load_from_disk(&self) -> Result<()> {
        use std::fs;

        if self.path.exists() {
            let content = fs::read_to_string(&self.path)?;
            let map: HashMap<String, String> = serde_json::from_str(&content)?;
            let mut entries = self.entries.write().await;
            *entries = map;
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

        let entries = self.entries.read().await;
        let content = serde_json::to_string(&*entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub async fn insert(&self, url: &str, formatted: String) {
        let mut entries = self.entries.write().await;
        entries.insert(url.to_string(), formatted);
    }

    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().await.clone()
    }
}

impl Default for DurationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_zero_padded_seconds() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(5_000), "0:05");
        assert_eq!(format_duration(65_000), "1:05");
        assert_eq!(format_duration(600_000), "10:00");
        assert_eq!(format_duration(599_999), "9:59");
    }

    #[tokio::test]
    async fn survives_a_reload() {
        let path = std::env::temp_dir().join(format!(
            "tunelist-durations-reload-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let cache = DurationCache::at(path.clone());
        cache.insert("a.mp3", format_duration(65_000)).await;
        cache.save_to_disk().await.unwrap();

        let reloaded = DurationCache::at(path);
        reloaded.load_from_disk().await.unwrap();
        assert_eq!(
            reloaded.snapshot().await.get("a.mp3").map(String::as_str),
            Some("1:05")
        );
    }
}
