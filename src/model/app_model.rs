//! Main application model with state management

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::audio::DEFAULT_VOLUME_PERCENT;

use super::catalog_client::CatalogClient;
use super::durations::{DurationCache, format_duration};
use super::favorites::FavoriteStore;
use super::playback::{NowPlaying, PlaybackInfo, PlaybackState, Transition};
use super::store::{PlaylistStore, SongRow, ViewState};
use super::types::{ActiveSection, RepeatState, Song, Tab, UiState};

/// Main application model containing all state.
///
/// Lock order, where guards overlap: ui_state, then store, then playback,
/// then now_playing.
pub struct AppModel {
    pub client: Option<CatalogClient>,
    store: Arc<Mutex<PlaylistStore>>,
    playback: Arc<Mutex<PlaybackState>>,
    now_playing: Arc<Mutex<NowPlaying>>,
    volume: Arc<Mutex<u8>>,
    favorites: FavoriteStore,
    durations: DurationCache,
    pub ui_state: Arc<Mutex<UiState>>,
    pub should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new() -> Self {
        Self {
            client: None,
            store: Arc::new(Mutex::new(PlaylistStore::default())),
            playback: Arc::new(Mutex::new(PlaybackState::default())),
            now_playing: Arc::new(Mutex::new(NowPlaying::default())),
            volume: Arc::new(Mutex::new(DEFAULT_VOLUME_PERCENT)),
            favorites: FavoriteStore::new(),
            durations: DurationCache::new(),
            ui_state: Arc::new(Mutex::new(UiState::default())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_catalog_client(&mut self, client: CatalogClient) {
        self.client = Some(client);
    }

    pub async fn get_catalog_client(&self) -> Option<CatalogClient> {
        self.client.clone()
    }

    /// Bring favorites and cached durations back from disk.
    pub async fn init_caches(&self) -> Result<()> {
        self.favorites.load_from_disk().await?;
        self.durations.load_from_disk().await?;
        Ok(())
    }

    // ========================================================================
    // Catalog & active view
    // ========================================================================

    pub async fn set_catalog(&self, songs: Vec<Song>) {
        {
            let mut store = self.store.lock().await;
            store.set_catalog(songs);
        }
        self.refresh_view().await;
    }

    /// Recompute the active view from the current tab, query and favorites,
    /// and drop the playback position: view indices never survive a
    /// rebuild, even when the playing track still matches the new filter.
    async fn refresh_view(&self) {
        let favorites = self.favorites.snapshot().await;
        {
            let mut ui = self.ui_state.lock().await;
            let mut store = self.store.lock().await;
            store.rebuild(ui.tab, &ui.search_query, &favorites);
            ui.selected = ui.selected.min(store.len().saturating_sub(1));
        }
        self.playback.lock().await.invalidate_position();
    }

    pub async fn set_tab(&self, tab: Tab) {
        {
            let mut ui = self.ui_state.lock().await;
            if ui.tab == tab && ui.search_query.is_empty() {
                return;
            }
            ui.tab = tab;
            ui.search_query.clear();
        }
        self.refresh_view().await;
    }

    pub async fn append_to_search(&self, c: char) {
        {
            self.ui_state.lock().await.search_query.push(c);
        }
        self.refresh_view().await;
    }

    pub async fn backspace_search(&self) {
        {
            let mut ui = self.ui_state.lock().await;
            if ui.search_query.pop().is_none() {
                return;
            }
        }
        self.refresh_view().await;
    }

    pub async fn clear_search(&self) {
        {
            let mut ui = self.ui_state.lock().await;
            if ui.search_query.is_empty() {
                return;
            }
            ui.search_query.clear();
        }
        self.refresh_view().await;
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// Flip a song's favorite membership and persist it immediately. The
    /// view is rebuilt when the favorites filter is showing, since
    /// membership drives it.
    pub async fn toggle_favorite(&self, url: &str) -> bool {
        let favorite = self.favorites.toggle(url).await;
        if let Err(e) = self.favorites.save_to_disk().await {
            tracing::warn!(error = %e, "Could not persist favorites");
        }
        let favorites_view = {
            let ui = self.ui_state.lock().await;
            ui.tab == Tab::Favorites && ui.search_query.is_empty()
        };
        if favorites_view {
            self.refresh_view().await;
        }
        favorite
    }

    // ========================================================================
    // Playback state
    // ========================================================================

    /// Commit a play of view index `index`, recording it in the history.
    /// Returns the song to load, or None when the index is out of range.
    /// The state is fully updated before the caller talks to the audio
    /// output.
    pub async fn record_play(&self, index: usize) -> Option<Song> {
        let song = {
            let store = self.store.lock().await;
            store.song_at(index)?.clone()
        };
        self.playback.lock().await.record_play(index);
        self.begin_track(song.clone()).await;
        Some(song)
    }

    /// Like [`record_play`](Self::record_play) but without extending the
    /// history (shuffle "previous" replays it instead).
    pub async fn replay(&self, index: usize) -> Option<Song> {
        let song = {
            let store = self.store.lock().await;
            store.song_at(index)?.clone()
        };
        self.playback.lock().await.replay(index);
        self.begin_track(song.clone()).await;
        Some(song)
    }

    async fn begin_track(&self, song: Song) {
        let mut now = self.now_playing.lock().await;
        *now = NowPlaying {
            song: Some(song),
            position_ms: 0,
            duration_ms: None,
            is_playing: true,
        };
    }

    pub async fn next_transition(&self) -> Transition {
        let view_len = self.store.lock().await.len();
        let playback = self.playback.lock().await;
        let mut rng = rand::rng();
        playback.next_transition(view_len, &mut rng)
    }

    pub async fn previous_transition(&self) -> Transition {
        let view_len = self.store.lock().await.len();
        self.playback.lock().await.previous_transition(view_len)
    }

    pub async fn get_shuffle_state(&self) -> bool {
        self.playback.lock().await.shuffle()
    }

    pub async fn set_shuffle(&self, shuffle: bool) {
        self.playback.lock().await.set_shuffle(shuffle);
    }

    pub async fn get_repeat_state(&self) -> RepeatState {
        self.playback.lock().await.repeat()
    }

    pub async fn set_repeat(&self, repeat: RepeatState) {
        self.playback.lock().await.set_repeat(repeat);
    }

    pub async fn get_volume(&self) -> u8 {
        *self.volume.lock().await
    }

    pub async fn set_volume(&self, volume: u8) {
        *self.volume.lock().await = volume;
    }

    // ========================================================================
    // Now playing
    // ========================================================================

    pub async fn is_playing(&self) -> bool {
        self.now_playing.lock().await.is_playing
    }

    pub async fn set_playing(&self, is_playing: bool) {
        self.now_playing.lock().await.is_playing = is_playing;
    }

    pub async fn now_playing_url(&self) -> Option<String> {
        let now = self.now_playing.lock().await;
        now.song.as_ref().map(|song| song.url.clone())
    }

    pub async fn update_playback_position(&self, position_ms: u64, is_playing: bool) {
        let mut now = self.now_playing.lock().await;
        now.position_ms = position_ms;
        now.is_playing = is_playing;
    }

    /// Record a discovered duration: cache it (persisted immediately) and
    /// attach it to the current track when it matches.
    pub async fn set_duration(&self, url: &str, duration_ms: u64) {
        self.durations.insert(url, format_duration(duration_ms)).await;
        if let Err(e) = self.durations.save_to_disk().await {
            tracing::warn!(error = %e, "Could not persist durations");
        }
        let mut now = self.now_playing.lock().await;
        if now.song.as_ref().is_some_and(|song| song.url == url) {
            now.duration_ms = Some(duration_ms);
        }
    }

    /// Catalog entries the duration prober still has to visit.
    pub async fn songs_missing_duration(&self) -> Vec<Song> {
        let cached = self.durations.snapshot().await;
        let store = self.store.lock().await;
        store
            .catalog()
            .iter()
            .filter(|song| !cached.contains_key(&song.url))
            .cloned()
            .collect()
    }

    // ========================================================================
    // Render snapshots
    // ========================================================================

    pub async fn get_playback_info(&self) -> PlaybackInfo {
        let (shuffle, repeat) = {
            let playback = self.playback.lock().await;
            (playback.shuffle(), playback.repeat())
        };
        let now = self.now_playing.lock().await.clone();
        PlaybackInfo {
            track: now.song,
            position_ms: now.position_ms,
            duration_ms: now.duration_ms,
            is_playing: now.is_playing,
            shuffle,
            repeat,
            volume: self.get_volume().await,
        }
    }

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn get_view_state(&self) -> ViewState {
        let favorites = self.favorites.snapshot().await;
        let durations = self.durations.snapshot().await;
        let playing_url = self.now_playing_url().await;

        let ui = self.ui_state.lock().await.clone();
        let store = self.store.lock().await;
        let rows = store
            .view()
            .iter()
            .map(|song| SongRow {
                title: song.title.clone(),
                artist: song.artist.clone(),
                duration: durations.get(&song.url).cloned(),
                favorite: favorites.contains(&song.url),
                playing: playing_url.as_deref() == Some(song.url.as_str()),
            })
            .collect();

        ViewState {
            rows,
            selected: ui.selected,
            tab: ui.tab,
            searching: !ui.search_query.is_empty(),
            catalog_len: store.catalog().len(),
        }
    }

    // ========================================================================
    // Selection & sections
    // ========================================================================

    pub async fn move_selection_up(&self) {
        let mut ui = self.ui_state.lock().await;
        if ui.selected > 0 {
            ui.selected -= 1;
        }
    }

    pub async fn move_selection_down(&self) {
        let mut ui = self.ui_state.lock().await;
        let view_len = self.store.lock().await.len();
        if ui.selected + 1 < view_len {
            ui.selected += 1;
        }
    }

    pub async fn selected_index(&self) -> usize {
        self.ui_state.lock().await.selected
    }

    pub async fn selected_song(&self) -> Option<Song> {
        let ui = self.ui_state.lock().await;
        let store = self.store.lock().await;
        store.song_at(ui.selected).cloned()
    }

    pub async fn cycle_section(&self) {
        let mut ui = self.ui_state.lock().await;
        ui.active_section = ui.active_section.next();
    }

    pub async fn set_active_section(&self, section: ActiveSection) {
        self.ui_state.lock().await.active_section = section;
    }

    // ========================================================================
    // Errors, help, quit
    // ========================================================================

    pub async fn set_error(&self, message: String) {
        let mut ui = self.ui_state.lock().await;
        ui.error_message = Some(message);
        ui.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut ui = self.ui_state.lock().await;
        ui.error_message = None;
        ui.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut ui = self.ui_state.lock().await;
        if let Some(timestamp) = ui.error_timestamp {
            if timestamp.elapsed().as_secs() > 5 {
                ui.error_message = None;
                ui.error_timestamp = None;
            }
        }
    }

    pub async fn show_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = true;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }
}

impl Default for AppModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tunelist-model-{}-{}.json", name, std::process::id()))
    }

    fn test_model(name: &str) -> AppModel {
        let favorites_path = temp_path(&format!("{name}-favorites"));
        let durations_path = temp_path(&format!("{name}-durations"));
        let _ = std::fs::remove_file(&favorites_path);
        let _ = std::fs::remove_file(&durations_path);
        AppModel {
            favorites: FavoriteStore::at(favorites_path),
            durations: DurationCache::at(durations_path),
            ..AppModel::new()
        }
    }

    fn catalog() -> Vec<Song> {
        ["Alpha", "Beta", "Gamma"]
            .iter()
            .enumerate()
            .map(|(i, title)| Song {
                title: title.to_string(),
                artist: "Artist".to_string(),
                url: format!("{i}.mp3"),
            })
            .collect()
    }

    #[tokio::test]
    async fn play_commits_state_and_returns_the_song() {
        let model = test_model("play");
        model.set_catalog(catalog()).await;

        let song = model.record_play(1).await.expect("index 1 is in view");
        assert_eq!(song.title, "Beta");
        assert_eq!(model.playback.lock().await.current(), Some(1));
        assert_eq!(model.now_playing_url().await.as_deref(), Some("1.mp3"));
        assert!(model.is_playing().await);
    }

    #[tokio::test]
    async fn out_of_range_play_is_ignored() {
        let model = test_model("out-of-range");
        model.set_catalog(catalog()).await;

        assert!(model.record_play(7).await.is_none());
        assert_eq!(model.playback.lock().await.current(), None);
    }

    #[tokio::test]
    async fn every_view_rebuild_drops_the_position() {
        let model = test_model("rebuild");
        model.set_catalog(catalog()).await;

        model.record_play(1).await.unwrap();
        model.append_to_search('a').await;
        assert_eq!(model.playback.lock().await.current(), None);

        model.record_play(0).await.unwrap();
        model.clear_search().await;
        assert_eq!(model.playback.lock().await.current(), None);

        model.record_play(2).await.unwrap();
        model.set_tab(Tab::Favorites).await;
        assert_eq!(model.playback.lock().await.current(), None);
    }

    #[tokio::test]
    async fn favorites_tab_reflects_toggles_immediately() {
        let model = test_model("favorites-tab");
        model.set_catalog(catalog()).await;

        model.toggle_favorite("1.mp3").await;
        model.set_tab(Tab::Favorites).await;
        let view = model.get_view_state().await;
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].title, "Beta");

        // Unfavoriting while the favorites view is showing removes the row.
        model.toggle_favorite("1.mp3").await;
        let view = model.get_view_state().await;
        assert!(view.rows.is_empty());
    }

    #[tokio::test]
    async fn sequential_repeat_all_walks_past_the_end() {
        let model = test_model("walk");
        model.set_catalog(catalog()).await;
        model.set_repeat(RepeatState::All).await;

        model.record_play(2).await.unwrap();
        let first = model.next_transition().await;
        assert_eq!(first, Transition::Play { index: 0, record: true });
        model.record_play(0).await.unwrap();
        let second = model.next_transition().await;
        assert_eq!(second, Transition::Play { index: 1, record: true });
    }

    #[tokio::test]
    async fn transports_are_noops_on_an_empty_catalog() {
        let model = test_model("empty");
        assert_eq!(model.next_transition().await, Transition::None);
        assert_eq!(model.previous_transition().await, Transition::None);
        assert!(model.record_play(0).await.is_none());
    }

    #[tokio::test]
    async fn discovered_durations_reach_the_rendered_rows() {
        let model = test_model("durations");
        model.set_catalog(catalog()).await;

        model.set_duration("0.mp3", 65_000).await;
        let view = model.get_view_state().await;
        assert_eq!(view.rows[0].duration.as_deref(), Some("1:05"));
        assert_eq!(view.rows[1].duration, None);

        let pending = model.songs_missing_duration().await;
        assert_eq!(pending.len(), 2);
    }
}
