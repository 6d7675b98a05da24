//! Transport commands: play, next, previous, pause, volume, seek

use std::time::Duration;

use crate::model::{RepeatState, Song, Transition};

use super::AppController;

const SEEK_STEP: Duration = Duration::from_secs(5);
const VOLUME_STEP: u8 = 5;

impl AppController {
    /// Play the track at `index` in the active view. Out-of-range indices
    /// are ignored. The model is committed before the audio command goes
    /// out, so a racing end-of-track event always observes the new state.
    pub async fn play_song(&self, index: usize) {
        let model = self.model.lock().await;
        let Some(song) = model.record_play(index).await else {
            tracing::debug!(index, "Ignoring play for out-of-range index");
            return;
        };
        drop(model);

        tracing::info!(index, title = %song.title, artist = %song.artist, "Playing track");
        self.load_and_play(song).await;
    }

    /// Replay a history entry (shuffle "previous"): moves the current
    /// position without extending the history.
    async fn replay_song(&self, index: usize) {
        let model = self.model.lock().await;
        let Some(song) = model.replay(index).await else {
            return;
        };
        drop(model);

        tracing::info!(index, title = %song.title, "Replaying track from history");
        self.load_and_play(song).await;
    }

    async fn load_and_play(&self, song: Song) {
        let model = self.model.lock().await;
        let Some(client) = model.get_catalog_client().await else {
            return;
        };
        drop(model);

        match client.fetch_track_bytes(&song.url).await {
            Ok(data) => {
                let backend_guard = self.audio_backend.lock().await;
                match backend_guard.as_ref() {
                    Some(backend) => {
                        if let Err(e) = backend.load(song.url.clone(), data) {
                            tracing::error!(url = %song.url, error = %e, "Load command failed");
                            drop(backend_guard);
                            let model = self.model.lock().await;
                            model.set_error(Self::format_error(&e)).await;
                        }
                    }
                    None => {
                        drop(backend_guard);
                        let model = self.model.lock().await;
                        model
                            .set_error("Audio output is still starting up.".to_string())
                            .await;
                    }
                }
            }
            Err(e) => {
                tracing::error!(url = %song.url, error = %e, "Track download failed");
                let model = self.model.lock().await;
                model.set_error(Self::format_error(&e)).await;
                model.set_playing(false).await;
            }
        }
    }

    pub async fn toggle_playback(&self) {
        let model = self.model.lock().await;
        if model.now_playing_url().await.is_none() {
            tracing::debug!("No track loaded, nothing to toggle");
            return;
        }
        let is_playing = model.is_playing().await;
        drop(model);

        let backend_guard = self.audio_backend.lock().await;
        if let Some(backend) = backend_guard.as_ref() {
            let result = if is_playing {
                backend.pause()
            } else {
                backend.play()
            };
            if let Err(e) = result {
                drop(backend_guard);
                let model = self.model.lock().await;
                model.set_error(Self::format_error(&e)).await;
            } else {
                tracing::info!(action = if is_playing { "paused" } else { "resumed" }, "Playback toggled");
            }
        }
    }

    pub async fn next_track(&self) {
        self.advance("next").await;
    }

    pub async fn previous_track(&self) {
        let model = self.model.lock().await;
        let transition = model.previous_transition().await;
        drop(model);

        tracing::debug!(?transition, "Stepping back");
        self.apply_transition(transition).await;
    }

    /// Advance rules shared by the next command and track-ended
    /// auto-advance.
    pub(crate) async fn advance(&self, reason: &'static str) {
        let model = self.model.lock().await;
        let transition = model.next_transition().await;
        drop(model);

        tracing::debug!(reason, ?transition, "Advancing");
        self.apply_transition(transition).await;
    }

    async fn apply_transition(&self, transition: Transition) {
        match transition {
            Transition::Play { index, record: true } => self.play_song(index).await,
            Transition::Play { index, record: false } => self.replay_song(index).await,
            Transition::Restart => {
                let backend_guard = self.audio_backend.lock().await;
                if let Some(backend) = backend_guard.as_ref() {
                    if let Err(e) = backend.restart() {
                        tracing::error!(error = %e, "Restart command failed");
                    }
                }
                drop(backend_guard);
                let model = self.model.lock().await;
                model.update_playback_position(0, true).await;
            }
            Transition::None => {}
        }
    }

    pub async fn toggle_shuffle(&self) {
        let model = self.model.lock().await;
        let shuffle = !model.get_shuffle_state().await;
        model.set_shuffle(shuffle).await;
        tracing::info!(shuffle, "Shuffle toggled");
    }

    pub async fn cycle_repeat(&self) {
        let model = self.model.lock().await;
        let current = model.get_repeat_state().await;
        let next = match current {
            RepeatState::Off => RepeatState::All,
            RepeatState::All => RepeatState::One,
            RepeatState::One => RepeatState::Off,
        };
        model.set_repeat(next).await;
        tracing::info!(mode = ?next, "Repeat mode cycled");
    }

    pub async fn volume_up(&self) {
        let model = self.model.lock().await;
        let volume = (model.get_volume().await + VOLUME_STEP).min(100);
        model.set_volume(volume).await;
        drop(model);
        self.push_volume(volume).await;
    }

    pub async fn volume_down(&self) {
        let model = self.model.lock().await;
        let volume = model.get_volume().await.saturating_sub(VOLUME_STEP);
        model.set_volume(volume).await;
        drop(model);
        self.push_volume(volume).await;
    }

    async fn push_volume(&self, volume: u8) {
        let backend_guard = self.audio_backend.lock().await;
        if let Some(backend) = backend_guard.as_ref() {
            if let Err(e) = backend.set_volume(volume) {
                tracing::warn!(error = %e, "Volume command failed");
            }
        }
    }

    pub async fn seek_forward(&self) {
        self.seek_by(SEEK_STEP.as_millis() as i64).await;
    }

    pub async fn seek_backward(&self) {
        self.seek_by(-(SEEK_STEP.as_millis() as i64)).await;
    }

    async fn seek_by(&self, delta_ms: i64) {
        let model = self.model.lock().await;
        let info = model.get_playback_info().await;
        drop(model);

        if info.track.is_none() {
            return;
        }
        let target = (info.position_ms as i64 + delta_ms).max(0) as u64;
        let target = match info.duration_ms {
            Some(duration) => target.min(duration),
            None => target,
        };

        let backend_guard = self.audio_backend.lock().await;
        if let Some(backend) = backend_guard.as_ref() {
            if let Err(e) = backend.seek(Duration::from_millis(target)) {
                tracing::warn!(error = %e, "Seek command failed");
            }
        }
    }

    pub async fn toggle_favorite(&self, url: &str) {
        let model = self.model.lock().await;
        let favorite = model.toggle_favorite(url).await;
        tracing::info!(url, favorite, "Favorite toggled");
    }
}
