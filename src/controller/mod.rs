//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! coordinates between the model and view, and manages playback operations.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `playback`: Transport commands (play, next, previous, volume, seek)
//! - `navigation`: Catalog loading and the background duration prober
//! - `player_events`: Audio backend event listener

mod input;
mod navigation;
mod playback;
mod player_events;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::audio::AudioBackend;
use crate::model::AppModel;

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
    pub(crate) audio_backend: Arc<Mutex<Option<AudioBackend>>>,
    event_listener_started: Arc<Mutex<bool>>,
}

impl AppController {
    pub fn new(model: Arc<Mutex<AppModel>>, audio_backend: Arc<Mutex<Option<AudioBackend>>>) -> Self {
        Self {
            model,
            audio_backend,
            event_listener_started: Arc::new(Mutex::new(false)),
        }
    }

    /// Wait for the audio backend to come up, then hook its event stream
    /// and push the model's volume to the sink.
    pub async fn initialize_audio(&self) {
        for _ in 0..50 {
            if self.audio_backend.lock().await.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        self.try_start_event_listener().await;

        let volume = {
            let model = self.model.lock().await;
            model.get_volume().await
        };
        let backend_guard = self.audio_backend.lock().await;
        if let Some(backend) = backend_guard.as_ref() {
            if let Err(e) = backend.set_volume(volume) {
                tracing::warn!(error = %e, "Could not set initial volume");
            }
        } else {
            tracing::warn!("Audio backend not ready after waiting");
        }
    }

    /// Try to start the player event listener if the backend is ready and
    /// it is not already running.
    pub(crate) async fn try_start_event_listener(&self) {
        let mut started = self.event_listener_started.lock().await;
        if *started {
            return;
        }

        let backend_guard = self.audio_backend.lock().await;
        if let Some(backend) = backend_guard.as_ref() {
            if let Some(event_channel) = backend.get_player_event_channel().await {
                *started = true;
                drop(backend_guard);
                drop(started);
                self.start_player_event_listener(event_channel);
            }
        }
    }

    pub(crate) fn format_error(error: &anyhow::Error) -> String {
        let error_str = error.to_string();

        // Map the known failure points to something worth showing on screen
        if error_str.contains("requesting catalog")
            || error_str.contains("catalog request rejected")
            || error_str.contains("decoding catalog JSON")
        {
            "Could not load the playlist. Check your connection.".to_string()
        } else if error_str.contains("decoding fallback catalog JSON")
            || error_str.contains("reading songs.json")
        {
            "Could not load the playlist: no usable local copy either.".to_string()
        } else if error_str.contains("requesting track") || error_str.contains("reading track") {
            "Could not download the track.".to_string()
        } else if error_str.contains("unsupported track url") {
            "This track has no playable source.".to_string()
        } else if error_str.contains("audio thread") {
            "Audio output is not available.".to_string()
        } else {
            format!("Error: {}", error_str)
        }
    }
}
