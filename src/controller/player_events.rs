//! Player event listener for the audio backend

use crate::audio::{PlayerEvent, PlayerEventChannel};

use super::AppController;

impl AppController {
    pub(crate) fn start_player_event_listener(&self, mut event_channel: PlayerEventChannel) {
        let model = self.model.clone();
        let controller = self.clone();
        tracing::info!("Starting audio event listener");

        tokio::spawn(async move {
            while let Some(event) = event_channel.recv().await {
                let model_guard = model.lock().await;

                if model_guard.should_quit().await {
                    tracing::debug!("Audio event listener shutting down");
                    break;
                }

                match event {
                    PlayerEvent::TrackLoaded { url, duration_ms } => {
                        tracing::debug!(url = %url, ?duration_ms, "PlayerEvent::TrackLoaded");
                        if let Some(ms) = duration_ms {
                            model_guard.set_duration(&url, ms).await;
                        }
                        model_guard.update_playback_position(0, true).await;
                    }
                    PlayerEvent::Playing { position_ms } => {
                        tracing::trace!(position_ms, "PlayerEvent::Playing");
                        model_guard.update_playback_position(position_ms, true).await;
                    }
                    PlayerEvent::Paused { position_ms } => {
                        tracing::debug!(position_ms, "PlayerEvent::Paused");
                        model_guard.update_playback_position(position_ms, false).await;
                    }
                    PlayerEvent::Seeked { position_ms } => {
                        tracing::debug!(position_ms, "PlayerEvent::Seeked");
                        let is_playing = model_guard.is_playing().await;
                        model_guard
                            .update_playback_position(position_ms, is_playing)
                            .await;
                    }
                    PlayerEvent::PositionChanged { position_ms } => {
                        tracing::trace!(position_ms, "PlayerEvent::PositionChanged");
                        model_guard.update_playback_position(position_ms, true).await;
                    }
                    PlayerEvent::LoadFailed { url, message } => {
                        tracing::error!(url = %url, message = %message, "PlayerEvent::LoadFailed");
                        model_guard
                            .set_error("Could not play the track.".to_string())
                            .await;
                        model_guard.set_playing(false).await;
                    }
                    PlayerEvent::EndOfTrack { url } => {
                        tracing::debug!(url = %url, "PlayerEvent::EndOfTrack");
                        // A Load that superseded this track may have raced
                        // the event; advance only for the track we think is
                        // playing.
                        if model_guard.now_playing_url().await.as_deref() != Some(url.as_str()) {
                            tracing::debug!("Stale end-of-track event, ignoring");
                            continue;
                        }
                        model_guard.set_playing(false).await;
                        drop(model_guard);
                        controller.advance("track-ended").await;
                        continue;
                    }
                }
            }
        });
    }
}
