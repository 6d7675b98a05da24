//! Catalog loading and the background duration prober

use super::AppController;

impl AppController {
    /// Fetch the catalog (remote, then local fallback) and hand it to the
    /// model. On success the duration prober is kicked off in the
    /// background.
    pub async fn load_catalog(&self) {
        let model = self.model.lock().await;
        let Some(client) = model.get_catalog_client().await else {
            return;
        };
        drop(model);

        match client.fetch_catalog().await {
            Ok(songs) => {
                let model = self.model.lock().await;
                model.set_catalog(songs).await;
                drop(model);

                let controller = self.clone();
                tokio::spawn(async move {
                    controller.probe_durations().await;
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Catalog load failed");
                let model = self.model.lock().await;
                model.set_error(Self::format_error(&e)).await;
            }
        }
    }

    /// Walk the catalog filling in missing durations. Each discovery is
    /// persisted and shows up on the next render; unreadable tracks are
    /// skipped and retried next session.
    pub(crate) async fn probe_durations(&self) {
        let model = self.model.lock().await;
        let Some(client) = model.get_catalog_client().await else {
            return;
        };
        let pending = model.songs_missing_duration().await;
        drop(model);

        if pending.is_empty() {
            return;
        }
        tracing::debug!(count = pending.len(), "Probing track durations");

        for song in pending {
            let data = match client.fetch_track_bytes(&song.url).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::debug!(url = %song.url, error = %e, "Duration probe fetch failed");
                    continue;
                }
            };

            // Decoding is CPU work; keep it off the runtime threads.
            let duration_ms = tokio::task::spawn_blocking(move || crate::audio::probe_duration(data))
                .await
                .ok()
                .flatten();

            match duration_ms {
                Some(ms) => {
                    let model = self.model.lock().await;
                    model.set_duration(&song.url, ms).await;
                }
                None => tracing::debug!(url = %song.url, "Track reports no usable duration"),
            }
        }

        tracing::debug!("Duration probe finished");
    }
}
