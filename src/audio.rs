//! Audio output backend
//!
//! A dedicated thread owns the rodio output stream and sink (the stream
//! handle cannot leave its thread). The rest of the app drives it through a
//! command channel and observes it through a player-event channel.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::{Mutex, mpsc, oneshot};

pub const DEFAULT_VOLUME_PERCENT: u8 = 80;

/// How often the audio thread reports the playback position while waiting
/// for commands.
const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Commands accepted by the audio thread.
#[derive(Debug)]
pub enum AudioCommand {
    /// Replace the current source with a freshly downloaded track body and
    /// start playing it. Supersedes whatever was loaded before.
    Load { url: String, data: Vec<u8> },
    /// Re-decode the retained track body and play it from the top.
    Restart,
    Play,
    Pause,
    Seek { position: Duration },
    SetVolume { percent: u8 },
    Shutdown,
}

/// Events emitted by the audio thread.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A Load was accepted; the duration is present when the container
    /// reports a usable one.
    TrackLoaded {
        url: String,
        duration_ms: Option<u64>,
    },
    Playing {
        position_ms: u64,
    },
    Paused {
        position_ms: u64,
    },
    Seeked {
        position_ms: u64,
    },
    /// Periodic position report while a track is playing.
    PositionChanged {
        position_ms: u64,
    },
    /// A Load arrived with a body the decoder cannot read.
    LoadFailed {
        url: String,
        message: String,
    },
    /// The current track ran out on its own. Carries the url so a stale
    /// event that raced a newer Load can be ignored.
    EndOfTrack {
        url: String,
    },
}

pub type PlayerEventChannel = mpsc::UnboundedReceiver<PlayerEvent>;

pub struct AudioBackend {
    cmd_tx: std_mpsc::Sender<AudioCommand>,
    event_rx: Mutex<Option<PlayerEventChannel>>,
}

impl AudioBackend {
    /// Spawn the audio thread and wait for the output device to open.
    pub async fn new() -> Result<Self> {
        let (cmd_tx, cmd_rx) = std_mpsc::channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (init_tx, init_rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || audio_thread(cmd_rx, event_tx, init_tx))
            .context("spawning audio thread")?;

        init_rx.await.context("audio thread died during init")??;

        Ok(Self {
            cmd_tx,
            event_rx: Mutex::new(Some(event_rx)),
        })
    }

    /// Take the event receiver. Returns None after the first call.
    pub async fn get_player_event_channel(&self) -> Option<PlayerEventChannel> {
        self.event_rx.lock().await.take()
    }

    pub fn load(&self, url: String, data: Vec<u8>) -> Result<()> {
        self.send(AudioCommand::Load { url, data })
    }

    pub fn restart(&self) -> Result<()> {
        self.send(AudioCommand::Restart)
    }

    pub fn play(&self) -> Result<()> {
        self.send(AudioCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(AudioCommand::Pause)
    }

    pub fn seek(&self, position: Duration) -> Result<()> {
        self.send(AudioCommand::Seek { position })
    }

    pub fn set_volume(&self, percent: u8) -> Result<()> {
        self.send(AudioCommand::SetVolume { percent })
    }

    fn send(&self, command: AudioCommand) -> Result<()> {
        self.cmd_tx
            .send(command)
            .map_err(|_| anyhow!("audio thread is gone"))
    }
}

impl Drop for AudioBackend {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
    }
}

/// Decode just enough of a track body to learn its duration. Unknown and
/// zero durations come back as None and must not be cached.
pub fn probe_duration(data: Vec<u8>) -> Option<u64> {
    let source = Decoder::new(Cursor::new(data)).ok()?;
    source
        .total_duration()
        .map(|d| d.as_millis() as u64)
        .filter(|&ms| ms > 0)
}

fn position_ms(sink: &Sink) -> u64 {
    sink.get_pos().as_millis() as u64
}

fn audio_thread(
    cmd_rx: std_mpsc::Receiver<AudioCommand>,
    event_tx: mpsc::UnboundedSender<PlayerEvent>,
    init_tx: oneshot::Sender<Result<()>>,
) {
    let (stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = init_tx.send(Err(anyhow!(e).context("opening default audio output")));
            return;
        }
    };
    let sink = match Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = init_tx.send(Err(anyhow!(e).context("creating audio sink")));
            return;
        }
    };
    // The stream must outlive the sink or the device closes under it.
    let _keep_alive = stream;

    sink.set_volume(f32::from(DEFAULT_VOLUME_PERCENT) / 100.0);
    let _ = init_tx.send(Ok(()));
    tracing::info!("Audio output ready");

    // Retain the current track body so repeat-one can restart it after the
    // source has been fully consumed.
    let mut current: Option<(String, Vec<u8>)> = None;
    let mut ended = false;

    loop {
        match cmd_rx.recv_timeout(TICK_INTERVAL) {
            Ok(AudioCommand::Load { url, data }) => {
                sink.clear();
                match Decoder::new(Cursor::new(data.clone())) {
                    Ok(source) => {
                        let duration_ms = source
                            .total_duration()
                            .map(|d| d.as_millis() as u64)
                            .filter(|&ms| ms > 0);
                        sink.append(source);
                        sink.play();
                        tracing::debug!(url = %url, ?duration_ms, "Track loaded");
                        current = Some((url.clone(), data));
                        ended = false;
                        let _ = event_tx.send(PlayerEvent::TrackLoaded { url, duration_ms });
                    }
                    Err(e) => {
                        tracing::error!(url = %url, error = %e, "Failed to decode track");
                        current = None;
                        let _ = event_tx.send(PlayerEvent::LoadFailed {
                            url,
                            message: e.to_string(),
                        });
                    }
                }
            }
            Ok(AudioCommand::Restart) => {
                if let Some((url, data)) = &current {
                    match Decoder::new(Cursor::new(data.clone())) {
                        Ok(source) => {
                            sink.clear();
                            sink.append(source);
                            sink.play();
                            ended = false;
                            tracing::debug!(url = %url, "Track restarted");
                            let _ = event_tx.send(PlayerEvent::Playing { position_ms: 0 });
                        }
                        Err(e) => {
                            tracing::error!(url = %url, error = %e, "Failed to restart track")
                        }
                    }
                }
            }
            Ok(AudioCommand::Play) => {
                sink.play();
                let _ = event_tx.send(PlayerEvent::Playing {
                    position_ms: position_ms(&sink),
                });
            }
            Ok(AudioCommand::Pause) => {
                sink.pause();
                let _ = event_tx.send(PlayerEvent::Paused {
                    position_ms: position_ms(&sink),
                });
            }
            Ok(AudioCommand::Seek { position }) => match sink.try_seek(position) {
                Ok(()) => {
                    let _ = event_tx.send(PlayerEvent::Seeked {
                        position_ms: position.as_millis() as u64,
                    });
                }
                Err(e) => tracing::warn!(error = %e, "Seek failed"),
            },
            Ok(AudioCommand::SetVolume { percent }) => {
                sink.set_volume(f32::from(percent.min(100)) / 100.0);
            }
            Ok(AudioCommand::Shutdown) | Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            Err(std_mpsc::RecvTimeoutError::Timeout) => {}
        }

        if let Some((url, _)) = &current {
            if sink.empty() {
                if !ended {
                    ended = true;
                    tracing::debug!(url = %url, "Track ended");
                    let _ = event_tx.send(PlayerEvent::EndOfTrack { url: url.clone() });
                }
            } else if !sink.is_paused() {
                let _ = event_tx.send(PlayerEvent::PositionChanged {
                    position_ms: position_ms(&sink),
                });
            }
        }
    }

    tracing::debug!("Audio thread shutting down");
}
