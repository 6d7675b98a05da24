//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the
//! application. It is organized into submodules by responsibility:
//!
//! - `types`: Core type definitions (songs, enums, UI state)
//! - `store`: The song catalog and its active filtered view
//! - `playback`: The transport state machine and now-playing bookkeeping
//! - `favorites`: Persisted favorite set
//! - `durations`: Persisted duration cache
//! - `catalog_client`: HTTP client for the catalog and track payloads
//! - `app_model`: Main application model with state management methods

mod app_model;
mod catalog_client;
mod durations;
mod favorites;
mod playback;
mod store;
mod types;

// Re-export all public types for convenient access
pub use types::{ActiveSection, RepeatState, Song, Tab, UiState};

pub use playback::{PlaybackInfo, Transition};

pub use store::{SongRow, ViewState};

pub use durations::format_duration;

pub use catalog_client::CatalogClient;

pub use app_model::AppModel;
