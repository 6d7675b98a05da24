//! Core type definitions for the application

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// A single catalog entry. The `url` doubles as the song's identity across
/// the app: favorites, the duration cache, and now-playing comparisons all
/// key on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub url: String,
}

/// Which section of the UI is currently active/focused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSection {
    Search,
    Playlist,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::Playlist,
            ActiveSection::Playlist => ActiveSection::Search,
        }
    }
}

/// Catalog tab selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    All,
    Favorites,
}

/// Repeat mode state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RepeatState {
    #[default]
    Off,
    All,
    One,
}

/// UI state for the application
#[derive(Clone)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub search_query: String,
    pub tab: Tab,
    pub selected: usize,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_section: ActiveSection::Playlist,
            search_query: String::new(),
            tab: Tab::All,
            selected: 0,
            error_message: None,
            error_timestamp: None,
            show_help_popup: false,
        }
    }
}
