//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (truncation, scrollable lists)
//! - `layout`: Top bar (search box and tab selector)
//! - `content`: Playlist area rendering
//! - `progress`: Progress bar rendering
//! - `overlays`: Modal overlays (error, help)

mod content;
mod layout;
mod overlays;
mod progress;
mod utils;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::model::{PlaybackInfo, UiState, ViewState};

pub struct AppView;

impl AppView {
    pub fn render(
        frame: &mut Frame,
        playback: &PlaybackInfo,
        ui_state: &UiState,
        view_state: &ViewState,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar + tabs
                Constraint::Min(0),    // Playlist
                Constraint::Length(3), // Progress bar with playback info
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], ui_state, view_state);

        content::render_playlist(frame, chunks[1], ui_state, view_state);

        progress::render_progress_bar(frame, chunks[2], playback);

        // Error notification overlay (if there's an error)
        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }

        // Help popup overlay (if open)
        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
