//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{ActiveSection, Tab};

use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = self.model.lock().await;

        // Handle error message first (blocks all other interactions)
        if model.has_error().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    model.clear_error().await;
                    Ok(())
                }
                _ => Ok(()),
            };
        }

        // Handle help popup
        if model.is_help_popup_open().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => {
                    model.hide_help_popup().await;
                    Ok(())
                }
                _ => Ok(()),
            };
        }

        let ui_state = model.get_ui_state().await;

        // Handle search input when in search section
        if ui_state.active_section == ActiveSection::Search {
            match key.code {
                KeyCode::Tab | KeyCode::BackTab => {
                    model.cycle_section().await;
                    return Ok(());
                }
                KeyCode::Enter => {
                    model.set_active_section(ActiveSection::Playlist).await;
                    return Ok(());
                }
                KeyCode::Esc => {
                    model.clear_search().await;
                    return Ok(());
                }
                KeyCode::Backspace => {
                    model.backspace_search().await;
                    return Ok(());
                }
                KeyCode::Char(c) => {
                    // Q still quits even in search mode when Ctrl is pressed
                    if (c == 'q' || c == 'Q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        model.set_should_quit(true).await;
                        return Ok(());
                    }
                    model.append_to_search(c).await;
                    return Ok(());
                }
                _ => {}
            }
        }

        // Handle playlist section navigation
        if ui_state.active_section == ActiveSection::Playlist {
            match key.code {
                KeyCode::Up => {
                    model.move_selection_up().await;
                    return Ok(());
                }
                KeyCode::Down => {
                    model.move_selection_down().await;
                    return Ok(());
                }
                KeyCode::Enter => {
                    let selected = model.selected_index().await;
                    drop(model);
                    self.play_song(selected).await;
                    return Ok(());
                }
                KeyCode::Char('x') | KeyCode::Char('X') => {
                    if let Some(song) = model.selected_song().await {
                        drop(model);
                        self.toggle_favorite(&song.url).await;
                    }
                    return Ok(());
                }
                _ => {}
            }
        }

        // Global keybindings
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                model.cycle_section().await;
            }
            // Play/Pause toggle
            KeyCode::Char(' ') => {
                drop(model);
                self.toggle_playback().await;
            }
            // Next track
            KeyCode::Char('n') | KeyCode::Char('N') => {
                drop(model);
                self.next_track().await;
            }
            // Previous track
            KeyCode::Char('p') | KeyCode::Char('P') => {
                drop(model);
                self.previous_track().await;
            }
            // Toggle shuffle
            KeyCode::Char('s') | KeyCode::Char('S') => {
                drop(model);
                self.toggle_shuffle().await;
            }
            // Cycle repeat mode
            KeyCode::Char('r') | KeyCode::Char('R') => {
                drop(model);
                self.cycle_repeat().await;
            }
            // Volume up
            KeyCode::Char('+') | KeyCode::Char('=') => {
                drop(model);
                self.volume_up().await;
            }
            // Volume down
            KeyCode::Char('-') => {
                drop(model);
                self.volume_down().await;
            }
            // Seek backward / forward
            KeyCode::Char(',') => {
                drop(model);
                self.seek_backward().await;
            }
            KeyCode::Char('.') => {
                drop(model);
                self.seek_forward().await;
            }
            // Tabs
            KeyCode::Char('1') => {
                model.set_tab(Tab::All).await;
            }
            KeyCode::Char('2') => {
                model.set_tab(Tab::Favorites).await;
            }
            // Focus search
            KeyCode::Char('g') | KeyCode::Char('G') => {
                model.set_active_section(ActiveSection::Search).await;
            }
            // Show help popup
            KeyCode::Char('h') | KeyCode::Char('H') => {
                model.show_help_popup().await;
            }
            _ => {}
        }
        Ok(())
    }
}
