//! Playlist area rendering

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Padding, Paragraph},
};

use crate::model::{ActiveSection, Tab, UiState, ViewState};

use super::utils::{render_scrollable_list, truncate_string};

pub fn render_playlist(frame: &mut Frame, area: Rect, ui_state: &UiState, view_state: &ViewState) {
    let focused = ui_state.active_section == ActiveSection::Playlist;
    let border_style = if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let title = if view_state.searching {
        format!(" Results ({}) ", view_state.rows.len())
    } else {
        match view_state.tab {
            Tab::All => format!(" Playlist ({}) ", view_state.rows.len()),
            Tab::Favorites => format!(" Favorites ({}) ", view_state.rows.len()),
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding::horizontal(1))
        .border_style(border_style);

    if view_state.rows.is_empty() {
        let message = empty_message(view_state);
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let num_width = view_state.rows.len().to_string().len();
    let content_width = area.width.saturating_sub(4) as usize;
    // Leading marker + number + heart + duration and their separators
    let fixed_width = 2 + num_width + 3 + 1 + 3 + 5;
    let text_width = content_width.saturating_sub(fixed_width).max(16);

    let items: Vec<ListItem> = view_state
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let marker = if row.playing { "▶" } else { " " };
            let heart = if row.favorite { "♥" } else { " " };
            let duration = row.duration.as_deref().unwrap_or("--:--");
            let text = truncate_string(&format!("{} - {}", row.title, row.artist), text_width);

            let line = format!(
                "{} {:>num_width$}  {}  {}  {:>5}",
                marker,
                i + 1,
                heart,
                text,
                duration,
            );

            let style = if i == view_state.selected && focused {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if i == view_state.selected {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else if row.playing {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(line).style(style)
        })
        .collect();

    render_scrollable_list(frame, area, items, view_state.selected, block);
}

fn empty_message(view_state: &ViewState) -> &'static str {
    if view_state.catalog_len == 0 {
        "Playlist is empty. No songs could be loaded."
    } else if view_state.searching {
        "No songs match your search."
    } else {
        "No favorites yet. Press x on a song to favorite it."
    }
}
