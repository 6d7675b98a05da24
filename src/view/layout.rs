//! Top bar rendering (search box and tab selector)

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::model::{ActiveSection, Tab, UiState, ViewState};

pub fn render_top_bar(frame: &mut Frame, area: Rect, ui_state: &UiState, view_state: &ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Search input
            Constraint::Length(24), // Tab selector
        ])
        .split(area);

    let search_active = ui_state.active_section == ActiveSection::Search;
    let search_style = if search_active {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::White)
    };

    let search_text = if ui_state.search_query.is_empty() {
        "Type to search..."
    } else {
        &ui_state.search_query
    };

    let search = Paragraph::new(search_text).style(search_style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search ")
            .padding(Padding::horizontal(1))
            .border_style(if search_active {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            }),
    );
    frame.render_widget(search, chunks[0]);

    // A live search replaces the tab filter, so neither tab is lit while
    // a query is present.
    let tab_style = |tab: Tab| {
        if view_state.tab == tab && !view_state.searching {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let tabs = Paragraph::new(Line::from(vec![
        Span::styled(" All ", tab_style(Tab::All)),
        Span::raw("│"),
        Span::styled(" Favorites ", tab_style(Tab::Favorites)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" View "));
    frame.render_widget(tabs, chunks[1]);
}
