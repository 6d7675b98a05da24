//! Progress bar rendering

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
};

use crate::model::{PlaybackInfo, RepeatState, format_duration};

pub fn render_progress_bar(frame: &mut Frame, area: Rect, playback: &PlaybackInfo) {
    let status_text = match &playback.track {
        None => " No track playing".to_string(),
        Some(track) if playback.is_playing => {
            format!(" ▶ {} | {}", track.title, track.artist)
        }
        Some(track) => format!(" ⏸ {} | {}", track.title, track.artist),
    };

    let shuffle_text = if playback.shuffle { "Shuffle: On" } else { "Shuffle: Off" };
    let repeat_text = match playback.repeat {
        RepeatState::Off => "Repeat: Off",
        RepeatState::All => "Repeat: All",
        RepeatState::One => "Repeat: One",
    };
    let volume_text = format!("Vol: {}%", playback.volume);

    let time_str = match playback.duration_ms {
        Some(duration) => format!(
            "{} / {}",
            format_duration(playback.position_ms),
            format_duration(duration)
        ),
        None => format!("{} / --:--", format_duration(playback.position_ms)),
    };

    let progress_ratio = match playback.duration_ms {
        Some(duration) if duration > 0 => {
            (playback.position_ms as f64 / duration as f64).clamp(0.0, 1.0)
        }
        _ => 0.0,
    };

    let title = format!("{} ", status_text);
    let controls_info = format!(" {} | {} | {} ", shuffle_text, repeat_text, volume_text);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
