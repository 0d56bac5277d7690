//! Progress bar rendering

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
};

use crate::model::PlaybackView;

use super::utils::format_duration;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, playback: &PlaybackView) {
    let status_text = match &playback.title {
        None => " No song playing".to_string(),
        Some(title) => {
            let icon = if playback.paused { "⏸ " } else { " ▶" };
            match &playback.artist {
                Some(artist) if !artist.is_empty() => format!("{} {} | {}", icon, title, artist),
                _ => format!("{} {}", icon, title),
            }
        }
    };

    let repeat_text = format!("Repeat: {}", playback.repeat.label());

    let duration_ms = playback.duration_secs.unwrap_or(0) as i64 * 1000;
    let time_str = format!(
        "{} / {}",
        format_duration(playback.elapsed_ms),
        format_duration(duration_ms)
    );

    // Live streams report no duration; show an empty bar instead of a full one.
    let progress_ratio = if duration_ms > 0 {
        (playback.elapsed_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let controls_info = format!(" {} | ←/→ seek | space pause ", repeat_text);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status_text))
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
