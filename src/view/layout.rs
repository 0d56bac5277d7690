//! Layout rendering (header, queue sidebar, now-playing panel)

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
};

use crate::model::ViewSnapshot;

use super::utils::truncate_string;

pub fn render_header(frame: &mut Frame, area: Rect, snapshot: &ViewSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Title
            Constraint::Length(22), // Queue counter
        ])
        .split(area);

    let title = Paragraph::new(format!(" ymp-rs v{}", env!("CARGO_PKG_VERSION")))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    let counter = Paragraph::new(format!("🎵 {} queued", snapshot.pending_total))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Queue "));
    frame.render_widget(counter, chunks[1]);
}

pub fn render_queue_sidebar(frame: &mut Frame, area: Rect, snapshot: &ViewSnapshot) {
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = snapshot
        .pending
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let style = if i == 0 {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(format!("{:>2}. {}", i + 1, truncate_string(title, width)))
                .style(style)
        })
        .collect();

    let shown = snapshot.pending.len();
    let title = if snapshot.pending_total > shown {
        format!(" Up Next ({} of {}) ", shown, snapshot.pending_total)
    } else {
        " Up Next ".to_string()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(list, area);
}

pub fn render_main_panel(frame: &mut Frame, area: Rect, snapshot: &ViewSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Now playing
            Constraint::Min(0),    // History
            Constraint::Length(8), // Activity log
        ])
        .split(area);

    render_now_playing(frame, chunks[0], snapshot);
    render_history(frame, chunks[1], snapshot);
    render_log(frame, chunks[2], snapshot);
}

fn render_now_playing(frame: &mut Frame, area: Rect, snapshot: &ViewSnapshot) {
    let playback = &snapshot.playback;
    let lines: Vec<Line> = match &playback.title {
        Some(title) => {
            let state = if playback.paused { "⏸ Paused" } else { "▶ Playing" };
            vec![
                Line::from(Span::styled(
                    title.clone(),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    playback.artist.clone().unwrap_or_default(),
                    Style::default().fg(Color::White),
                )),
                Line::from(Span::styled(state, Style::default().fg(Color::Yellow))),
            ]
        }
        None => vec![Line::from(Span::styled(
            "Nothing playing",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Now Playing ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(panel, area);
}

fn render_history(frame: &mut Frame, area: Rect, snapshot: &ViewSnapshot) {
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = snapshot
        .history
        .iter()
        .map(|title| {
            ListItem::new(truncate_string(title, width))
                .style(Style::default().fg(Color::DarkGray))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Recently Played ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(list, area);
}

fn render_log(frame: &mut Frame, area: Rect, snapshot: &ViewSnapshot) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = snapshot
        .ui
        .log_lines
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|line| Line::from(Span::styled(line.clone(), Style::default().fg(Color::White))))
        .collect();

    let log = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(log, area);
}
