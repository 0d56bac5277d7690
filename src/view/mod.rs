//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, truncation)
//! - `layout`: Main layout structure (header, queue sidebar, main panel)
//! - `progress`: Progress bar rendering
//! - `overlays`: Modal overlays (error, help)

mod layout;
mod overlays;
mod progress;
mod utils;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::model::ViewSnapshot;

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, snapshot: &ViewSnapshot) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Queue sidebar + now-playing panel
                Constraint::Length(3), // Progress bar
            ])
            .split(frame.area());

        layout::render_header(frame, chunks[0], snapshot);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(35), // Queue sidebar
                Constraint::Percentage(65), // Now playing + history + activity
            ])
            .split(chunks[1]);

        layout::render_queue_sidebar(frame, main_chunks[0], snapshot);
        layout::render_main_panel(frame, main_chunks[1], snapshot);

        progress::render_progress_bar(frame, chunks[2], &snapshot.playback);

        if snapshot.ui.error_message.is_some() {
            overlays::render_error_notification(frame, &snapshot.ui);
        }

        if snapshot.ui.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
