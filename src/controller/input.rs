//! Key event handling.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use super::AppController;

const SEEK_STEP_SECS: i64 = 10;

impl AppController {
    /// Dispatch a key press. Error banners and the help popup take
    /// precedence over playback bindings so a stray key dismisses them
    /// instead of triggering an action underneath.
    pub async fn handle_key_event(&self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.model.has_error().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.model.clear_error().await;
            }
            return;
        }

        if self.model.is_help_popup_open().await {
            self.model.toggle_help_popup().await;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit().await,
            KeyCode::Char(' ') => self.toggle_pause().await,
            KeyCode::Char('n') => self.next_song().await,
            KeyCode::Char('b') => self.previous_song().await,
            KeyCode::Char('s') => self.shuffle_queue().await,
            KeyCode::Char('r') => self.cycle_repeat().await,
            KeyCode::Char('d') => self.remove_last_queued().await,
            KeyCode::Right => self.seek_by(SEEK_STEP_SECS).await,
            KeyCode::Left => self.seek_by(-SEEK_STEP_SECS).await,
            KeyCode::Char('h') | KeyCode::Char('?') => self.model.toggle_help_popup().await,
            _ => {}
        }
    }
}
