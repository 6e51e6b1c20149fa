use crate::application::{App, DismissReason};
use crate::domain::WizardState;
use crossterm::event::{KeyCode, KeyModifiers, MouseEvent, MouseEventKind};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if app.show_help {
            Self::handle_help_mode(app, key);
            return;
        }

        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('c') | KeyCode::Char('q') => app.should_quit = true,
                KeyCode::Char('r') => app.restart(),
                KeyCode::Char('b') => app.go_back(),
                KeyCode::Char('d') => {
                    app.notices.dismiss(DismissReason::Explicit);
                }
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::F(1) => {
                app.show_help = true;
                return;
            }
            KeyCode::Esc => {
                app.should_quit = true;
                return;
            }
            _ => {}
        }

        match app.controller.state() {
            WizardState::Step(_) => Self::handle_form_mode(app, key),
            WizardState::Review => Self::handle_review_mode(app, key),
            WizardState::Submitted => {
                if key == KeyCode::Enter {
                    app.restart();
                }
            }
        }
    }

    /// Mouse clicks count as incidental interaction: they never close a
    /// notice.
    pub fn handle_mouse_event(app: &mut App, event: MouseEvent) {
        if let MouseEventKind::Down(_) = event.kind {
            app.notices.dismiss(DismissReason::ClickAway);
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => {
                app.show_help = false;
            }
            _ => {}
        }
    }

    fn handle_form_mode(app: &mut App, key: KeyCode) {
        if app.is_syncing() {
            return;
        }
        match key {
            KeyCode::Enter => app.submit_step(),
            KeyCode::Tab | KeyCode::Down => app.focus_next(),
            KeyCode::BackTab | KeyCode::Up => app.focus_previous(),
            KeyCode::Left => app.move_cursor_left(),
            KeyCode::Right => app.move_cursor_right(),
            KeyCode::Home => app.move_cursor_home(),
            KeyCode::End => app.move_cursor_end(),
            KeyCode::Backspace => app.delete_char_before(),
            KeyCode::Delete => app.delete_char_at(),
            KeyCode::Char(c) => app.insert_char(c),
            _ => {}
        }
    }

    fn handle_review_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char(' ') => app.toggle_confirmed(),
            KeyCode::Enter => app.submit_application(),
            _ => {}
        }
    }
}
