//! Application state for the terminal front end.
//!
//! Holds the text the user is typing for the current step, the notice being
//! shown and the handle of a step sync running in the background. All wizard
//! semantics live in the [`WizardController`]; this type only feeds it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;

use crate::domain::{FieldErrors, RawInput, validate};
use crate::infrastructure::{RecordStore, SessionStore, SyncError};

use super::controller::{PendingSync, SyncOutcome, WizardController};
use super::wizard_error::WizardError;
use super::notice::NoticeBoard;

pub const STEP_SAVED_MESSAGE: &str = "Step data saved successfully!";
pub const SUBMITTED_MESSAGE: &str = "Form submitted successfully!";
pub const LOST_SYNC_MESSAGE: &str = "Lost track of the step being saved. Please submit it again.";

pub type BoxedController = WizardController<Box<dyn SessionStore>>;

/// Main application state for the terminal wizard.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use loan_wizard::application::{App, WizardController};
/// use loan_wizard::domain::StepSequence;
/// use loan_wizard::infrastructure::{HttpRecordStore, MemorySessionStore, SessionStore};
///
/// let steps = StepSequence::loan_application().unwrap();
/// let store: Box<dyn SessionStore> = Box::new(MemorySessionStore::new());
/// let remote = HttpRecordStore::new("http://localhost:3001", Duration::from_secs(5)).unwrap();
/// let app = App::new(WizardController::new(steps, store), Arc::new(remote));
/// assert_eq!(app.focused_field, 0);
/// assert_eq!(app.inputs.len(), 3);
/// ```
pub struct App {
    /// The wizard engine
    pub controller: BoxedController,
    /// One text buffer per field of the current step
    pub inputs: Vec<String>,
    /// Index of the field being edited
    pub focused_field: usize,
    /// Cursor position within the focused buffer, in characters
    pub cursor_position: usize,
    /// Errors from the last validation of the current step
    pub field_errors: FieldErrors,
    /// Transient message shown at the bottom of the screen
    pub notices: NoticeBoard,
    /// Help popup is displayed
    pub show_help: bool,
    /// Set when the user asked to leave
    pub should_quit: bool,
    remote: Arc<dyn RecordStore>,
    pending: Option<Receiver<(PendingSync, SyncOutcome)>>,
}

impl App {
    pub fn new(controller: BoxedController, remote: Arc<dyn RecordStore>) -> Self {
        let mut app = Self {
            controller,
            inputs: Vec::new(),
            focused_field: 0,
            cursor_position: 0,
            field_errors: FieldErrors::new(),
            notices: NoticeBoard::new(),
            show_help: false,
            should_quit: false,
            remote,
            pending: None,
        };
        app.load_step_inputs();
        app
    }

    /// Fills the input buffers for the current step from the data collected
    /// so far, so going back shows what was entered before.
    pub fn load_step_inputs(&mut self) {
        self.inputs = match self.controller.current_contract() {
            Some(contract) => contract
                .fields
                .iter()
                .map(|rule| {
                    self.controller
                        .session()
                        .data()
                        .get(rule.name)
                        .map(|value| value.to_input_string())
                        .unwrap_or_default()
                })
                .collect(),
            None => Vec::new(),
        };
        self.field_errors = FieldErrors::new();
        self.focus_field(0);
    }

    /// Whether a step is being saved to the record store.
    pub fn is_syncing(&self) -> bool {
        self.pending.is_some()
    }

    /// Raw input of the current step keyed by field name.
    pub fn raw_input(&self) -> RawInput {
        match self.controller.current_contract() {
            Some(contract) => contract
                .fields
                .iter()
                .zip(&self.inputs)
                .map(|(rule, value)| (rule.name.to_string(), value.clone()))
                .collect(),
            None => RawInput::new(),
        }
    }

    pub fn focus_field(&mut self, index: usize) {
        if self.inputs.is_empty() {
            self.focused_field = 0;
            self.cursor_position = 0;
            return;
        }
        self.focused_field = index.min(self.inputs.len() - 1);
        self.cursor_position = self.inputs[self.focused_field].chars().count();
    }

    pub fn focus_next(&mut self) {
        if !self.inputs.is_empty() {
            self.focus_field((self.focused_field + 1) % self.inputs.len());
        }
    }

    pub fn focus_previous(&mut self) {
        if !self.inputs.is_empty() {
            let len = self.inputs.len();
            self.focus_field((self.focused_field + len - 1) % len);
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor_position;
        if let Some(input) = self.inputs.get_mut(self.focused_field) {
            let at = byte_index(input, cursor);
            input.insert(at, c);
            self.cursor_position += 1;
        }
    }

    pub fn delete_char_before(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let cursor = self.cursor_position;
        if let Some(input) = self.inputs.get_mut(self.focused_field) {
            let at = byte_index(input, cursor - 1);
            input.remove(at);
            self.cursor_position -= 1;
        }
    }

    pub fn delete_char_at(&mut self) {
        let cursor = self.cursor_position;
        if let Some(input) = self.inputs.get_mut(self.focused_field) {
            if cursor < input.chars().count() {
                let at = byte_index(input, cursor);
                input.remove(at);
            }
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let len = self.focused_len();
        if self.cursor_position < len {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.focused_len();
    }

    fn focused_len(&self) -> usize {
        self.inputs
            .get(self.focused_field)
            .map(|input| input.chars().count())
            .unwrap_or(0)
    }

    /// Validates the current step and, if it passes, starts saving it.
    ///
    /// Validation errors are kept in `field_errors` and focus moves to the
    /// first broken field. Nothing is sent to the record store in that case.
    pub fn submit_step(&mut self) {
        if self.is_syncing() {
            self.notices.error(WizardError::Busy.to_string());
            return;
        }
        let Some(contract) = self.controller.current_contract() else {
            return;
        };
        let validated = match validate(contract, &self.raw_input()) {
            Ok(validated) => validated,
            Err(errors) => {
                let first = errors
                    .fields()
                    .next()
                    .and_then(|field| contract.fields.iter().position(|rule| rule.name == field));
                self.notices.error(WizardError::Validation(errors.clone()).to_string());
                self.field_errors = errors;
                if let Some(index) = first {
                    self.focus_field(index);
                }
                return;
            }
        };
        self.field_errors = FieldErrors::new();

        match self.controller.begin_advance(validated) {
            Ok(pending) => self.spawn_sync(pending),
            Err(e) => self.notices.error(e.to_string()),
        }
    }

    fn spawn_sync(&mut self, pending: PendingSync) {
        let remote = Arc::clone(&self.remote);
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| pending.execute(remote.as_ref())))
                .unwrap_or_else(|_| Err(SyncError::Network("sync worker stopped unexpectedly".to_string())));
            // The receiver is gone when the session was restarted meanwhile.
            let _ = tx.send((pending, outcome));
        });
        self.pending = Some(rx);
    }

    /// Applies a finished background sync, if there is one.
    ///
    /// # Returns
    ///
    /// `true` if a result was applied
    pub fn poll_sync(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        match rx.try_recv() {
            Ok((pending, outcome)) => {
                self.pending = None;
                match self.controller.finish_advance(pending, outcome) {
                    Ok(_) => {
                        self.notices.success(STEP_SAVED_MESSAGE);
                        self.load_step_inputs();
                    }
                    Err(WizardError::Stale) => {}
                    Err(e) => self.notices.error(e.to_string()),
                }
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.controller.abandon_advance();
                tracing::error!("step sync worker vanished without a result");
                self.notices.error(LOST_SYNC_MESSAGE);
                true
            }
        }
    }

    pub fn go_back(&mut self) {
        match self.controller.go_back() {
            Ok(_) => self.load_step_inputs(),
            Err(e) => self.notices.error(e.to_string()),
        }
    }

    pub fn toggle_confirmed(&mut self) {
        let confirmed = !self.controller.session().confirmed();
        if let Err(e) = self.controller.set_confirmed(confirmed) {
            self.notices.error(e.to_string());
        }
    }

    pub fn submit_application(&mut self) {
        match self.controller.confirm_and_submit() {
            Ok(()) => self.notices.success(SUBMITTED_MESSAGE),
            Err(e) => self.notices.error(e.to_string()),
        }
    }

    /// Starts over from the first step. A step still being saved is
    /// abandoned and its result ignored.
    pub fn restart(&mut self) {
        self.pending = None;
        self.controller.reset();
        self.load_step_inputs();
    }

    pub fn tick(&mut self, now: Instant) {
        self.notices.tick(now);
    }
}

fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices().nth(char_index).map(|(i, _)| i).unwrap_or(s.len())
}
