//! Interaction state and the reducer that drives it.
//!
//! Every change goes through [`ViewState::apply`]. The reducer never performs I/O;
//! it returns an [`Effect`] telling the event loop what to do next.

use crate::response::{ResponsePayload, ResponseSlots, ResponseView};
use chrono::{DateTime, Local};
use course_studio_shared::{GenerateRequest, Operation};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Input,
    CourseId,
    Doubt,
    UserAnswer,
}

impl Field {
    pub fn title(self, operation: Operation) -> String {
        match self {
            Field::Input => format!("Input for {operation}"),
            Field::CourseId => "Course ID".to_string(),
            Field::Doubt => "Your doubt".to_string(),
            Field::UserAnswer => "Your answers".to_string(),
        }
    }

    /// Fields the form shows for `operation`, in focus order.
    pub fn visible_for(operation: Operation) -> Vec<Field> {
        let mut fields = vec![Field::Input, Field::CourseId];
        if operation.takes_doubt() {
            fields.push(Field::Doubt);
        }
        if operation.takes_user_answer() {
            fields.push(Field::UserAnswer);
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEdit {
    Insert(char),
    Backspace,
    Clear,
}

/// A request that has been handed to the client and not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub seq: u64,
    pub operation: Operation,
    pub request: GenerateRequest,
}

/// One completed submission. Doubt and answers are the values sent, not the
/// contents of the form when the reply came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub seq: u64,
    pub operation: Operation,
    pub user_input: String,
    pub response: ResponsePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doubt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    pub completed_at: DateTime<Local>,
}

/// Largest scroll offsets the last frame could show, in wrapped rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollLimits {
    pub response: usize,
    pub history: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectOperation(Operation),
    NextOperation,
    PreviousOperation,
    Edit(FieldEdit),
    FocusNext,
    FocusPrevious,
    ToggleSidebar,
    ScrollUp(usize),
    ScrollDown(usize),
    /// Moves the history panel towards older entries.
    HistoryScrollUp(usize),
    HistoryScrollDown(usize),
    SetScrollLimits(ScrollLimits),
    SubmitStart,
    SubmitSuccess { seq: u64, payload: ResponsePayload },
    SubmitError { seq: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Send this submission to the backend.
    Dispatch(Submission),
    /// `history[index]` was just appended.
    Appended(usize),
}

#[derive(Debug, Default)]
pub struct ViewState {
    operation: Operation,
    input: String,
    course_id: String,
    doubt: String,
    user_answer: String,
    focus: Option<Field>,
    slots: ResponseSlots,
    history: Vec<ChatEntry>,
    sidebar_open: bool,
    scroll: usize,
    /// Rows above the bottom of the history panel; 0 keeps the newest entry in view.
    history_scroll: usize,
    limits: ScrollLimits,
    /// Operation whose completion filled the slots.
    shown: Option<Operation>,
    latest_seq: u64,
    pending: BTreeMap<u64, Submission>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, action: Action) -> Effect {
        match action {
            Action::SelectOperation(operation) => self.select_operation(operation),
            Action::NextOperation => self.select_operation(self.operation.next()),
            Action::PreviousOperation => self.select_operation(self.operation.previous()),
            Action::Edit(edit) => self.edit(edit),
            Action::FocusNext => self.move_focus(1),
            Action::FocusPrevious => self.move_focus(-1),
            Action::ToggleSidebar => self.sidebar_open = !self.sidebar_open,
            Action::ScrollUp(amount) => self.scroll = self.scroll.saturating_sub(amount),
            Action::ScrollDown(amount) => {
                self.scroll = self.scroll.saturating_add(amount).min(self.limits.response)
            }
            Action::HistoryScrollUp(amount) => {
                self.history_scroll = self
                    .history_scroll
                    .saturating_add(amount)
                    .min(self.limits.history)
            }
            Action::HistoryScrollDown(amount) => {
                self.history_scroll = self.history_scroll.saturating_sub(amount)
            }
            Action::SetScrollLimits(limits) => {
                self.limits = limits;
                self.scroll = self.scroll.min(limits.response);
                self.history_scroll = self.history_scroll.min(limits.history);
            }
            Action::SubmitStart => return Effect::Dispatch(self.submit_start()),
            Action::SubmitSuccess { seq, payload } => return self.complete(seq, payload),
            Action::SubmitError { seq } => {
                return self.complete(seq, ResponsePayload::request_failed())
            }
        }
        Effect::None
    }

    fn select_operation(&mut self, operation: Operation) {
        if operation == self.operation {
            return;
        }
        debug!("Operation changed: {} -> {}", self.operation, operation);
        self.operation = operation;
        self.slots.retain_family(operation.family());
        if self.slots.active().is_none() {
            self.shown = None;
        }
        self.scroll = 0;
        if !Field::visible_for(operation).contains(&self.focused()) {
            self.focus = Some(Field::Input);
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Input => &mut self.input,
            Field::CourseId => &mut self.course_id,
            Field::Doubt => &mut self.doubt,
            Field::UserAnswer => &mut self.user_answer,
        }
    }

    fn edit(&mut self, edit: FieldEdit) {
        let text = self.field_mut(self.focused());
        match edit {
            FieldEdit::Insert(c) => text.push(c),
            FieldEdit::Backspace => {
                text.pop();
            }
            FieldEdit::Clear => text.clear(),
        }
    }

    fn move_focus(&mut self, step: isize) {
        let fields = Field::visible_for(self.operation);
        let current = fields
            .iter()
            .position(|field| *field == self.focused())
            .unwrap_or(0) as isize;
        let len = fields.len() as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.focus = Some(fields[next]);
    }

    fn submit_start(&mut self) -> Submission {
        self.latest_seq += 1;
        let submission = Submission {
            seq: self.latest_seq,
            operation: self.operation,
            request: GenerateRequest::for_operation(
                self.operation,
                self.input.as_str(),
                self.course_id.as_str(),
                self.doubt.as_str(),
                self.user_answer.as_str(),
            ),
        };
        if !self.pending.is_empty() {
            debug!(
                "Submission {} supersedes {} pending request(s)",
                submission.seq,
                self.pending.len()
            );
        }
        self.pending.insert(submission.seq, submission.clone());
        submission
    }

    fn complete(&mut self, seq: u64, payload: ResponsePayload) -> Effect {
        let Some(submission) = self.pending.remove(&seq) else {
            warn!("Ignoring completion for unknown submission {}", seq);
            return Effect::None;
        };

        if seq == self.latest_seq {
            debug!("Submission {} fills the {:?} slot", seq, payload.family());
            self.slots.store(payload.clone());
            self.shown = Some(submission.operation);
            self.scroll = 0;
        } else {
            debug!(
                "Submission {} finished after newer submission {}; recorded in history only",
                seq, self.latest_seq
            );
        }

        let GenerateRequest {
            input,
            doubt,
            user_answer,
            ..
        } = submission.request;
        self.history.push(ChatEntry {
            seq,
            operation: submission.operation,
            user_input: input,
            response: payload,
            doubt,
            user_answer,
            completed_at: Local::now(),
        });
        self.history_scroll = 0;
        Effect::Appended(self.history.len() - 1)
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn focused(&self) -> Field {
        self.focus.unwrap_or(Field::Input)
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Input => &self.input,
            Field::CourseId => &self.course_id,
            Field::Doubt => &self.doubt,
            Field::UserAnswer => &self.user_answer,
        }
    }

    pub fn slots(&self) -> &ResponseSlots {
        &self.slots
    }

    pub fn history(&self) -> &[ChatEntry] {
        &self.history
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn history_scroll(&self) -> usize {
        self.history_scroll
    }

    /// The displayed result and the operation that produced it.
    pub fn active_response(&self) -> Option<(Operation, ResponseView<'_>)> {
        self.slots
            .active()
            .map(|view| (self.shown.unwrap_or(self.operation), view))
    }

    /// True while the most recent submission is unanswered.
    pub fn is_loading(&self) -> bool {
        self.pending.contains_key(&self.latest_seq)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
