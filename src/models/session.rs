use chrono::{NaiveDate, NaiveDateTime};

use super::Service;

/// Current step of the booking conversation for one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStage {
    Idle,
    AwaitingService,
    AwaitingDate,
    AwaitingTime,
    AwaitingContact,
    AwaitingConfirmation,
}

impl DialogueStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueStage::Idle => "idle",
            DialogueStage::AwaitingService => "awaiting_service",
            DialogueStage::AwaitingDate => "awaiting_date",
            DialogueStage::AwaitingTime => "awaiting_time",
            DialogueStage::AwaitingContact => "awaiting_contact",
            DialogueStage::AwaitingConfirmation => "awaiting_confirmation",
        }
    }
}

/// Booking fields accumulated across stages.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub service: Option<Service>,
    pub date: Option<NaiveDate>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub contact: Option<String>,
}

/// Per-chat dialogue state. Lives only in memory; a restart drops all
/// sessions, which is acceptable.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    pub stage: DialogueStage,
    pub draft: Draft,
}

impl Default for DialogueSession {
    fn default() -> Self {
        Self {
            stage: DialogueStage::Idle,
            draft: Draft::default(),
        }
    }
}

impl DialogueSession {
    /// Unconditionally returns the session to the main menu state.
    pub fn reset(&mut self) {
        self.stage = DialogueStage::Idle;
        self.draft = Draft::default();
    }
}
