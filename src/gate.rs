//! Two-factor confirmation guarding the database reset.

pub const REQUIRED_PHRASE: &str = "DELETE DATABASE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseFeedback {
    Neutral,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Default)]
pub struct ConfirmationGate {
    open: bool,
    pub phrase: String,
    pub acknowledged: bool,
}

impl ConfirmationGate {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens the dialog with both inputs reset, whatever a previous session left.
    pub fn open(&mut self) {
        self.open = true;
        self.phrase.clear();
        self.acknowledged = false;
    }

    pub fn dismiss(&mut self) {
        self.open = false;
    }

    pub fn phrase_matches(&self) -> bool {
        self.phrase.trim().to_uppercase() == REQUIRED_PHRASE
    }

    pub fn can_confirm(&self) -> bool {
        self.open && self.phrase_matches() && self.acknowledged
    }

    pub fn feedback(&self) -> PhraseFeedback {
        if self.phrase.trim().is_empty() {
            PhraseFeedback::Neutral
        } else if self.phrase_matches() {
            PhraseFeedback::Valid
        } else {
            PhraseFeedback::Invalid
        }
    }

    /// Closes the dialog and reports whether the destructive action may run.
    /// Does nothing unless the gate is open and confirmed.
    pub fn submit(&mut self) -> bool {
        if !self.can_confirm() {
            return false;
        }
        self.open = false;
        true
    }
}
