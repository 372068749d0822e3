use crate::types::{MAX_CHOICES, MIN_CHOICES};
use thiserror::Error;

/// Hint appended to creation errors so callers know what a valid request
/// looks like.
pub const USAGE_HINT: &str =
    "A poll needs a question, two to ten distinct choices, and a window such as \"30s\" or \"1h 30m\".";

/// Everything that can go wrong while opening a poll. Rejections happen
/// before any state is created, so these are hard errors rather than
/// vote outcomes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreatePollError {
    #[error("could not read \"{0}\" as a voting window")]
    InvalidWindow(String),
    #[error("got {0} choices, a poll needs at least {min}", min = MIN_CHOICES)]
    InsufficientChoices(usize),
    #[error("got {0} choices, a poll can hold at most {max}", max = MAX_CHOICES)]
    TooManyChoices(usize),
    #[error("choice \"{0}\" appears more than once")]
    DuplicateChoice(String),
    #[error("choice {0} is empty")]
    EmptyChoice(usize),
}

impl CreatePollError {
    /// Stable machine-readable code for the wire protocol.
    pub fn code(&self) -> &'static str {
        match self {
            CreatePollError::InvalidWindow(_) => "INVALID_WINDOW",
            CreatePollError::InsufficientChoices(_) => "TOO_FEW_CHOICES",
            CreatePollError::TooManyChoices(_) => "TOO_MANY_CHOICES",
            CreatePollError::DuplicateChoice(_) => "DUPLICATE_CHOICE",
            CreatePollError::EmptyChoice(_) => "EMPTY_CHOICE",
        }
    }
}
