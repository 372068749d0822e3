use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type PollId = String;
pub type VoterId = String;

/// Ordinal ballot tag correlating an interactive control to a choice (1-based).
pub type BallotTag = u8;

/// Bounds on the number of choices in a single poll.
pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 10;

/// How many interactive controls fit in one row of the published ballot.
pub const CONTROLS_PER_ROW: usize = 5;

/// Keycap labels for ballot tags 1..=10.
pub const BALLOT_LABELS: [&str; MAX_CHOICES] = [
    "1\u{fe0f}\u{20e3}",
    "2\u{fe0f}\u{20e3}",
    "3\u{fe0f}\u{20e3}",
    "4\u{fe0f}\u{20e3}",
    "5\u{fe0f}\u{20e3}",
    "6\u{fe0f}\u{20e3}",
    "7\u{fe0f}\u{20e3}",
    "8\u{fe0f}\u{20e3}",
    "9\u{fe0f}\u{20e3}",
    "\u{1f51f}",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollStatus {
    /// Accepting votes, window running.
    Open,
    /// Window elapsed, ledger frozen, result not yet announced.
    Closed,
    /// Result computed and announced.
    Finalized,
}

/// One selectable option on a ballot. Immutable once the poll is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Choice {
    pub tag: BallotTag,
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    pub creator_id: VoterId,
    pub question: String,
    pub choices: Vec<Choice>,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub status: PollStatus,
    /// Accent for embed-style rendering, picked once per poll so the results
    /// announcement reuses the same color.
    pub accent_color: String,
}

/// A single accepted vote. At most one per distinct voter per poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter_id: VoterId,
    pub tag: BallotTag,
    pub cast_at: DateTime<Utc>,
}

/// Outcome of resolving a frozen ledger against the choice set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResult {
    /// Votes per ballot tag; tags nobody picked are present with count 0.
    pub counts: HashMap<BallotTag, u32>,
    /// The maximum count over all choices (0 when nobody voted).
    pub top_count: u32,
    /// Every choice holding `top_count` votes, in ballot order.
    /// Empty exactly when no votes were cast.
    pub winners: Vec<Choice>,
}

impl PollResult {
    /// More than one choice shares the maximum count.
    pub fn is_tie(&self) -> bool {
        self.winners.len() > 1
    }

    /// Nobody voted before the window closed.
    pub fn no_votes(&self) -> bool {
        self.top_count == 0
    }
}
