use crate::state::choices::ChoiceSet;
use crate::state::ledger::VoteLedger;
use crate::state::tally;
use crate::types::{BallotTag, Choice, Poll, PollId, PollResult, PollStatus, VoterId};
use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::RwLock;
use ulid::Ulid;

/// What happened to a vote submission. Rejections are ordinary outcomes
/// rather than errors: a closed poll or a repeat voter is expected traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was recorded for this choice.
    Counted { choice: Choice },
    /// The voter already has a recorded vote; the first one stands.
    AlreadyVoted,
    /// The poll is not accepting votes (or does not exist).
    PollClosed,
    /// No choice carries this ballot tag.
    UnknownChoice { tag: BallotTag },
}

/// Mutable half of a poll. Status and ledger move together under one
/// lock so no vote can land beside the close transition.
#[derive(Debug)]
struct SessionInner {
    status: PollStatus,
    ledger: VoteLedger,
}

/// A live poll: immutable identity plus the locked status/ledger pair.
#[derive(Debug)]
pub struct PollSession {
    pub id: PollId,
    pub creator_id: VoterId,
    pub question: String,
    choices: ChoiceSet,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub accent_color: String,
    inner: RwLock<SessionInner>,
}

impl PollSession {
    /// Open a new poll. Choices and window are validated by the caller.
    pub fn open(
        creator_id: &VoterId,
        question: &str,
        choices: ChoiceSet,
        span: chrono::Duration,
    ) -> Self {
        let created_at = Utc::now();
        // Absurd windows saturate instead of overflowing.
        let deadline = created_at
            .checked_add_signed(span)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            id: Ulid::new().to_string(),
            creator_id: creator_id.clone(),
            question: question.trim().to_string(),
            choices,
            created_at,
            deadline,
            accent_color: random_accent(),
            inner: RwLock::new(SessionInner {
                status: PollStatus::Open,
                ledger: VoteLedger::default(),
            }),
        }
    }

    /// Submit a vote. Status check, tag lookup and ledger insert happen
    /// under a single write lock.
    pub async fn submit_vote(&self, voter_id: &VoterId, tag: BallotTag) -> VoteOutcome {
        let mut inner = self.inner.write().await;
        if inner.status != PollStatus::Open {
            return VoteOutcome::PollClosed;
        }
        let choice = match self.choices.get(tag) {
            Some(choice) => choice.clone(),
            None => return VoteOutcome::UnknownChoice { tag },
        };
        if inner.ledger.record(voter_id, tag) {
            VoteOutcome::Counted { choice }
        } else {
            VoteOutcome::AlreadyVoted
        }
    }

    /// Close the poll and snapshot the ledger. Only the first caller
    /// gets a snapshot; everyone else finds the poll already closed.
    async fn freeze(&self) -> Option<VoteLedger> {
        let mut inner = self.inner.write().await;
        if inner.status != PollStatus::Open {
            return None;
        }
        inner.status = PollStatus::Closed;
        Some(inner.ledger.clone())
    }

    /// Freeze, resolve and mark the poll finalized. Returns None when a
    /// previous call already did the work.
    pub async fn finalize(&self) -> Option<PollResult> {
        let ledger = self.freeze().await?;
        let result = tally::resolve(&self.choices, &ledger);
        self.inner.write().await.status = PollStatus::Finalized;
        Some(result)
    }

    pub async fn status(&self) -> PollStatus {
        self.inner.read().await.status
    }

    pub fn choices(&self) -> &ChoiceSet {
        &self.choices
    }

    /// Immutable view of the poll for the wire.
    pub async fn snapshot(&self) -> Poll {
        Poll {
            id: self.id.clone(),
            creator_id: self.creator_id.clone(),
            question: self.question.clone(),
            choices: self.choices.to_vec(),
            created_at: self.created_at,
            deadline: self.deadline,
            status: self.status().await,
            accent_color: self.accent_color.clone(),
        }
    }
}

fn random_accent() -> String {
    let mut rng = rand::rng();
    format!("#{:06x}", rng.random_range(0..=0xFFFFFFu32))
}
