use crate::state::session::VoteOutcome;
use crate::types::*;
use crate::window;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreatePoll {
        question: String,
        choices: Vec<String>,
        window: String,
    },
    CastVote {
        poll_id: PollId,
        tag: BallotTag,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        voter_id: VoterId,
        display_name: String,
        server_now: String,
        /// Ballots for every poll currently open
        polls: Vec<PollView>,
    },
    PollOpened {
        poll: PollView,
    },
    /// Sent only to the voter whose vote was processed
    VoteAck {
        poll_id: PollId,
        outcome: AckOutcome,
        note: String,
    },
    PollFinalized {
        poll_id: PollId,
        question: String,
        results: ResultsView,
    },
    Error {
        code: String,
        msg: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AckOutcome {
    Counted,
    AlreadyVoted,
    PollClosed,
    UnknownChoice,
}

/// A choice as shown on the ballot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceView {
    pub tag: BallotTag,
    pub label: String,
    pub text: String,
}

impl From<&Choice> for ChoiceView {
    fn from(c: &Choice) -> Self {
        Self {
            tag: c.tag,
            label: c.label.clone(),
            text: c.text.clone(),
        }
    }
}

/// A poll rendered for display: choices grouped into control rows, plus
/// a footer naming the remaining window. Counts are never included here;
/// they stay private until the poll finalizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollView {
    pub id: PollId,
    pub creator_id: VoterId,
    pub question: String,
    pub rows: Vec<Vec<ChoiceView>>,
    pub status: PollStatus,
    pub deadline: String,
    pub footer: String,
    pub accent_color: String,
}

impl PollView {
    pub fn render(poll: &Poll) -> Self {
        let footer = match poll.status {
            PollStatus::Open => {
                let remaining = (poll.deadline - Utc::now()).to_std().unwrap_or_default();
                format!("This poll ends in {}", window::humanize(remaining))
            }
            _ => "This poll has ended".to_string(),
        };

        Self {
            id: poll.id.clone(),
            creator_id: poll.creator_id.clone(),
            question: poll.question.clone(),
            rows: poll
                .choices
                .chunks(CONTROLS_PER_ROW)
                .map(|row| row.iter().map(ChoiceView::from).collect())
                .collect(),
            status: poll.status,
            deadline: poll.deadline.to_rfc3339(),
            footer,
            accent_color: poll.accent_color.clone(),
        }
    }
}

/// Final results of a poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsView {
    pub counts: HashMap<BallotTag, u32>,
    pub top_count: u32,
    pub winners: Vec<ChoiceView>,
    pub headline: String,
}

impl ResultsView {
    pub fn render(result: &PollResult) -> Self {
        Self {
            counts: result.counts.clone(),
            top_count: result.top_count,
            winners: result.winners.iter().map(ChoiceView::from).collect(),
            headline: headline(result),
        }
    }
}

fn headline(result: &PollResult) -> String {
    if result.no_votes() {
        return "The poll ended but it looks like no one voted! ☹".to_string();
    }

    let names: Vec<&str> = result.winners.iter().map(|c| c.text.as_str()).collect();
    let votes = result.top_count;
    let plural = if votes == 1 { "" } else { "s" };

    if result.is_tie() {
        format!(
            "**{}** tied the poll with {} vote{} each.",
            names.join("** & **"),
            votes,
            plural
        )
    } else {
        format!("**{}** won the poll with {} vote{}.", names[0], votes, plural)
    }
}

impl ServerMessage {
    pub fn poll_opened(poll: &Poll) -> Self {
        ServerMessage::PollOpened {
            poll: PollView::render(poll),
        }
    }

    pub fn vote_ack(poll_id: &PollId, outcome: &VoteOutcome) -> Self {
        let (ack, note) = match outcome {
            VoteOutcome::Counted { choice } => (
                AckOutcome::Counted,
                format!(
                    "Your vote for **{}** has been counted. Thanks for your participation!",
                    choice.text
                ),
            ),
            VoteOutcome::AlreadyVoted => (
                AckOutcome::AlreadyVoted,
                "Looks like you've already voted in this poll. You cannot vote more than once!"
                    .to_string(),
            ),
            VoteOutcome::PollClosed => (
                AckOutcome::PollClosed,
                "This poll has already ended.".to_string(),
            ),
            VoteOutcome::UnknownChoice { tag } => (
                AckOutcome::UnknownChoice,
                format!("This poll has no choice {}.", tag),
            ),
        };

        ServerMessage::VoteAck {
            poll_id: poll_id.clone(),
            outcome: ack,
            note,
        }
    }

    pub fn poll_finalized(poll: &Poll, result: &PollResult) -> Self {
        ServerMessage::PollFinalized {
            poll_id: poll.id.clone(),
            question: poll.question.clone(),
            results: ResultsView::render(result),
        }
    }
}
