pub mod choices;
pub mod ledger;
pub mod session;
pub mod tally;

use crate::error::CreatePollError;
use crate::protocol::ServerMessage;
use crate::publish::{AnnouncementPublisher, ChannelPublisher, DirectChannels};
use crate::types::*;
use crate::watcher;
use crate::window;
use choices::ChoiceSet;
use session::{PollSession, VoteOutcome};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Live polls by id. Finalized polls are removed once their results
    /// have gone out.
    pub polls: Arc<RwLock<HashMap<PollId, Arc<PollSession>>>>,
    /// Broadcast channel for announcements to all connected clients
    pub broadcast: broadcast::Sender<ServerMessage>,
    /// Per-voter direct lines for private acks
    pub direct: DirectChannels,
    publisher: Arc<dyn AnnouncementPublisher>,
}

impl AppState {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        let direct = DirectChannels::default();
        let publisher = Arc::new(ChannelPublisher::new(tx.clone(), direct.clone()));
        Self {
            polls: Arc::new(RwLock::new(HashMap::new())),
            broadcast: tx,
            direct,
            publisher,
        }
    }

    /// Same state, announcements routed elsewhere.
    pub fn with_publisher(publisher: Arc<dyn AnnouncementPublisher>) -> Self {
        let mut state = Self::new();
        state.publisher = publisher;
        state
    }

    /// Validate, open and announce a new poll, and start its deadline
    /// watcher. The poll accepts votes as soon as this returns.
    pub async fn create_poll(
        &self,
        creator_id: &VoterId,
        question: &str,
        choices: &[String],
        window_text: &str,
    ) -> Result<Poll, CreatePollError> {
        let window = window::parse(window_text)
            .ok_or_else(|| CreatePollError::InvalidWindow(window_text.to_string()))?;
        let span = chrono::Duration::from_std(window)
            .map_err(|_| CreatePollError::InvalidWindow(window_text.to_string()))?;
        let choice_set = ChoiceSet::build(choices)?;

        let session = Arc::new(PollSession::open(creator_id, question, choice_set, span));
        let poll = session.snapshot().await;

        self.polls
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        watcher::spawn_deadline_watcher(self.clone(), session.id.clone(), window);

        tracing::info!(
            "Poll {} opened by {} with {} choices, window {}",
            poll.id,
            creator_id,
            poll.choices.len(),
            window::humanize(window)
        );

        if let Err(e) = self.publisher.on_publish(&poll).await {
            tracing::warn!("Failed to announce poll {}: {}", poll.id, e);
        }

        Ok(poll)
    }

    /// Route a vote to its poll and ack the voter. Votes for unknown
    /// polls ack as closed; the poll most likely finalized moments ago.
    pub async fn submit_vote(
        &self,
        voter_id: &VoterId,
        poll_id: &PollId,
        tag: BallotTag,
    ) -> VoteOutcome {
        let session = self.polls.read().await.get(poll_id).cloned();
        let outcome = match session {
            Some(session) => session.submit_vote(voter_id, tag).await,
            None => VoteOutcome::PollClosed,
        };

        tracing::debug!("Vote by {} on poll {}: {:?}", voter_id, poll_id, outcome);

        if let Err(e) = self.publisher.on_vote_ack(voter_id, poll_id, &outcome).await {
            tracing::warn!("Failed to ack vote by {}: {}", voter_id, e);
        }

        outcome
    }

    /// Close and announce a poll. Exactly one caller performs the
    /// finalization; repeats are no-ops.
    pub async fn finalize_poll(&self, poll_id: &PollId) {
        let session = match self.polls.read().await.get(poll_id).cloned() {
            Some(session) => session,
            None => {
                tracing::debug!("Poll {} is gone, nothing to finalize", poll_id);
                return;
            }
        };

        let result = match session.finalize().await {
            Some(result) => result,
            None => {
                tracing::debug!("Poll {} already finalized", poll_id);
                return;
            }
        };

        let poll = session.snapshot().await;
        tracing::info!(
            "Poll {} finalized: {} votes, {} winner(s)",
            poll_id,
            result.counts.values().sum::<u32>(),
            result.winners.len()
        );

        if let Err(e) = self.publisher.on_finalize(&poll, &result).await {
            tracing::warn!("Failed to announce results of poll {}: {}", poll_id, e);
        }

        // Removed only after the announcement went out; a vote racing the
        // deadline acks as closed rather than unknown.
        self.polls.write().await.remove(poll_id);
    }

    /// Snapshots of every open poll, oldest first.
    pub async fn open_polls(&self) -> Vec<Poll> {
        let sessions: Vec<Arc<PollSession>> =
            self.polls.read().await.values().cloned().collect();

        let mut polls = Vec::new();
        for session in sessions {
            let poll = session.snapshot().await;
            if poll.status == PollStatus::Open {
                polls.push(poll);
            }
        }
        polls.sort_by_key(|p| p.created_at);
        polls
    }

    pub async fn get_poll(&self, poll_id: &PollId) -> Option<Arc<PollSession>> {
        self.polls.read().await.get(poll_id).cloned()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::MemoryPublisher;

    fn two_choices() -> Vec<String> {
        vec!["Rust".to_string(), "Go".to_string()]
    }

    #[tokio::test]
    async fn test_create_poll_opens_and_announces() {
        let publisher = Arc::new(MemoryPublisher::default());
        let state = AppState::with_publisher(publisher.clone());

        let poll = state
            .create_poll(&"amara".to_string(), "Which one?", &two_choices(), "1h")
            .await
            .unwrap();

        assert_eq!(poll.status, PollStatus::Open);
        assert_eq!(poll.choices.len(), 2);
        assert!(state.get_poll(&poll.id).await.is_some());

        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, poll.id);
    }

    #[tokio::test]
    async fn test_create_poll_rejects_bad_windows() {
        let state = AppState::new();
        let result = state
            .create_poll(&"amara".to_string(), "Which one?", &two_choices(), "abc")
            .await;
        assert_eq!(
            result.unwrap_err(),
            CreatePollError::InvalidWindow("abc".to_string())
        );

        let result = state
            .create_poll(&"amara".to_string(), "Which one?", &two_choices(), "0s")
            .await;
        assert_eq!(
            result.unwrap_err(),
            CreatePollError::InvalidWindow("0s".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_poll_rejects_bad_choices() {
        let state = AppState::new();

        let one = vec!["lonely".to_string()];
        let result = state
            .create_poll(&"amara".to_string(), "Which one?", &one, "1h")
            .await;
        assert_eq!(result.unwrap_err(), CreatePollError::InsufficientChoices(1));

        let eleven: Vec<String> = (1..=11).map(|i| format!("choice {}", i)).collect();
        let result = state
            .create_poll(&"amara".to_string(), "Which one?", &eleven, "1h")
            .await;
        assert_eq!(result.unwrap_err(), CreatePollError::TooManyChoices(11));

        assert!(state.polls.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_vote_acks_the_voter_privately() {
        let publisher = Arc::new(MemoryPublisher::default());
        let state = AppState::with_publisher(publisher.clone());
        let poll = state
            .create_poll(&"amara".to_string(), "Which one?", &two_choices(), "1h")
            .await
            .unwrap();

        let outcome = state.submit_vote(&"bruno".to_string(), &poll.id, 1).await;
        assert!(matches!(outcome, VoteOutcome::Counted { .. }));

        let acks = publisher.acks().await;
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].0, "bruno");
        assert_eq!(acks[0].1, poll.id);
    }

    #[tokio::test]
    async fn test_vote_for_unknown_poll_acks_closed() {
        let publisher = Arc::new(MemoryPublisher::default());
        let state = AppState::with_publisher(publisher.clone());

        let outcome = state
            .submit_vote(&"bruno".to_string(), &"nope".to_string(), 1)
            .await;
        assert_eq!(outcome, VoteOutcome::PollClosed);

        let acks = publisher.acks().await;
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].2, VoteOutcome::PollClosed);
    }

    #[tokio::test]
    async fn test_finalize_announces_once_and_drops_the_session() {
        let publisher = Arc::new(MemoryPublisher::default());
        let state = AppState::with_publisher(publisher.clone());
        let poll = state
            .create_poll(&"amara".to_string(), "Which one?", &two_choices(), "1h")
            .await
            .unwrap();

        state.submit_vote(&"bruno".to_string(), &poll.id, 2).await;
        state.finalize_poll(&poll.id).await;
        state.finalize_poll(&poll.id).await;

        let finalized = publisher.finalized().await;
        assert_eq!(finalized.len(), 1);
        let (announced, result) = &finalized[0];
        assert_eq!(announced.id, poll.id);
        assert_eq!(result.winners[0].text, "Go");

        assert!(state.get_poll(&poll.id).await.is_none());
    }

    #[tokio::test]
    async fn test_votes_after_finalize_ack_closed() {
        let publisher = Arc::new(MemoryPublisher::default());
        let state = AppState::with_publisher(publisher.clone());
        let poll = state
            .create_poll(&"amara".to_string(), "Which one?", &two_choices(), "1h")
            .await
            .unwrap();

        state.finalize_poll(&poll.id).await;

        let outcome = state.submit_vote(&"late".to_string(), &poll.id, 1).await;
        assert_eq!(outcome, VoteOutcome::PollClosed);
    }

    #[tokio::test]
    async fn test_open_polls_come_back_oldest_first() {
        let state = AppState::new();
        let first = state
            .create_poll(&"amara".to_string(), "First?", &two_choices(), "1h")
            .await
            .unwrap();
        let second = state
            .create_poll(&"amara".to_string(), "Second?", &two_choices(), "1h")
            .await
            .unwrap();

        let open = state.open_polls().await;
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].id, first.id);
        assert_eq!(open[1].id, second.id);
    }
}
