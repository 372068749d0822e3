use crate::protocol::ServerMessage;
use crate::state::session::VoteOutcome;
use crate::types::{Poll, PollId, PollResult, VoterId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};

/// Per-voter direct lines, used for private delivery of vote acks.
pub type DirectChannels = Arc<RwLock<HashMap<VoterId, mpsc::UnboundedSender<ServerMessage>>>>;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// Seam between the poll engine and whatever carries its announcements.
/// The engine fires these hooks; implementations decide where messages go.
#[async_trait]
pub trait AnnouncementPublisher: Send + Sync {
    /// A poll opened: announce the ballot to everyone.
    async fn on_publish(&self, poll: &Poll) -> Result<(), PublishError>;

    /// A vote was processed: tell the voter, and only the voter, how it went.
    async fn on_vote_ack(
        &self,
        voter_id: &VoterId,
        poll_id: &PollId,
        outcome: &VoteOutcome,
    ) -> Result<(), PublishError>;

    /// A poll finalized: announce the results to everyone.
    async fn on_finalize(&self, poll: &Poll, result: &PollResult) -> Result<(), PublishError>;
}

/// Publisher backed by the server's channels. Announcements fan out over
/// the broadcast channel, acks go down the voter's direct line.
pub struct ChannelPublisher {
    broadcast: broadcast::Sender<ServerMessage>,
    direct: DirectChannels,
}

impl ChannelPublisher {
    pub fn new(broadcast: broadcast::Sender<ServerMessage>, direct: DirectChannels) -> Self {
        Self { broadcast, direct }
    }
}

#[async_trait]
impl AnnouncementPublisher for ChannelPublisher {
    async fn on_publish(&self, poll: &Poll) -> Result<(), PublishError> {
        // Send fails when nobody is connected, which is fine.
        let _ = self.broadcast.send(ServerMessage::poll_opened(poll));
        Ok(())
    }

    async fn on_vote_ack(
        &self,
        voter_id: &VoterId,
        poll_id: &PollId,
        outcome: &VoteOutcome,
    ) -> Result<(), PublishError> {
        let direct = self.direct.read().await;
        match direct.get(voter_id) {
            Some(tx) => {
                let _ = tx.send(ServerMessage::vote_ack(poll_id, outcome));
            }
            None => {
                tracing::debug!("No direct channel for voter {}, dropping ack", voter_id);
            }
        }
        Ok(())
    }

    async fn on_finalize(&self, poll: &Poll, result: &PollResult) -> Result<(), PublishError> {
        let _ = self
            .broadcast
            .send(ServerMessage::poll_finalized(poll, result));
        Ok(())
    }
}

/// Publisher that records announcements in memory, for tests that need
/// to observe what the engine published and in what order.
#[derive(Default)]
pub struct MemoryPublisher {
    published: tokio::sync::Mutex<Vec<Poll>>,
    acks: tokio::sync::Mutex<Vec<(VoterId, PollId, VoteOutcome)>>,
    finalized: tokio::sync::Mutex<Vec<(Poll, PollResult)>>,
}

impl MemoryPublisher {
    pub async fn published(&self) -> Vec<Poll> {
        self.published.lock().await.clone()
    }

    pub async fn acks(&self) -> Vec<(VoterId, PollId, VoteOutcome)> {
        self.acks.lock().await.clone()
    }

    pub async fn finalized(&self) -> Vec<(Poll, PollResult)> {
        self.finalized.lock().await.clone()
    }
}

#[async_trait]
impl AnnouncementPublisher for MemoryPublisher {
    async fn on_publish(&self, poll: &Poll) -> Result<(), PublishError> {
        self.published.lock().await.push(poll.clone());
        Ok(())
    }

    async fn on_vote_ack(
        &self,
        voter_id: &VoterId,
        poll_id: &PollId,
        outcome: &VoteOutcome,
    ) -> Result<(), PublishError> {
        self.acks
            .lock()
            .await
            .push((voter_id.clone(), poll_id.clone(), outcome.clone()));
        Ok(())
    }

    async fn on_finalize(&self, poll: &Poll, result: &PollResult) -> Result<(), PublishError> {
        self.finalized
            .lock()
            .await
            .push((poll.clone(), result.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Choice, PollStatus};
    use chrono::Utc;

    fn sample_poll() -> Poll {
        Poll {
            id: "01TESTPOLL".to_string(),
            creator_id: "creator".to_string(),
            question: "Which one?".to_string(),
            choices: vec![
                Choice {
                    tag: 1,
                    label: "1\u{fe0f}\u{20e3}".to_string(),
                    text: "Rust".to_string(),
                },
                Choice {
                    tag: 2,
                    label: "2\u{fe0f}\u{20e3}".to_string(),
                    text: "Go".to_string(),
                },
            ],
            created_at: Utc::now(),
            deadline: Utc::now() + chrono::Duration::seconds(60),
            status: PollStatus::Open,
            accent_color: "#a1b2c3".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_fans_out_over_broadcast() {
        let (tx, mut rx) = broadcast::channel(16);
        let publisher = ChannelPublisher::new(tx, DirectChannels::default());

        publisher.on_publish(&sample_poll()).await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, ServerMessage::PollOpened { .. }));
    }

    #[tokio::test]
    async fn test_ack_goes_down_the_direct_line_only() {
        let (broadcast_tx, mut broadcast_rx) = broadcast::channel(16);
        let direct = DirectChannels::default();
        let (direct_tx, mut direct_rx) = mpsc::unbounded_channel();
        direct
            .write()
            .await
            .insert("amara".to_string(), direct_tx);

        let publisher = ChannelPublisher::new(broadcast_tx, direct.clone());
        publisher
            .on_vote_ack(
                &"amara".to_string(),
                &"01TESTPOLL".to_string(),
                &VoteOutcome::AlreadyVoted,
            )
            .await
            .unwrap();

        let msg = direct_rx.recv().await.unwrap();
        assert!(matches!(msg, ServerMessage::VoteAck { .. }));
        assert!(broadcast_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ack_for_unknown_voter_is_dropped() {
        let (tx, _rx) = broadcast::channel(16);
        let publisher = ChannelPublisher::new(tx, DirectChannels::default());

        let outcome = publisher
            .on_vote_ack(
                &"ghost".to_string(),
                &"01TESTPOLL".to_string(),
                &VoteOutcome::PollClosed,
            )
            .await;
        assert!(outcome.is_ok());
    }
}
