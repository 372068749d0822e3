use crate::types::{BallotTag, VoteRecord, VoterId};
use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Per-poll vote store keyed by voter, so the one-vote-per-voter rule is
/// a constant-time lookup rather than a scan.
#[derive(Debug, Clone, Default)]
pub struct VoteLedger {
    records: HashMap<VoterId, VoteRecord>,
}

impl VoteLedger {
    /// Record a vote for `voter_id`. Returns false without touching the
    /// ledger when the voter already has a recorded vote; the first vote
    /// stands.
    pub fn record(&mut self, voter_id: &VoterId, tag: BallotTag) -> bool {
        match self.records.entry(voter_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(VoteRecord {
                    voter_id: voter_id.clone(),
                    tag,
                    cast_at: Utc::now(),
                });
                true
            }
        }
    }

    pub fn has_voted(&self, voter_id: &VoterId) -> bool {
        self.records.contains_key(voter_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &VoteRecord> {
        self.records.values()
    }
}
