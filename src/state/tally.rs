use crate::state::choices::ChoiceSet;
use crate::state::ledger::VoteLedger;
use crate::types::{BallotTag, PollResult};
use std::collections::HashMap;

/// Resolve a frozen ledger into counts and winners.
///
/// Every choice appears in the counts, including those nobody picked.
/// Winners are all choices sharing the maximum count, in ballot order;
/// an empty ledger produces no winners at all.
pub fn resolve(choices: &ChoiceSet, ledger: &VoteLedger) -> PollResult {
    let mut counts: HashMap<BallotTag, u32> = choices.iter().map(|c| (c.tag, 0)).collect();

    for record in ledger.records() {
        // Tags are validated when the vote is accepted.
        if let Some(count) = counts.get_mut(&record.tag) {
            *count += 1;
        }
    }

    let top_count = counts.values().copied().max().unwrap_or(0);
    let winners = if top_count == 0 {
        Vec::new()
    } else {
        choices
            .iter()
            .filter(|c| counts[&c.tag] == top_count)
            .cloned()
            .collect()
    };

    PollResult {
        counts,
        top_count,
        winners,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice_set(raw: &[&str]) -> ChoiceSet {
        let texts: Vec<String> = raw.iter().map(|s| s.to_string()).collect();
        ChoiceSet::build(&texts).unwrap()
    }

    fn ledger_with(votes: &[(&str, BallotTag)]) -> VoteLedger {
        let mut ledger = VoteLedger::default();
        for (voter, tag) in votes {
            assert!(ledger.record(&voter.to_string(), *tag));
        }
        ledger
    }

    #[test]
    fn test_single_winner_with_counts_for_everyone() {
        let choices = choice_set(&["Rust", "Go", "Zig"]);
        let ledger = ledger_with(&[("a", 1), ("b", 1), ("c", 2)]);

        let result = resolve(&choices, &ledger);
        assert_eq!(result.counts[&1], 2);
        assert_eq!(result.counts[&2], 1);
        assert_eq!(result.counts[&3], 0);
        assert_eq!(result.top_count, 2);
        assert_eq!(result.winners.len(), 1);
        assert_eq!(result.winners[0].text, "Rust");
        assert!(!result.is_tie());
    }

    #[test]
    fn test_ties_keep_ballot_order() {
        let choices = choice_set(&["Rust", "Go", "Zig"]);
        let ledger = ledger_with(&[("a", 3), ("b", 1), ("c", 3), ("d", 1)]);

        let result = resolve(&choices, &ledger);
        assert_eq!(result.top_count, 2);
        let names: Vec<&str> = result.winners.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(names, vec!["Rust", "Zig"]);
        assert!(result.is_tie());
    }

    #[test]
    fn test_everyone_tied_means_everyone_wins() {
        let choices = choice_set(&["Rust", "Go"]);
        let ledger = ledger_with(&[("a", 1), ("b", 2)]);

        let result = resolve(&choices, &ledger);
        assert_eq!(result.winners.len(), 2);
    }

    #[test]
    fn test_empty_ledger_has_no_winners() {
        let choices = choice_set(&["Rust", "Go"]);
        let result = resolve(&choices, &VoteLedger::default());

        assert_eq!(result.top_count, 0);
        assert!(result.winners.is_empty());
        assert!(result.no_votes());
        assert_eq!(result.counts[&1], 0);
        assert_eq!(result.counts[&2], 0);
    }
}
