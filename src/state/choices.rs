use crate::error::CreatePollError;
use crate::types::{BallotTag, Choice, BALLOT_LABELS, CONTROLS_PER_ROW, MAX_CHOICES, MIN_CHOICES};
use std::collections::HashSet;

/// Validated, ordered set of choices for one poll. Built once at poll
/// creation and never mutated afterwards; ballot tags are the 1-based
/// positions in the order the creator supplied.
#[derive(Debug, Clone)]
pub struct ChoiceSet {
    choices: Vec<Choice>,
}

impl ChoiceSet {
    /// Validate raw choice texts and assign ballot tags and labels.
    ///
    /// Texts are trimmed before any checks. Distinctness is exact match
    /// on the trimmed text.
    pub fn build(inputs: &[String]) -> Result<ChoiceSet, CreatePollError> {
        if inputs.len() < MIN_CHOICES {
            return Err(CreatePollError::InsufficientChoices(inputs.len()));
        }
        if inputs.len() > MAX_CHOICES {
            return Err(CreatePollError::TooManyChoices(inputs.len()));
        }

        let mut seen = HashSet::new();
        let mut choices = Vec::with_capacity(inputs.len());
        for (idx, raw) in inputs.iter().enumerate() {
            let text = raw.trim();
            if text.is_empty() {
                return Err(CreatePollError::EmptyChoice(idx + 1));
            }
            if !seen.insert(text) {
                return Err(CreatePollError::DuplicateChoice(text.to_string()));
            }
            choices.push(Choice {
                tag: (idx + 1) as BallotTag,
                label: BALLOT_LABELS[idx].to_string(),
                text: text.to_string(),
            });
        }

        Ok(ChoiceSet { choices })
    }

    /// Look up a choice by its ballot tag.
    pub fn get(&self, tag: BallotTag) -> Option<&Choice> {
        let idx = (tag as usize).checked_sub(1)?;
        self.choices.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Choice> {
        self.choices.iter()
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Choices grouped into ballot rows of at most `CONTROLS_PER_ROW`.
    pub fn rows(&self) -> Vec<&[Choice]> {
        self.choices.chunks(CONTROLS_PER_ROW).collect()
    }

    pub fn to_vec(&self) -> Vec<Choice> {
        self.choices.clone()
    }
}
