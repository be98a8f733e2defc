//! One-vote-per-voter ledger.
//!
//! A second vote from the same voter on the same target is rejected; it
//! never replaces the first one.

use super::{EngineError, EngineResult};
use crate::model::vote::{Vote, VoteTarget, VoteValue};
use crate::model::PrincipalId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct VoteLedger {
    entries: BTreeMap<(VoteTarget, PrincipalId), VoteValue>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `DuplicateVote` when `voter_id` already voted on `target`.
    pub fn ensure_can_cast(&self, target: VoteTarget, voter_id: PrincipalId) -> EngineResult<()> {
        if self.entries.contains_key(&(target, voter_id)) {
            return Err(EngineError::DuplicateVote {
                voter_id,
                target_id: target.id(),
            });
        }
        Ok(())
    }

    /// Records a vote after `ensure_can_cast` succeeded.
    pub fn record(&mut self, vote: Vote) {
        self.entries.insert((vote.target, vote.voter_id), vote.value);
    }

    /// Records a vote, failing with `DuplicateVote` instead of overwriting.
    pub fn try_record(&mut self, vote: Vote) -> EngineResult<()> {
        self.ensure_can_cast(vote.target, vote.voter_id)?;
        self.record(vote);
        Ok(())
    }

    /// Drops every vote on `target`; returns how many were removed.
    pub fn discard(&mut self, target: VoteTarget) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(entry_target, _), _| *entry_target != target);
        before - self.entries.len()
    }

    /// Sum of accepted vote values on `target`.
    pub fn tally(&self, target: VoteTarget) -> i64 {
        self.entries
            .iter()
            .filter(|((entry_target, _), _)| *entry_target == target)
            .map(|(_, value)| value.delta())
            .sum()
    }

    /// Number of votes recorded on `target`.
    pub fn count_for(&self, target: VoteTarget) -> usize {
        self.entries
            .keys()
            .filter(|(entry_target, _)| *entry_target == target)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Vote> + '_ {
        self.entries
            .iter()
            .map(|(&(target, voter_id), &value)| Vote {
                voter_id,
                target,
                value,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
