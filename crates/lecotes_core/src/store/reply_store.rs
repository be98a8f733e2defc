//! Reply threads keyed by parent annotation.
//!
//! # Invariants
//! - Every reply references an annotation that existed when it was created;
//!   `create` takes the parent record itself to make that explicit.
//! - Edit/delete are allowed for the reply author or the text owner.
//! - Thread order: votes descending, ties kept in creation order.

use super::vote_ledger::VoteLedger;
use super::{ensure_unique_ids, EngineError, EngineResult, EntityKind};
use crate::model::annotation::{Annotation, AnnotationId};
use crate::model::is_blank;
use crate::model::reply::{Reply, ReplyId};
use crate::model::vote::{Vote, VoteTarget, VoteValue};
use crate::model::PrincipalId;
use crate::policy::{can_mutate, MutationTarget};

#[derive(Debug, Clone)]
pub struct ReplyStore {
    text_owner_id: PrincipalId,
    entries: Vec<Reply>,
    votes: VoteLedger,
}

impl ReplyStore {
    pub fn new(text_owner_id: PrincipalId) -> Self {
        Self {
            text_owner_id,
            entries: Vec::new(),
            votes: VoteLedger::new(),
        }
    }

    /// Rebuilds a store from fetched replies (in creation order) and votes.
    ///
    /// Same rules as `AnnotationStore::from_parts`: repeated ids and vote
    /// pairs are rejected, tallies follow the vote records when present.
    pub fn from_parts(
        text_owner_id: PrincipalId,
        replies: Vec<Reply>,
        votes: impl IntoIterator<Item = Vote>,
    ) -> EngineResult<Self> {
        ensure_unique_ids(EntityKind::Reply, replies.iter().map(|reply| reply.id))?;
        let mut store = Self::new(text_owner_id);
        store.entries = replies;
        for vote in votes {
            if let VoteTarget::Reply(id) = vote.target {
                if store.contains(id) {
                    store.votes.try_record(vote)?;
                }
            }
        }
        for entry in &mut store.entries {
            let target = VoteTarget::Reply(entry.id);
            if store.votes.count_for(target) > 0 {
                entry.votes = store.votes.tally(target);
            }
        }
        Ok(store)
    }

    /// Appends a reply under `parent` with zero votes.
    pub fn create(
        &mut self,
        parent: &Annotation,
        author_id: PrincipalId,
        author_display_name: impl Into<String>,
        content: impl Into<String>,
    ) -> EngineResult<Reply> {
        let content = content.into();
        if is_blank(&content) {
            return Err(EngineError::EmptySelection);
        }

        let reply = Reply::new(parent.id, author_id, author_display_name, content);
        self.entries.push(reply.clone());
        Ok(reply)
    }

    pub fn edit(
        &mut self,
        reply_id: ReplyId,
        principal_id: PrincipalId,
        new_content: impl Into<String>,
    ) -> EngineResult<Reply> {
        let index = self.authorized_index(reply_id, principal_id)?;
        let new_content = new_content.into();
        if is_blank(&new_content) {
            return Err(EngineError::EmptySelection);
        }

        let entry = &mut self.entries[index];
        entry.content = new_content;
        Ok(entry.clone())
    }

    pub fn delete(&mut self, reply_id: ReplyId, principal_id: PrincipalId) -> EngineResult<Reply> {
        let index = self.authorized_index(reply_id, principal_id)?;
        let removed = self.entries.remove(index);
        self.votes.discard(VoteTarget::Reply(reply_id));
        Ok(removed)
    }

    /// Casts one vote and returns the new tally.
    pub fn vote(&mut self, reply_id: ReplyId, voter_id: PrincipalId, value: i64) -> EngineResult<i64> {
        let index = self.index_of(reply_id)?;
        let value = VoteValue::try_from(value)?;
        let target = VoteTarget::Reply(reply_id);
        self.votes.ensure_can_cast(target, voter_id)?;

        self.votes.record(Vote {
            voter_id,
            target,
            value,
        });
        let entry = &mut self.entries[index];
        entry.votes += value.delta();
        Ok(entry.votes)
    }

    /// Removes every reply of `annotation_id` and their votes.
    ///
    /// Returns the removed reply ids in creation order.
    pub fn remove_thread(&mut self, annotation_id: AnnotationId) -> Vec<ReplyId> {
        let (removed, kept): (Vec<Reply>, Vec<Reply>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.annotation_id == annotation_id);
        self.entries = kept;

        removed
            .into_iter()
            .map(|entry| {
                self.votes.discard(VoteTarget::Reply(entry.id));
                entry.id
            })
            .collect()
    }

    /// Replies of one annotation, highest score first.
    pub fn list_for_annotation(&self, annotation_id: AnnotationId) -> Vec<Reply> {
        let mut thread: Vec<Reply> = self
            .entries
            .iter()
            .filter(|entry| entry.annotation_id == annotation_id)
            .cloned()
            .collect();
        thread.sort_by(|left, right| right.votes.cmp(&left.votes));
        thread
    }

    pub fn get(&self, reply_id: ReplyId) -> Option<&Reply> {
        self.entries.iter().find(|entry| entry.id == reply_id)
    }

    pub fn contains(&self, reply_id: ReplyId) -> bool {
        self.get(reply_id).is_some()
    }

    /// Replies in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Reply> {
        self.entries.iter()
    }

    pub fn votes(&self) -> &VoteLedger {
        &self.votes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn index_of(&self, reply_id: ReplyId) -> EngineResult<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id == reply_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Reply, reply_id))
    }

    fn authorized_index(&self, reply_id: ReplyId, principal_id: PrincipalId) -> EngineResult<usize> {
        let index = self.index_of(reply_id)?;
        let target = MutationTarget::for_reply(&self.entries[index], self.text_owner_id);
        if !can_mutate(principal_id, &target) {
            return Err(EngineError::Forbidden {
                principal_id,
                target_id: reply_id,
            });
        }
        Ok(index)
    }
}
