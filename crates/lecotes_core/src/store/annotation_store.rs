//! Annotation store for a single text.
//!
//! # Responsibility
//! - Create, edit, delete and vote on annotations of one text.
//! - Provide the start-ordered listing consumed by the segment renderer.
//!
//! # Invariants
//! - Entries are kept in insertion order; `list_sorted` is a stable sort.
//! - Ranges are validated against the text length on create and load.
//! - Reply cascade is the caller's job (see `AnnotationSession`).

use super::vote_ledger::VoteLedger;
use super::{ensure_unique_ids, EngineError, EngineResult, EntityKind};
use crate::model::annotation::{Annotation, AnnotationId};
use crate::model::is_blank;
use crate::model::range::SpanRange;
use crate::model::text::{Text, TextId};
use crate::model::vote::{Vote, VoteTarget, VoteValue};
use crate::model::PrincipalId;
use crate::policy::{can_mutate, MutationTarget};

#[derive(Debug, Clone)]
pub struct AnnotationStore {
    text_id: TextId,
    text_owner_id: PrincipalId,
    text_len: usize,
    entries: Vec<Annotation>,
    votes: VoteLedger,
}

impl AnnotationStore {
    /// Creates an empty store bound to `text`.
    pub fn new(text: &Text) -> Self {
        Self {
            text_id: text.id,
            text_owner_id: text.owner_id,
            text_len: text.char_len(),
            entries: Vec::new(),
            votes: VoteLedger::new(),
        }
    }

    /// Rebuilds a store from externally fetched state.
    ///
    /// Annotations keep the supplied order as creation order. Repeated
    /// annotation ids or repeated (target, voter) pairs are rejected. A
    /// supplied tally is kept only for annotations without vote records;
    /// otherwise it is recomputed from the records.
    pub fn from_parts(
        text: &Text,
        annotations: Vec<Annotation>,
        votes: impl IntoIterator<Item = Vote>,
    ) -> EngineResult<Self> {
        let mut store = Self::new(text);
        ensure_unique_ids(
            EntityKind::Annotation,
            annotations.iter().map(|annotation| annotation.id),
        )?;
        for annotation in &annotations {
            if annotation.text_id != store.text_id {
                return Err(EngineError::not_found(EntityKind::Text, annotation.text_id));
            }
            annotation.range.validate_within(store.text_len)?;
        }
        store.entries = annotations;
        for vote in votes {
            if let VoteTarget::Annotation(id) = vote.target {
                if store.contains(id) {
                    store.votes.try_record(vote)?;
                }
            }
        }
        for entry in &mut store.entries {
            let target = VoteTarget::Annotation(entry.id);
            if store.votes.count_for(target) > 0 {
                entry.votes = store.votes.tally(target);
            }
        }
        Ok(store)
    }

    pub fn text_id(&self) -> TextId {
        self.text_id
    }

    pub fn text_owner_id(&self) -> PrincipalId {
        self.text_owner_id
    }

    /// Appends a new annotation with zero votes.
    pub fn create(
        &mut self,
        text_id: TextId,
        author_id: PrincipalId,
        author_display_name: impl Into<String>,
        content: impl Into<String>,
        range: SpanRange,
    ) -> EngineResult<Annotation> {
        if text_id != self.text_id {
            return Err(EngineError::not_found(EntityKind::Text, text_id));
        }
        let content = content.into();
        if is_blank(&content) {
            return Err(EngineError::EmptySelection);
        }
        range.validate_within(self.text_len)?;

        let annotation = Annotation::new(text_id, author_id, author_display_name, content, range);
        self.entries.push(annotation.clone());
        Ok(annotation)
    }

    /// Replaces annotation content. The range is never touched.
    pub fn edit(
        &mut self,
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
        new_content: impl Into<String>,
    ) -> EngineResult<Annotation> {
        let index = self.authorized_index(annotation_id, principal_id)?;
        let new_content = new_content.into();
        if is_blank(&new_content) {
            return Err(EngineError::EmptySelection);
        }

        let entry = &mut self.entries[index];
        entry.content = new_content;
        Ok(entry.clone())
    }

    /// Removes an annotation and its votes, returning the removed record.
    pub fn delete(
        &mut self,
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
    ) -> EngineResult<Annotation> {
        let index = self.authorized_index(annotation_id, principal_id)?;
        let removed = self.entries.remove(index);
        self.votes.discard(VoteTarget::Annotation(annotation_id));
        Ok(removed)
    }

    /// Casts one vote and returns the new tally.
    pub fn vote(
        &mut self,
        annotation_id: AnnotationId,
        voter_id: PrincipalId,
        value: i64,
    ) -> EngineResult<i64> {
        let index = self.index_of(annotation_id)?;
        let value = VoteValue::try_from(value)?;
        let target = VoteTarget::Annotation(annotation_id);
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

    pub fn get(&self, annotation_id: AnnotationId) -> Option<&Annotation> {
        self.entries.iter().find(|entry| entry.id == annotation_id)
    }

    pub fn contains(&self, annotation_id: AnnotationId) -> bool {
        self.get(annotation_id).is_some()
    }

    /// Annotations of `text_id` ascending by `range.start`; equal starts stay
    /// in creation order. Empty for any other text.
    pub fn list_sorted(&self, text_id: TextId) -> Vec<Annotation> {
        if text_id != self.text_id {
            return Vec::new();
        }
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|entry| entry.range.start());
        sorted
    }

    /// Annotations in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
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

    fn index_of(&self, annotation_id: AnnotationId) -> EngineResult<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id == annotation_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Annotation, annotation_id))
    }

    fn authorized_index(
        &self,
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
    ) -> EngineResult<usize> {
        let index = self.index_of(annotation_id)?;
        let target = MutationTarget::for_annotation(&self.entries[index], self.text_owner_id);
        if !can_mutate(principal_id, &target) {
            return Err(EngineError::Forbidden {
                principal_id,
                target_id: annotation_id,
            });
        }
        Ok(index)
    }
}
