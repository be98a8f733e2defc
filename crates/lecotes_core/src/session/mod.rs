//! Per-text annotation working set.
//!
//! # Responsibility
//! - Tie the annotation store, reply store and vote ledgers of one text
//!   together (parent checks, cascade delete).
//! - Render segments and UI views from one consistent state.
//! - Reapply known mutations in memory via `apply`.
//!
//! # Invariants
//! - Deleting an annotation removes its replies and every vote on either.
//! - All reads borrow `&self`; all writes borrow `&mut self`, so a render
//!   never mixes pre- and post-mutation state.
//! - A failed operation leaves the session unchanged.

pub mod intent;
pub mod view;

use crate::model::annotation::{Annotation, AnnotationId};
use crate::model::range::SpanRange;
use crate::model::reply::{Reply, ReplyId};
use crate::model::text::{Text, TextId};
use crate::model::vote::{Vote, VoteTarget, VoteValue};
use crate::model::PrincipalId;
use crate::policy::{AvailableActions, MutationTarget};
use crate::render::{render_segments, Segment};
use crate::store::annotation_store::AnnotationStore;
use crate::store::reply_store::ReplyStore;
use crate::store::{EngineError, EngineResult, EntityKind};
use intent::{MutationIntent, MutationOutcome};
use serde::{Deserialize, Serialize};
use view::{AnnotationView, ReplyView};

/// Full state of one text as exchanged with the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingSet {
    pub text: Text,
    /// Creation order.
    pub annotations: Vec<Annotation>,
    /// Creation order.
    pub replies: Vec<Reply>,
    pub votes: Vec<Vote>,
}

/// Mutable annotation state for one text.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    text: Text,
    annotations: AnnotationStore,
    replies: ReplyStore,
}

impl AnnotationSession {
    /// Starts an empty session for `text`.
    pub fn new(text: Text) -> Self {
        let annotations = AnnotationStore::new(&text);
        let replies = ReplyStore::new(text.owner_id);
        Self {
            text,
            annotations,
            replies,
        }
    }

    /// Accepts a fetched working set.
    ///
    /// Fails with `InvalidRange` when a stored range no longer fits the text,
    /// `NotFound` when a reply/annotation references a missing parent,
    /// `DuplicateId` for repeated ids and `DuplicateVote` for repeated
    /// (target, voter) pairs.
    pub fn from_working_set(working_set: WorkingSet) -> EngineResult<Self> {
        let WorkingSet {
            text,
            annotations,
            replies,
            votes,
        } = working_set;

        let annotations = AnnotationStore::from_parts(&text, annotations, votes.iter().copied())?;
        if let Some(orphan) = replies
            .iter()
            .find(|reply| !annotations.contains(reply.annotation_id))
        {
            return Err(EngineError::not_found(
                EntityKind::Annotation,
                orphan.annotation_id,
            ));
        }
        let replies = ReplyStore::from_parts(text.owner_id, replies, votes)?;

        Ok(Self {
            text,
            annotations,
            replies,
        })
    }

    pub fn text(&self) -> &Text {
        &self.text
    }

    pub fn text_id(&self) -> TextId {
        self.text.id
    }

    pub fn annotation_store(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn reply_store(&self) -> &ReplyStore {
        &self.replies
    }

    /// Validates `[start, end)` against this text and creates an annotation.
    pub fn create_annotation(
        &mut self,
        principal_id: PrincipalId,
        author_display_name: impl Into<String>,
        content: impl Into<String>,
        start: i64,
        end: i64,
    ) -> EngineResult<Annotation> {
        let range = SpanRange::new(start, end, self.text.char_len())?;
        self.annotations.create(
            self.text.id,
            principal_id,
            author_display_name,
            content,
            range,
        )
    }

    pub fn edit_annotation(
        &mut self,
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
        new_content: impl Into<String>,
    ) -> EngineResult<Annotation> {
        self.annotations
            .edit(annotation_id, principal_id, new_content)
    }

    /// Deletes an annotation and cascades to its replies.
    ///
    /// Returns the ids of the removed replies.
    pub fn delete_annotation(
        &mut self,
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
    ) -> EngineResult<Vec<ReplyId>> {
        self.annotations.delete(annotation_id, principal_id)?;
        Ok(self.replies.remove_thread(annotation_id))
    }

    pub fn vote_annotation(
        &mut self,
        annotation_id: AnnotationId,
        voter_id: PrincipalId,
        value: i64,
    ) -> EngineResult<i64> {
        self.annotations.vote(annotation_id, voter_id, value)
    }

    pub fn create_reply(
        &mut self,
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
        author_display_name: impl Into<String>,
        content: impl Into<String>,
    ) -> EngineResult<Reply> {
        let parent = self
            .annotations
            .get(annotation_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Annotation, annotation_id))?;
        self.replies
            .create(parent, principal_id, author_display_name, content)
    }

    pub fn edit_reply(
        &mut self,
        reply_id: ReplyId,
        principal_id: PrincipalId,
        new_content: impl Into<String>,
    ) -> EngineResult<Reply> {
        self.replies.edit(reply_id, principal_id, new_content)
    }

    pub fn delete_reply(&mut self, reply_id: ReplyId, principal_id: PrincipalId) -> EngineResult<()> {
        self.replies.delete(reply_id, principal_id).map(|_| ())
    }

    pub fn vote_reply(
        &mut self,
        reply_id: ReplyId,
        voter_id: PrincipalId,
        value: i64,
    ) -> EngineResult<i64> {
        self.replies.vote(reply_id, voter_id, value)
    }

    /// Annotations ascending by range start, ties in creation order.
    pub fn list_sorted(&self) -> Vec<Annotation> {
        self.annotations.list_sorted(self.text.id)
    }

    /// Replies of one annotation, highest score first.
    pub fn list_replies(&self, annotation_id: AnnotationId) -> Vec<Reply> {
        self.replies.list_for_annotation(annotation_id)
    }

    /// Segments of the current text and annotation state.
    pub fn render(&self) -> Vec<Segment> {
        render_segments(&self.text.content, &self.list_sorted())
    }

    /// Annotation and reply views with action flags for `principal_id`.
    pub fn views_for(&self, principal_id: PrincipalId) -> Vec<AnnotationView> {
        let owner_id = self.text.owner_id;
        self.list_sorted()
            .into_iter()
            .map(|annotation| {
                let target = MutationTarget::for_annotation(&annotation, owner_id);
                let replies = self
                    .list_replies(annotation.id)
                    .into_iter()
                    .map(|reply| {
                        let target = MutationTarget::for_reply(&reply, owner_id);
                        ReplyView {
                            actions: AvailableActions::evaluate(principal_id, &target),
                            reply,
                        }
                    })
                    .collect();
                AnnotationView {
                    quote: annotation.range.slice(&self.text.content).to_string(),
                    actions: AvailableActions::evaluate(principal_id, &target),
                    replies,
                    annotation,
                }
            })
            .collect()
    }

    /// Applies one intent in memory and describes the resulting change.
    pub fn apply(&mut self, intent: &MutationIntent) -> EngineResult<MutationOutcome> {
        match intent {
            MutationIntent::CreateAnnotation {
                text_id,
                principal_id,
                author_display_name,
                content,
                range_start,
                range_end,
            } => {
                if *text_id != self.text.id {
                    return Err(EngineError::not_found(EntityKind::Text, *text_id));
                }
                let annotation = self.create_annotation(
                    *principal_id,
                    author_display_name.as_str(),
                    content.as_str(),
                    *range_start,
                    *range_end,
                )?;
                Ok(MutationOutcome::AnnotationCreated { annotation })
            }
            MutationIntent::EditAnnotation {
                annotation_id,
                principal_id,
                content,
            } => {
                let annotation =
                    self.edit_annotation(*annotation_id, *principal_id, content.as_str())?;
                Ok(MutationOutcome::AnnotationEdited { annotation })
            }
            MutationIntent::DeleteAnnotation {
                annotation_id,
                principal_id,
            } => {
                let removed_reply_ids = self.delete_annotation(*annotation_id, *principal_id)?;
                Ok(MutationOutcome::AnnotationDeleted {
                    annotation_id: *annotation_id,
                    removed_reply_ids,
                })
            }
            MutationIntent::VoteAnnotation {
                annotation_id,
                principal_id,
                value,
            } => {
                let tally = self.vote_annotation(*annotation_id, *principal_id, *value)?;
                Ok(MutationOutcome::AnnotationVoted {
                    vote: accepted_vote(*principal_id, VoteTarget::Annotation(*annotation_id), *value)?,
                    tally,
                })
            }
            MutationIntent::CreateReply {
                annotation_id,
                principal_id,
                author_display_name,
                content,
            } => {
                let reply = self.create_reply(
                    *annotation_id,
                    *principal_id,
                    author_display_name.as_str(),
                    content.as_str(),
                )?;
                Ok(MutationOutcome::ReplyCreated { reply })
            }
            MutationIntent::EditReply {
                reply_id,
                principal_id,
                content,
            } => {
                let reply = self.edit_reply(*reply_id, *principal_id, content.as_str())?;
                Ok(MutationOutcome::ReplyEdited { reply })
            }
            MutationIntent::DeleteReply {
                reply_id,
                principal_id,
            } => {
                self.delete_reply(*reply_id, *principal_id)?;
                Ok(MutationOutcome::ReplyDeleted {
                    reply_id: *reply_id,
                })
            }
            MutationIntent::VoteReply {
                reply_id,
                principal_id,
                value,
            } => {
                let tally = self.vote_reply(*reply_id, *principal_id, *value)?;
                Ok(MutationOutcome::ReplyVoted {
                    vote: accepted_vote(*principal_id, VoteTarget::Reply(*reply_id), *value)?,
                    tally,
                })
            }
        }
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> WorkingSet {
        WorkingSet {
            text: self.text.clone(),
            annotations: self.annotations.iter().cloned().collect(),
            replies: self.replies.iter().cloned().collect(),
            votes: self
                .annotations
                .votes()
                .iter()
                .chain(self.replies.votes().iter())
                .collect(),
        }
    }
}

fn accepted_vote(voter_id: PrincipalId, target: VoteTarget, value: i64) -> EngineResult<Vote> {
    Ok(Vote {
        voter_id,
        target,
        value: VoteValue::try_from(value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::intent::{MutationIntent, MutationOutcome};
    use super::AnnotationSession;
    use crate::model::text::Text;
    use crate::store::ErrorKind;
    use uuid::Uuid;

    fn session() -> AnnotationSession {
        let text = Text::new(Uuid::new_v4(), "Fox", "The quick brown fox", Vec::new())
            .expect("valid text");
        AnnotationSession::new(text)
    }

    #[test]
    fn create_reply_requires_existing_annotation() {
        let mut session = session();
        let err = session
            .create_reply(Uuid::new_v4(), Uuid::new_v4(), "a", "orphan")
            .expect_err("missing parent must fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(session.reply_store().is_empty());
    }

    #[test]
    fn apply_vote_reports_vote_and_tally() {
        let mut session = session();
        let author = Uuid::new_v4();
        let annotation = session
            .create_annotation(author, "a", "quick!", 4, 9)
            .expect("create");

        let outcome = session
            .apply(&MutationIntent::VoteAnnotation {
                annotation_id: annotation.id,
                principal_id: author,
                value: -1,
            })
            .expect("self vote is allowed");
        match outcome {
            MutationOutcome::AnnotationVoted { vote, tally } => {
                assert_eq!(vote.voter_id, author);
                assert_eq!(tally, -1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn apply_rejects_create_for_other_text() {
        let mut session = session();
        let err = session
            .apply(&MutationIntent::CreateAnnotation {
                text_id: Uuid::new_v4(),
                principal_id: Uuid::new_v4(),
                author_display_name: "a".to_string(),
                content: "note".to_string(),
                range_start: 0,
                range_end: 3,
            })
            .expect_err("foreign text must fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
