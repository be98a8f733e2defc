//! Mutation intents and their outcomes.
//!
//! An intent is what a caller asks for; an outcome is what the engine
//! actually changed. Persistence adapters record outcomes, never intents.

use crate::model::annotation::{Annotation, AnnotationId};
use crate::model::reply::{Reply, ReplyId};
use crate::model::text::TextId;
use crate::model::vote::Vote;
use crate::model::PrincipalId;
use serde::{Deserialize, Serialize};

/// One requested mutation, carrying the acting principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum MutationIntent {
    CreateAnnotation {
        text_id: TextId,
        principal_id: PrincipalId,
        author_display_name: String,
        content: String,
        range_start: i64,
        range_end: i64,
    },
    EditAnnotation {
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
        content: String,
    },
    DeleteAnnotation {
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
    },
    VoteAnnotation {
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
        value: i64,
    },
    CreateReply {
        annotation_id: AnnotationId,
        principal_id: PrincipalId,
        author_display_name: String,
        content: String,
    },
    EditReply {
        reply_id: ReplyId,
        principal_id: PrincipalId,
        content: String,
    },
    DeleteReply {
        reply_id: ReplyId,
        principal_id: PrincipalId,
    },
    VoteReply {
        reply_id: ReplyId,
        principal_id: PrincipalId,
        value: i64,
    },
}

impl MutationIntent {
    /// Stable name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateAnnotation { .. } => "create_annotation",
            Self::EditAnnotation { .. } => "edit_annotation",
            Self::DeleteAnnotation { .. } => "delete_annotation",
            Self::VoteAnnotation { .. } => "vote_annotation",
            Self::CreateReply { .. } => "create_reply",
            Self::EditReply { .. } => "edit_reply",
            Self::DeleteReply { .. } => "delete_reply",
            Self::VoteReply { .. } => "vote_reply",
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        match self {
            Self::CreateAnnotation { principal_id, .. }
            | Self::EditAnnotation { principal_id, .. }
            | Self::DeleteAnnotation { principal_id, .. }
            | Self::VoteAnnotation { principal_id, .. }
            | Self::CreateReply { principal_id, .. }
            | Self::EditReply { principal_id, .. }
            | Self::DeleteReply { principal_id, .. }
            | Self::VoteReply { principal_id, .. } => *principal_id,
        }
    }
}

/// State change produced by applying one intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    AnnotationCreated {
        annotation: Annotation,
    },
    AnnotationEdited {
        annotation: Annotation,
    },
    AnnotationDeleted {
        annotation_id: AnnotationId,
        removed_reply_ids: Vec<ReplyId>,
    },
    AnnotationVoted {
        vote: Vote,
        tally: i64,
    },
    ReplyCreated {
        reply: Reply,
    },
    ReplyEdited {
        reply: Reply,
    },
    ReplyDeleted {
        reply_id: ReplyId,
    },
    ReplyVoted {
        vote: Vote,
        tally: i64,
    },
}
