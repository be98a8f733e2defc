//! Reply record in an annotation's thread.

use super::annotation::AnnotationId;
use super::{now_epoch_ms, PrincipalId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a reply.
pub type ReplyId = Uuid;

/// A threaded response to one annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: ReplyId,
    pub annotation_id: AnnotationId,
    pub author_id: PrincipalId,
    pub author_display_name: String,
    pub content: String,
    pub votes: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Reply {
    /// Creates a fresh reply with a generated id and zero votes.
    pub fn new(
        annotation_id: AnnotationId,
        author_id: PrincipalId,
        author_display_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            annotation_id,
            author_id,
            author_display_name: author_display_name.into(),
            content: content.into(),
            votes: 0,
            created_at: now_epoch_ms(),
        }
    }
}
