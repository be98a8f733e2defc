//! Annotation record anchored to a span of one text.
//!
//! # Invariants
//! - `range` is fixed at creation; edits only replace `content`.
//! - `votes` equals the sum of accepted vote values for this annotation.

use super::range::SpanRange;
use super::text::TextId;
use super::{now_epoch_ms, PrincipalId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an annotation.
pub type AnnotationId = Uuid;

/// A comment attached to a character span of a text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub text_id: TextId,
    pub author_id: PrincipalId,
    pub author_display_name: String,
    pub content: String,
    pub range: SpanRange,
    /// Running tally of accepted `+1`/`-1` votes.
    pub votes: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Annotation {
    /// Creates a fresh annotation with a generated id and zero votes.
    ///
    /// Callers are expected to have validated `content` and `range`.
    pub fn new(
        text_id: TextId,
        author_id: PrincipalId,
        author_display_name: impl Into<String>,
        content: impl Into<String>,
        range: SpanRange,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text_id,
            author_id,
            author_display_name: author_display_name.into(),
            content: content.into(),
            range,
            votes: 0,
            created_at: now_epoch_ms(),
        }
    }
}
