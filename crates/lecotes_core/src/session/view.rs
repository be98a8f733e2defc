//! Read models handed to the UI shell.

use crate::model::annotation::Annotation;
use crate::model::reply::Reply;
use crate::policy::AvailableActions;
use serde::{Deserialize, Serialize};

/// One annotation with its quote, thread and action flags for a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationView {
    pub annotation: Annotation,
    /// Substring of the text covered by the annotation range.
    pub quote: String,
    pub actions: AvailableActions,
    /// Sorted by votes descending, ties in creation order.
    pub replies: Vec<ReplyView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyView {
    pub reply: Reply,
    pub actions: AvailableActions,
}
