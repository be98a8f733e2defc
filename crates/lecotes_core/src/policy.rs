//! Authorization policy for annotation and reply mutations.
//!
//! # Responsibility
//! - Decide whether a principal may edit/delete an annotation or reply.
//! - Derive per-entity action visibility for the UI shell.
//!
//! # Invariants
//! - Edit and delete share one rule: author or owner of the owning text.
//! - For replies the owner check uses the *text* owner, not the parent
//!   annotation's author.
//! - Voting is open to every principal, including the author.
//! - All predicates are pure; no ambient "current user".

use crate::model::annotation::Annotation;
use crate::model::reply::Reply;
use crate::model::text::Text;
use crate::model::PrincipalId;
use serde::{Deserialize, Serialize};

/// Ownership facts needed to authorize one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationTarget {
    pub author_id: PrincipalId,
    pub text_owner_id: PrincipalId,
}

impl MutationTarget {
    pub fn for_annotation(annotation: &Annotation, text_owner_id: PrincipalId) -> Self {
        Self {
            author_id: annotation.author_id,
            text_owner_id,
        }
    }

    pub fn for_reply(reply: &Reply, text_owner_id: PrincipalId) -> Self {
        Self {
            author_id: reply.author_id,
            text_owner_id,
        }
    }
}

/// Returns whether `principal_id` may edit or delete `target`.
pub fn can_mutate(principal_id: PrincipalId, target: &MutationTarget) -> bool {
    principal_id == target.author_id || principal_id == target.text_owner_id
}

/// Returns whether `principal_id` may vote on `target`.
///
/// No restriction exists, self-votes included. Duplicate votes are a store
/// concern, not a policy one.
pub fn can_vote(_principal_id: PrincipalId, _target: &MutationTarget) -> bool {
    true
}

/// Returns whether `principal_id` may open `text`: its owner or a principal
/// it was shared with.
pub fn can_view(principal_id: PrincipalId, text: &Text) -> bool {
    principal_id == text.owner_id || text.shared_with.contains(&principal_id)
}

/// Action visibility flags for one annotation or reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableActions {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_vote: bool,
}

impl AvailableActions {
    /// Evaluates every action for `principal_id` against `target`.
    pub fn evaluate(principal_id: PrincipalId, target: &MutationTarget) -> Self {
        let mutable = can_mutate(principal_id, target);
        Self {
            can_edit: mutable,
            can_delete: mutable,
            can_vote: can_vote(principal_id, target),
        }
    }
}
