//! In-memory stores for one text's annotations, replies and votes.
//!
//! # Responsibility
//! - Own the mutable working set of a single text.
//! - Enforce validation, authorization and one-vote-per-voter rules.
//!
//! # Invariants
//! - Every operation validates fully before mutating; a failed call leaves
//!   the store unchanged.
//! - Mutations take `&mut self`, so writers are serialized by ownership.

pub mod annotation_store;
pub mod reply_store;
pub mod vote_ledger;

use crate::model::range::RangeError;
use crate::model::vote::InvalidVoteValue;
use crate::model::PrincipalId;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type EngineResult<T> = Result<T, EngineError>;

/// Entity family referenced by `NotFound` and `DuplicateId` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Text,
    Annotation,
    Reply,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Annotation => "annotation",
            Self::Reply => "reply",
        }
    }
}

/// Coarse error category surfaced to the UI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRange,
    EmptySelection,
    NotFound,
    Forbidden,
    DuplicateVote,
    InvalidVoteValue,
    DuplicateId,
}

/// Recoverable failure of an engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Span failed bounds/ordering validation.
    InvalidRange(RangeError),
    /// Annotation or reply content is blank after trimming.
    EmptySelection,
    /// Target id is absent from the working set.
    NotFound { entity: EntityKind, id: Uuid },
    /// Principal is neither author nor text owner.
    Forbidden {
        principal_id: PrincipalId,
        target_id: Uuid,
    },
    /// Voter already voted on this target.
    DuplicateVote {
        voter_id: PrincipalId,
        target_id: Uuid,
    },
    /// Vote value outside `{-1, +1}`.
    InvalidVoteValue(i64),
    /// A loaded working set repeats an annotation or reply id.
    DuplicateId { entity: EntityKind, id: Uuid },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRange(_) => ErrorKind::InvalidRange,
            Self::EmptySelection => ErrorKind::EmptySelection,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::DuplicateVote { .. } => ErrorKind::DuplicateVote,
            Self::InvalidVoteValue(_) => ErrorKind::InvalidVoteValue,
            Self::DuplicateId { .. } => ErrorKind::DuplicateId,
        }
    }

    pub(crate) fn not_found(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Fails with `DuplicateId` on the first repeated id.
pub(crate) fn ensure_unique_ids(
    entity: EntityKind,
    ids: impl IntoIterator<Item = Uuid>,
) -> EngineResult<()> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(EngineError::DuplicateId { entity, id });
        }
    }
    Ok(())
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange(err) => write!(f, "invalid range: {err}"),
            Self::EmptySelection => write!(f, "content must not be blank"),
            Self::NotFound { entity, id } => write!(f, "{} not found: {id}", entity.as_str()),
            Self::Forbidden {
                principal_id,
                target_id,
            } => write!(f, "principal {principal_id} may not modify {target_id}"),
            Self::DuplicateVote {
                voter_id,
                target_id,
            } => write!(f, "principal {voter_id} already voted on {target_id}"),
            Self::InvalidVoteValue(value) => {
                write!(f, "vote value must be +1 or -1, got {value}")
            }
            Self::DuplicateId { entity, id } => {
                write!(f, "{} id appears more than once: {id}", entity.as_str())
            }
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRange(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RangeError> for EngineError {
    fn from(value: RangeError) -> Self {
        Self::InvalidRange(value)
    }
}

impl From<InvalidVoteValue> for EngineError {
    fn from(value: InvalidVoteValue) -> Self {
        Self::InvalidVoteValue(value.0)
    }
}
