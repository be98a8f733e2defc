//! Vote records for annotations and replies.
//!
//! # Invariants
//! - A vote value is exactly `+1` or `-1`.
//! - At most one vote exists per `(voter_id, target)` pair.

use super::annotation::AnnotationId;
use super::reply::ReplyId;
use super::PrincipalId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Direction of a single vote. Serialized as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    /// Signed contribution to a tally.
    pub fn delta(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Raw vote value outside `{-1, +1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidVoteValue(pub i64);

impl Display for InvalidVoteValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "vote value must be +1 or -1, got {}", self.0)
    }
}

impl Error for InvalidVoteValue {}

impl TryFrom<i64> for VoteValue {
    type Error = InvalidVoteValue;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(InvalidVoteValue(other)),
        }
    }
}

impl From<VoteValue> for i64 {
    fn from(value: VoteValue) -> Self {
        value.delta()
    }
}

/// Entity a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VoteTarget {
    Annotation(AnnotationId),
    Reply(ReplyId),
}

impl VoteTarget {
    /// Id of the targeted annotation or reply.
    pub fn id(self) -> Uuid {
        match self {
            Self::Annotation(id) | Self::Reply(id) => id,
        }
    }
}

/// One accepted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: PrincipalId,
    pub target: VoteTarget,
    pub value: VoteValue,
}
