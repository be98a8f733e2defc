//! Domain model for shared texts and their span annotations.
//!
//! # Responsibility
//! - Define canonical records exchanged between engine, persistence and UI.
//! - Keep every field declared up front; no optional runtime accretion.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Offsets inside a text are counted in `char`s, not bytes.
//! - Timestamps are Unix epoch milliseconds.

pub mod annotation;
pub mod range;
pub mod reply;
pub mod text;
pub mod vote;

use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque identity of the acting user, supplied by the session collaborator.
pub type PrincipalId = Uuid;

/// Returns the current wall-clock time in epoch milliseconds.
///
/// Falls back to `0` when the system clock is before the Unix epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Returns whether user-entered text is blank after trimming.
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
