//! Core domain logic for Lecotes span annotations.
//! This crate is the single source of truth for annotation invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod policy;
pub mod render;
pub mod repo;
pub mod service;
pub mod session;
pub mod store;

pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::annotation::{Annotation, AnnotationId};
pub use model::range::{RangeError, SpanRange};
pub use model::reply::{Reply, ReplyId};
pub use model::text::{Text, TextId, TextValidationError};
pub use model::vote::{InvalidVoteValue, Vote, VoteTarget, VoteValue};
pub use model::PrincipalId;
pub use policy::{can_mutate, can_view, can_vote, AvailableActions, MutationTarget};
pub use render::{render_segments, Segment};
pub use repo::annotation_repo::{
    AnnotationRepository, RepoError, RepoResult, SqliteAnnotationRepository,
};
pub use service::annotation_service::{AnnotationService, AnnotationServiceError, ServiceResult};
pub use session::intent::{MutationIntent, MutationOutcome};
pub use session::view::{AnnotationView, ReplyView};
pub use session::{AnnotationSession, WorkingSet};
pub use store::annotation_store::AnnotationStore;
pub use store::reply_store::ReplyStore;
pub use store::vote_ledger::VoteLedger;
pub use store::{EngineError, EngineResult, EntityKind, ErrorKind};

/// Minimal health-check API for embedding shells.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
