//! Annotation use-case service.
//!
//! # Responsibility
//! - Provide text and annotation entry points over a repository.
//! - Implement the full-refresh strategy: every mutation loads a fresh
//!   working set, applies the intent in memory, then records the outcome.
//!
//! # Invariants
//! - All business rules run in `AnnotationSession`; the repository only
//!   persists outcomes the engine accepted.
//! - A rejected intent never reaches the repository.
//! - A vote that loses a race at the storage layer surfaces as
//!   `EngineError::DuplicateVote`, the same as one caught in memory.
//! - Log lines carry ids, kinds and durations only, never user content.

use crate::model::text::{Text, TextId, TextValidationError};
use crate::model::PrincipalId;
use crate::render::Segment;
use crate::repo::annotation_repo::{AnnotationRepository, RepoError};
use crate::session::intent::{MutationIntent, MutationOutcome};
use crate::session::view::AnnotationView;
use crate::session::AnnotationSession;
use crate::store::{EngineError, EntityKind};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, AnnotationServiceError>;

/// Service error for annotation use-cases.
#[derive(Debug)]
pub enum AnnotationServiceError {
    /// Engine rejected the operation (range, auth, vote, not found).
    Engine(EngineError),
    /// Text title/content failed validation.
    InvalidText(TextValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AnnotationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(err) => write!(f, "{err}"),
            Self::InvalidText(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AnnotationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::InvalidText(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<EngineError> for AnnotationServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<TextValidationError> for AnnotationServiceError {
    fn from(value: TextValidationError) -> Self {
        Self::InvalidText(value)
    }
}

impl From<RepoError> for AnnotationServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidText(err),
            RepoError::DuplicateVote {
                voter_id,
                target_id,
            } => Self::Engine(EngineError::DuplicateVote {
                voter_id,
                target_id,
            }),
            other => Self::Repo(other),
        }
    }
}

/// Service facade over an annotation repository.
pub struct AnnotationService<R: AnnotationRepository> {
    repo: R,
}

impl<R: AnnotationRepository> AnnotationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates and stores a text owned by `owner_id`.
    pub fn create_text(
        &self,
        owner_id: PrincipalId,
        title: impl Into<String>,
        content: impl Into<String>,
        shared_with: Vec<PrincipalId>,
    ) -> ServiceResult<Text> {
        let text = Text::new(owner_id, title, content, shared_with)?;
        self.repo.create_text(&text)?;
        info!(
            "event=text_create module=service status=ok text_id={} shares={}",
            text.id,
            text.shared_with.len()
        );
        Ok(text)
    }

    /// Deletes a text and everything anchored to it. Owner only.
    pub fn delete_text(&self, text_id: TextId, principal_id: PrincipalId) -> ServiceResult<()> {
        let text = self
            .repo
            .get_text(text_id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Text, text_id))?;
        if text.owner_id != principal_id {
            warn!(
                "event=text_delete module=service status=error text_id={text_id} error_code=forbidden"
            );
            return Err(EngineError::Forbidden {
                principal_id,
                target_id: text_id,
            }
            .into());
        }

        self.repo.delete_text(text_id)?;
        info!("event=text_delete module=service status=ok text_id={text_id}");
        Ok(())
    }

    /// Texts owned by or shared with `principal_id`.
    pub fn list_texts(&self, principal_id: PrincipalId) -> ServiceResult<Vec<Text>> {
        Ok(self.repo.list_texts_visible_to(principal_id)?)
    }

    /// Loads a fresh session for `text_id`.
    pub fn open_session(&self, text_id: TextId) -> ServiceResult<AnnotationSession> {
        let working_set = self
            .repo
            .load_working_set(text_id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Text, text_id))?;
        Ok(AnnotationSession::from_working_set(working_set)?)
    }

    /// Current segmentation of a stored text.
    pub fn render(&self, text_id: TextId) -> ServiceResult<Vec<Segment>> {
        let started_at = Instant::now();
        let segments = self.open_session(text_id)?.render();
        info!(
            "event=text_render module=service status=ok text_id={text_id} segments={} duration_ms={}",
            segments.len(),
            started_at.elapsed().as_millis()
        );
        Ok(segments)
    }

    /// Annotation views with action flags for `principal_id`.
    pub fn views_for(
        &self,
        text_id: TextId,
        principal_id: PrincipalId,
    ) -> ServiceResult<Vec<AnnotationView>> {
        Ok(self.open_session(text_id)?.views_for(principal_id))
    }

    /// Validates `intent` against fresh state and persists the outcome.
    pub fn execute(
        &self,
        text_id: TextId,
        intent: &MutationIntent,
    ) -> ServiceResult<MutationOutcome> {
        let started_at = Instant::now();
        let mut session = self.open_session(text_id)?;

        let outcome = match session.apply(intent) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "event=annotation_mutation module=service status=error intent={} text_id={text_id} error_kind={:?} duration_ms={}",
                    intent.name(),
                    err.kind(),
                    started_at.elapsed().as_millis()
                );
                return Err(err.into());
            }
        };

        self.repo.record_mutation(&outcome)?;
        info!(
            "event=annotation_mutation module=service status=ok intent={} text_id={text_id} duration_ms={}",
            intent.name(),
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }
}
