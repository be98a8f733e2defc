//! Shared text document model.
//!
//! # Responsibility
//! - Define the document annotations are anchored to.
//! - Validate user-entered title/content before persistence.
//!
//! # Invariants
//! - `content` is immutable while annotations reference it.
//! - `owner_id` never appears in `shared_with`.

use super::{is_blank, now_epoch_ms, PrincipalId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a shared text.
pub type TextId = Uuid;

/// A document owned by its creator and optionally shared with others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub id: TextId,
    pub owner_id: PrincipalId,
    pub title: String,
    pub content: String,
    /// Principals the owner shared this text with, deduplicated.
    pub shared_with: Vec<PrincipalId>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Validation failures for text records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextValidationError {
    NilId,
    BlankTitle,
    BlankContent,
}

impl Display for TextValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "text id must not be nil"),
            Self::BlankTitle => write!(f, "text title must not be blank"),
            Self::BlankContent => write!(f, "text content must not be blank"),
        }
    }
}

impl Error for TextValidationError {}

impl Text {
    /// Creates a text with a generated id.
    ///
    /// `shared_with` is deduplicated and the owner is dropped from it.
    pub fn new(
        owner_id: PrincipalId,
        title: impl Into<String>,
        content: impl Into<String>,
        shared_with: Vec<PrincipalId>,
    ) -> Result<Self, TextValidationError> {
        let mut text = Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into().trim().to_string(),
            content: content.into(),
            shared_with: Vec::new(),
            created_at: now_epoch_ms(),
        };
        for principal_id in shared_with {
            text.share_with(principal_id);
        }
        text.validate()?;
        Ok(text)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TextValidationError> {
        if self.id.is_nil() {
            return Err(TextValidationError::NilId);
        }
        if is_blank(&self.title) {
            return Err(TextValidationError::BlankTitle);
        }
        if is_blank(&self.content) {
            return Err(TextValidationError::BlankContent);
        }
        Ok(())
    }

    /// Adds one principal to the share list. Owner and duplicates are ignored.
    pub fn share_with(&mut self, principal_id: PrincipalId) {
        if principal_id != self.owner_id && !self.shared_with.contains(&principal_id) {
            self.shared_with.push(principal_id);
        }
    }

    /// Content length in chars; the bound every span is validated against.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::{Text, TextValidationError};
    use uuid::Uuid;

    #[test]
    fn new_dedups_share_list_and_drops_owner() {
        let owner = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let text = Text::new(owner, " Essay ", "body", vec![friend, owner, friend])
            .expect("valid text");

        assert_eq!(text.title, "Essay");
        assert_eq!(text.shared_with, vec![friend]);
    }

    #[test]
    fn new_rejects_blank_fields() {
        let owner = Uuid::new_v4();
        assert_eq!(
            Text::new(owner, "  ", "body", Vec::new()).unwrap_err(),
            TextValidationError::BlankTitle
        );
        assert_eq!(
            Text::new(owner, "title", "\n\t", Vec::new()).unwrap_err(),
            TextValidationError::BlankContent
        );
    }
}
