//! Annotation repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist texts, annotations, replies and votes.
//! - Load one text's full working set for the engine.
//! - Record engine outcomes; the engine itself decides what is valid.
//!
//! # Invariants
//! - Reads re-validate persisted rows and report `InvalidData` instead of
//!   masking corrupt state.
//! - Working sets list annotations and replies in creation order
//!   (`created_at`, then insertion `rowid`).
//! - Tallies are derived from vote rows, never stored separately.
//! - Each recorded outcome is applied in a single transaction.
//! - A vote row that collides with an existing (target, voter) pair is
//!   reported as `RepoError::DuplicateVote`, not as a raw SQLite error.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::annotation::Annotation;
use crate::model::range::SpanRange;
use crate::model::reply::Reply;
use crate::model::text::{Text, TextId, TextValidationError};
use crate::model::vote::{Vote, VoteTarget, VoteValue};
use crate::model::PrincipalId;
use crate::session::intent::MutationOutcome;
use crate::session::WorkingSet;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TEXT_SELECT_SQL: &str = "SELECT id, owner_id, title, content, created_at FROM texts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for annotation persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(TextValidationError),
    Db(DbError),
    NotFound(Uuid),
    /// A vote row for this (target, voter) pair already exists.
    DuplicateVote { voter_id: PrincipalId, target_id: Uuid },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::DuplicateVote {
                voter_id,
                target_id,
            } => write!(f, "vote by {voter_id} on {target_id} already recorded"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateVote { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<TextValidationError> for RepoError {
    fn from(value: TextValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract consumed by `AnnotationService`.
pub trait AnnotationRepository {
    /// Inserts a text together with its share list.
    fn create_text(&self, text: &Text) -> RepoResult<TextId>;
    fn get_text(&self, text_id: TextId) -> RepoResult<Option<Text>>;
    /// Texts owned by or shared with `principal_id`, newest first.
    fn list_texts_visible_to(&self, principal_id: PrincipalId) -> RepoResult<Vec<Text>>;
    /// Deletes a text and, by cascade, everything anchored to it.
    fn delete_text(&self, text_id: TextId) -> RepoResult<()>;
    /// Loads text, annotations, replies and votes of one text.
    fn load_working_set(&self, text_id: TextId) -> RepoResult<Option<WorkingSet>>;
    /// Persists one engine outcome atomically.
    fn record_mutation(&self, outcome: &MutationOutcome) -> RepoResult<()>;
}

/// SQLite-backed annotation repository.
pub struct SqliteAnnotationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAnnotationRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// Rejects connections whose schema is not at the latest version.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let version = current_version(conn)?;
        if version != latest_version() {
            return Err(RepoError::InvalidData(format!(
                "connection schema version {version} does not match expected {}",
                latest_version()
            )));
        }
        Ok(Self { conn })
    }
}

impl AnnotationRepository for SqliteAnnotationRepository<'_> {
    fn create_text(&self, text: &Text) -> RepoResult<TextId> {
        text.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO texts (id, owner_id, title, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                text.id.to_string(),
                text.owner_id.to_string(),
                text.title.as_str(),
                text.content.as_str(),
                text.created_at,
            ],
        )?;
        for principal_id in &text.shared_with {
            tx.execute(
                "INSERT OR IGNORE INTO text_shares (text_id, principal_id) VALUES (?1, ?2);",
                params![text.id.to_string(), principal_id.to_string()],
            )?;
        }
        tx.commit()?;

        Ok(text.id)
    }

    fn get_text(&self, text_id: TextId) -> RepoResult<Option<Text>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEXT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([text_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_text_row(row)?));
        }
        Ok(None)
    }

    fn list_texts_visible_to(&self, principal_id: PrincipalId) -> RepoResult<Vec<Text>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TEXT_SELECT_SQL}
             WHERE owner_id = ?1
                OR EXISTS (
                    SELECT 1 FROM text_shares s
                    WHERE s.text_id = texts.id AND s.principal_id = ?1
                )
             ORDER BY created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([principal_id.to_string()])?;
        let mut texts = Vec::new();
        while let Some(row) = rows.next()? {
            texts.push(self.parse_text_row(row)?);
        }
        Ok(texts)
    }

    fn delete_text(&self, text_id: TextId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM texts WHERE id = ?1;", [text_id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(text_id));
        }
        Ok(())
    }

    fn load_working_set(&self, text_id: TextId) -> RepoResult<Option<WorkingSet>> {
        let Some(text) = self.get_text(text_id)? else {
            return Ok(None);
        };
        let text_len = text.char_len();
        let key = text_id.to_string();

        let mut stmt = self.conn.prepare(
            "SELECT
                a.id,
                a.text_id,
                a.author_id,
                a.author_display_name,
                a.content,
                a.range_start,
                a.range_end,
                a.created_at,
                COALESCE(
                    (SELECT SUM(v.value) FROM annotation_votes v WHERE v.annotation_id = a.id),
                    0
                ) AS votes
             FROM annotations a
             WHERE a.text_id = ?1
             ORDER BY a.created_at ASC, a.rowid ASC;",
        )?;
        let mut rows = stmt.query([key.as_str()])?;
        let mut annotations = Vec::new();
        while let Some(row) = rows.next()? {
            annotations.push(parse_annotation_row(row, text_len)?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT
                r.id,
                r.annotation_id,
                r.author_id,
                r.author_display_name,
                r.content,
                r.created_at,
                COALESCE(
                    (SELECT SUM(v.value) FROM reply_votes v WHERE v.reply_id = r.id),
                    0
                ) AS votes
             FROM replies r
             INNER JOIN annotations a ON a.id = r.annotation_id
             WHERE a.text_id = ?1
             ORDER BY r.created_at ASC, r.rowid ASC;",
        )?;
        let mut rows = stmt.query([key.as_str()])?;
        let mut replies = Vec::new();
        while let Some(row) = rows.next()? {
            replies.push(parse_reply_row(row)?);
        }

        let mut votes = Vec::new();
        let mut stmt = self.conn.prepare(
            "SELECT v.annotation_id AS target_id, v.voter_id, v.value
             FROM annotation_votes v
             INNER JOIN annotations a ON a.id = v.annotation_id
             WHERE a.text_id = ?1
             ORDER BY v.rowid ASC;",
        )?;
        let mut rows = stmt.query([key.as_str()])?;
        while let Some(row) = rows.next()? {
            votes.push(parse_vote_row(row, VoteTarget::Annotation)?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT v.reply_id AS target_id, v.voter_id, v.value
             FROM reply_votes v
             INNER JOIN replies r ON r.id = v.reply_id
             INNER JOIN annotations a ON a.id = r.annotation_id
             WHERE a.text_id = ?1
             ORDER BY v.rowid ASC;",
        )?;
        let mut rows = stmt.query([key.as_str()])?;
        while let Some(row) = rows.next()? {
            votes.push(parse_vote_row(row, VoteTarget::Reply)?);
        }

        Ok(Some(WorkingSet {
            text,
            annotations,
            replies,
            votes,
        }))
    }

    fn record_mutation(&self, outcome: &MutationOutcome) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        match outcome {
            MutationOutcome::AnnotationCreated { annotation } => {
                tx.execute(
                    "INSERT INTO annotations (
                        id,
                        text_id,
                        author_id,
                        author_display_name,
                        content,
                        range_start,
                        range_end,
                        created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                    params![
                        annotation.id.to_string(),
                        annotation.text_id.to_string(),
                        annotation.author_id.to_string(),
                        annotation.author_display_name.as_str(),
                        annotation.content.as_str(),
                        to_db_offset(annotation.range.start())?,
                        to_db_offset(annotation.range.end())?,
                        annotation.created_at,
                    ],
                )?;
            }
            MutationOutcome::AnnotationEdited { annotation } => {
                let changed = tx.execute(
                    "UPDATE annotations SET content = ?2 WHERE id = ?1;",
                    params![annotation.id.to_string(), annotation.content.as_str()],
                )?;
                ensure_changed(changed, annotation.id)?;
            }
            MutationOutcome::AnnotationDeleted { annotation_id, .. } => {
                let changed = tx.execute(
                    "DELETE FROM annotations WHERE id = ?1;",
                    [annotation_id.to_string()],
                )?;
                ensure_changed(changed, *annotation_id)?;
            }
            MutationOutcome::AnnotationVoted { vote, .. } => {
                tx.execute(
                    "INSERT INTO annotation_votes (annotation_id, voter_id, value)
                     VALUES (?1, ?2, ?3);",
                    params![
                        vote.target.id().to_string(),
                        vote.voter_id.to_string(),
                        vote.value.delta(),
                    ],
                )
                .map_err(|err| map_vote_insert_error(err, vote))?;
            }
            MutationOutcome::ReplyCreated { reply } => {
                tx.execute(
                    "INSERT INTO replies (
                        id,
                        annotation_id,
                        author_id,
                        author_display_name,
                        content,
                        created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                    params![
                        reply.id.to_string(),
                        reply.annotation_id.to_string(),
                        reply.author_id.to_string(),
                        reply.author_display_name.as_str(),
                        reply.content.as_str(),
                        reply.created_at,
                    ],
                )?;
            }
            MutationOutcome::ReplyEdited { reply } => {
                let changed = tx.execute(
                    "UPDATE replies SET content = ?2 WHERE id = ?1;",
                    params![reply.id.to_string(), reply.content.as_str()],
                )?;
                ensure_changed(changed, reply.id)?;
            }
            MutationOutcome::ReplyDeleted { reply_id } => {
                let changed =
                    tx.execute("DELETE FROM replies WHERE id = ?1;", [reply_id.to_string()])?;
                ensure_changed(changed, *reply_id)?;
            }
            MutationOutcome::ReplyVoted { vote, .. } => {
                tx.execute(
                    "INSERT INTO reply_votes (reply_id, voter_id, value) VALUES (?1, ?2, ?3);",
                    params![
                        vote.target.id().to_string(),
                        vote.voter_id.to_string(),
                        vote.value.delta(),
                    ],
                )
                .map_err(|err| map_vote_insert_error(err, vote))?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl SqliteAnnotationRepository<'_> {
    fn parse_text_row(&self, row: &Row<'_>) -> RepoResult<Text> {
        let id = parse_uuid(row, "id")?;
        let text = Text {
            id,
            owner_id: parse_uuid(row, "owner_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            shared_with: self.load_shares(id)?,
            created_at: row.get("created_at")?,
        };
        text.validate().map_err(|err| {
            RepoError::InvalidData(format!("text {id} failed validation: {err}"))
        })?;
        Ok(text)
    }

    fn load_shares(&self, text_id: TextId) -> RepoResult<Vec<PrincipalId>> {
        let mut stmt = self.conn.prepare(
            "SELECT principal_id FROM text_shares WHERE text_id = ?1 ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([text_id.to_string()])?;
        let mut shared_with = Vec::new();
        while let Some(row) = rows.next()? {
            shared_with.push(parse_uuid(row, "principal_id")?);
        }
        Ok(shared_with)
    }
}

fn parse_annotation_row(row: &Row<'_>, text_len: usize) -> RepoResult<Annotation> {
    let id = parse_uuid(row, "id")?;
    let start: i64 = row.get("range_start")?;
    let end: i64 = row.get("range_end")?;
    let range = SpanRange::new(start, end, text_len).map_err(|err| {
        RepoError::InvalidData(format!("annotation {id} has invalid range: {err}"))
    })?;

    Ok(Annotation {
        id,
        text_id: parse_uuid(row, "text_id")?,
        author_id: parse_uuid(row, "author_id")?,
        author_display_name: row.get("author_display_name")?,
        content: row.get("content")?,
        range,
        votes: row.get("votes")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_reply_row(row: &Row<'_>) -> RepoResult<Reply> {
    Ok(Reply {
        id: parse_uuid(row, "id")?,
        annotation_id: parse_uuid(row, "annotation_id")?,
        author_id: parse_uuid(row, "author_id")?,
        author_display_name: row.get("author_display_name")?,
        content: row.get("content")?,
        votes: row.get("votes")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_vote_row(row: &Row<'_>, target: fn(Uuid) -> VoteTarget) -> RepoResult<Vote> {
    let raw_value: i64 = row.get("value")?;
    let value = VoteValue::try_from(raw_value)
        .map_err(|err| RepoError::InvalidData(format!("invalid vote row: {err}")))?;
    Ok(Vote {
        voter_id: parse_uuid(row, "voter_id")?,
        target: target(parse_uuid(row, "target_id")?),
        value,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let raw: String = row.get(column)?;
    Uuid::parse_str(&raw)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{raw}` in `{column}`")))
}

fn to_db_offset(offset: usize) -> RepoResult<i64> {
    i64::try_from(offset)
        .map_err(|_| RepoError::InvalidData(format!("range offset {offset} exceeds i64")))
}

/// Maps a (target, voter) key conflict to `DuplicateVote`.
///
/// Vote tables carry no other unique constraint; foreign-key failures stay
/// `Db` errors.
fn map_vote_insert_error(err: rusqlite::Error, vote: &Vote) -> RepoError {
    let key_conflict = matches!(
        &err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    );
    if key_conflict {
        return RepoError::DuplicateVote {
            voter_id: vote.voter_id,
            target_id: vote.target.id(),
        };
    }
    RepoError::from(err)
}

fn ensure_changed(changed: usize, id: Uuid) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}
