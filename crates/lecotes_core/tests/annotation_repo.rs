use lecotes_core::db::{open_db, open_db_in_memory};
use lecotes_core::{
    AnnotationRepository, AnnotationSession, MutationOutcome, RepoError,
    SqliteAnnotationRepository, Text, VoteTarget,
};
use rusqlite::Connection;
use uuid::Uuid;

fn seed_text(repo: &SqliteAnnotationRepository<'_>, owner: Uuid, shared: Vec<Uuid>) -> Text {
    let text = Text::new(owner, "Fox", "The quick brown fox", shared).unwrap();
    repo.create_text(&text).unwrap();
    text
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn text_round_trips_with_shares() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    let reader = Uuid::new_v4();
    let text = seed_text(&repo, owner, vec![reader]);

    let loaded = repo.get_text(text.id).unwrap().unwrap();
    assert_eq!(loaded, text);
    assert!(repo.get_text(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn list_texts_visible_to_covers_owned_and_shared() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    let reader = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let shared = seed_text(&repo, owner, vec![reader]);
    let private = seed_text(&repo, owner, Vec::new());

    let owned: Vec<Uuid> = repo
        .list_texts_visible_to(owner)
        .unwrap()
        .into_iter()
        .map(|text| text.id)
        .collect();
    assert_eq!(owned.len(), 2);
    assert!(owned.contains(&shared.id) && owned.contains(&private.id));

    let visible = repo.list_texts_visible_to(reader).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, shared.id);

    assert!(repo.list_texts_visible_to(stranger).unwrap().is_empty());
}

#[test]
fn recorded_outcomes_reload_into_identical_session() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    let reader = Uuid::new_v4();
    let text = seed_text(&repo, owner, vec![reader]);

    let mut session = AnnotationSession::new(text.clone());
    let annotation = session
        .create_annotation(reader, "Reader", "speed", 4, 9)
        .unwrap();
    repo.record_mutation(&MutationOutcome::AnnotationCreated {
        annotation: annotation.clone(),
    })
    .unwrap();

    let reply = session
        .create_reply(annotation.id, owner, "Owner", "agreed")
        .unwrap();
    repo.record_mutation(&MutationOutcome::ReplyCreated {
        reply: reply.clone(),
    })
    .unwrap();

    let tally = session.vote_annotation(annotation.id, owner, 1).unwrap();
    let vote = session
        .annotation_store()
        .votes()
        .iter()
        .find(|vote| vote.voter_id == owner)
        .unwrap();
    repo.record_mutation(&MutationOutcome::AnnotationVoted { vote, tally })
        .unwrap();

    let working_set = repo.load_working_set(text.id).unwrap().unwrap();
    assert_eq!(working_set.annotations.len(), 1);
    assert_eq!(working_set.annotations[0].votes, 1);
    assert_eq!(working_set.replies, vec![reply]);
    assert_eq!(working_set.votes.len(), 1);
    assert_eq!(working_set.votes[0].target, VoteTarget::Annotation(annotation.id));

    let reloaded = AnnotationSession::from_working_set(working_set).unwrap();
    assert_eq!(reloaded.list_sorted(), session.list_sorted());
}

#[test]
fn duplicate_vote_rows_are_reported_as_duplicate_votes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    let text = seed_text(&repo, owner, Vec::new());

    let mut session = AnnotationSession::new(text);
    let annotation = session
        .create_annotation(owner, "Owner", "note", 0, 3)
        .unwrap();
    let reply = session
        .create_reply(annotation.id, owner, "Owner", "reply")
        .unwrap();
    for outcome in [
        MutationOutcome::AnnotationCreated {
            annotation: annotation.clone(),
        },
        MutationOutcome::ReplyCreated {
            reply: reply.clone(),
        },
    ] {
        repo.record_mutation(&outcome).unwrap();
    }

    let tally = session.vote_annotation(annotation.id, owner, 1).unwrap();
    let vote = session.annotation_store().votes().iter().next().unwrap();
    let annotation_vote = MutationOutcome::AnnotationVoted { vote, tally };
    let tally = session.vote_reply(reply.id, owner, -1).unwrap();
    let vote = session.reply_store().votes().iter().next().unwrap();
    let reply_vote = MutationOutcome::ReplyVoted { vote, tally };

    for outcome in [annotation_vote, reply_vote] {
        repo.record_mutation(&outcome).unwrap();
        let err = repo.record_mutation(&outcome).unwrap_err();
        assert!(matches!(
            err,
            RepoError::DuplicateVote { voter_id, .. } if voter_id == owner
        ));
    }
    assert_eq!(count(&conn, "annotation_votes"), 1);
    assert_eq!(count(&conn, "reply_votes"), 1);
}

#[test]
fn vote_on_missing_row_stays_a_database_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    let text = seed_text(&repo, owner, Vec::new());

    let mut session = AnnotationSession::new(text);
    let annotation = session
        .create_annotation(owner, "Owner", "never stored", 0, 3)
        .unwrap();
    let tally = session.vote_annotation(annotation.id, owner, 1).unwrap();
    let vote = session.annotation_store().votes().iter().next().unwrap();

    let err = repo
        .record_mutation(&MutationOutcome::AnnotationVoted { vote, tally })
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn deleting_annotation_row_cascades_to_replies_and_votes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    let text = seed_text(&repo, owner, Vec::new());

    let mut session = AnnotationSession::new(text);
    let annotation = session
        .create_annotation(owner, "Owner", "note", 0, 3)
        .unwrap();
    let reply = session
        .create_reply(annotation.id, owner, "Owner", "reply")
        .unwrap();
    session.vote_reply(reply.id, owner, -1).unwrap();
    let vote = session.reply_store().votes().iter().next().unwrap();
    for outcome in [
        MutationOutcome::AnnotationCreated {
            annotation: annotation.clone(),
        },
        MutationOutcome::ReplyCreated { reply },
        MutationOutcome::ReplyVoted { vote, tally: -1 },
    ] {
        repo.record_mutation(&outcome).unwrap();
    }

    let removed_reply_ids = session.delete_annotation(annotation.id, owner).unwrap();
    repo.record_mutation(&MutationOutcome::AnnotationDeleted {
        annotation_id: annotation.id,
        removed_reply_ids,
    })
    .unwrap();

    assert_eq!(count(&conn, "annotations"), 0);
    assert_eq!(count(&conn, "replies"), 0);
    assert_eq!(count(&conn, "reply_votes"), 0);
}

#[test]
fn delete_text_removes_everything_anchored_to_it() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    let text = seed_text(&repo, owner, vec![Uuid::new_v4()]);

    let mut session = AnnotationSession::new(text.clone());
    let annotation = session
        .create_annotation(owner, "Owner", "note", 0, 3)
        .unwrap();
    repo.record_mutation(&MutationOutcome::AnnotationCreated { annotation })
        .unwrap();

    repo.delete_text(text.id).unwrap();

    assert!(repo.load_working_set(text.id).unwrap().is_none());
    assert_eq!(count(&conn, "annotations"), 0);
    assert_eq!(count(&conn, "text_shares"), 0);
    assert!(matches!(
        repo.delete_text(text.id),
        Err(RepoError::NotFound(id)) if id == text.id
    ));
}

#[test]
fn editing_missing_row_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    let text = seed_text(&repo, owner, Vec::new());

    let mut session = AnnotationSession::new(text);
    let annotation = session
        .create_annotation(owner, "Owner", "note", 0, 3)
        .unwrap();

    let err = repo
        .record_mutation(&MutationOutcome::AnnotationEdited { annotation })
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn corrupt_range_row_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    let text = seed_text(&repo, owner, Vec::new());

    conn.execute(
        "INSERT INTO annotations
            (id, text_id, author_id, author_display_name, content, range_start, range_end, created_at)
         VALUES (?1, ?2, ?3, 'Owner', 'note', 10, 500, 0);",
        [
            Uuid::new_v4().to_string(),
            text.id.to_string(),
            owner.to_string(),
        ],
    )
    .unwrap();

    let err = repo.load_working_set(text.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lecotes.sqlite3");
    let owner = Uuid::new_v4();

    let text_id = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
        seed_text(&repo, owner, Vec::new()).id
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteAnnotationRepository::try_new(&conn).unwrap();
    let loaded = repo.get_text(text_id).unwrap().unwrap();
    assert_eq!(loaded.owner_id, owner);
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteAnnotationRepository::try_new(&conn),
        Err(RepoError::InvalidData(_))
    ));
}
