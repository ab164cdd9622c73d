//! PostgreSQL note, tag, user, and session repository tests.
//!
//! Each test runs in its own schema via `TestDatabase`. Run with
//! `cargo test -p notekeep-db -- --ignored` against a reachable database.

use chrono::Duration;
use notekeep_db::test_fixtures::TestDatabase;
use notekeep_db::{
    Error, IdentityUser, NoteDraft, NoteRepository, SessionRepository, TagRepository,
    UserRepository,
};

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_create_and_fetch_with_normalized_tags() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.user("alice").await;

    let note = test_db
        .db
        .notes
        .create(&alice, NoteDraft::new("Plan", "Q3 roadmap", "Work, work, Planning "))
        .await
        .expect("create");

    assert_eq!(note.owner_id, "alice");
    assert_eq!(note.tags, vec!["planning", "work"]);
    assert!(!note.archived);
    assert_eq!(note.created_at, note.updated_at);

    let fetched = test_db.db.notes.fetch(&alice, note.id).await.expect("fetch");
    assert_eq!(fetched, note);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_create_rejects_blank_title() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.user("alice").await;

    let result = test_db
        .db
        .notes
        .create(&alice, NoteDraft::new("  ", "body", "x"))
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    // Nothing was written, not even the tag.
    let tags = test_db.db.tags.list_with_counts(&alice).await.unwrap();
    assert!(tags.is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_update_replaces_tag_set_and_keeps_orphan_tags() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.user("alice").await;

    let note = test_db
        .db
        .notes
        .create(&alice, NoteDraft::new("a", "b", "old, shared"))
        .await
        .unwrap();
    let updated = test_db
        .db
        .notes
        .update(&alice, note.id, NoteDraft::new("a2", "b2", "Shared, new"))
        .await
        .unwrap();

    assert_eq!(updated.tags, vec!["new", "shared"]);
    assert_eq!(updated.created_at, note.created_at);
    assert!(updated.updated_at >= note.updated_at);

    let tags = test_db.db.tags.list_with_counts(&alice).await.unwrap();
    let names: Vec<(&str, i64)> = tags.iter().map(|t| (t.name.as_str(), t.note_count)).collect();
    assert_eq!(names, vec![("new", 1), ("old", 0), ("shared", 1)]);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_foreign_note_behaves_as_missing() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.user("alice").await;
    let bob = test_db.user("bob").await;

    let note = test_db
        .db
        .notes
        .create(&alice, NoteDraft::new("secret", "alice only", ""))
        .await
        .unwrap();

    let notes = &test_db.db.notes;
    assert!(matches!(
        notes.fetch(&bob, note.id).await,
        Err(Error::NotFoundOrForbidden(id)) if id == note.id
    ));
    assert!(matches!(
        notes.update(&bob, note.id, NoteDraft::new("x", "y", "")).await,
        Err(Error::NotFoundOrForbidden(_))
    ));
    assert!(matches!(
        notes.delete(&bob, note.id).await,
        Err(Error::NotFoundOrForbidden(_))
    ));
    assert!(matches!(
        notes.archive(&bob, note.id).await,
        Err(Error::NotFoundOrForbidden(_))
    ));

    // Still intact for the owner.
    assert_eq!(notes.fetch(&alice, note.id).await.unwrap().title, "secret");

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_archive_moves_note_between_lists() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.user("alice").await;
    let notes = &test_db.db.notes;

    let note = notes
        .create(&alice, NoteDraft::new("a", "b", "work"))
        .await
        .unwrap();

    notes.archive(&alice, note.id).await.unwrap();
    notes.archive(&alice, note.id).await.unwrap();

    assert!(notes.list(&alice, false, None).await.unwrap().is_empty());
    let archived = notes.list(&alice, true, None).await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].updated_at, note.updated_at);

    let tags = test_db.db.tags.list_with_counts(&alice).await.unwrap();
    assert_eq!(tags[0].note_count, 0);

    notes.unarchive(&alice, note.id).await.unwrap();
    assert_eq!(notes.list(&alice, false, None).await.unwrap().len(), 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_list_by_tag_and_order() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.user("alice").await;
    let notes = &test_db.db.notes;

    let first = notes
        .create(&alice, NoteDraft::new("first", "b", "work"))
        .await
        .unwrap();
    let second = notes
        .create(&alice, NoteDraft::new("second", "b", "home"))
        .await
        .unwrap();
    notes
        .update(&alice, first.id, NoteDraft::new("first edited", "b", "work"))
        .await
        .unwrap();

    let all = notes.list(&alice, false, None).await.unwrap();
    let ids: Vec<_> = all.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let work = notes.list(&alice, false, Some(" WORK ")).await.unwrap();
    assert_eq!(work.len(), 1);
    assert_eq!(work[0].id, first.id);

    assert!(notes
        .list(&alice, false, Some("missing"))
        .await
        .unwrap()
        .is_empty());

    // A blank tag name matches nothing rather than everything.
    assert!(notes
        .list(&alice, false, Some("   "))
        .await
        .unwrap()
        .is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_search_matches_title_text_and_tags() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.user("alice").await;
    let bob = test_db.user("bob").await;
    let notes = &test_db.db.notes;

    let by_title = notes
        .create(&alice, NoteDraft::new("Groceries", "milk", ""))
        .await
        .unwrap();
    let by_text = notes
        .create(&alice, NoteDraft::new("Weekend", "buy GROCERIES", ""))
        .await
        .unwrap();
    let by_tag = notes
        .create(&alice, NoteDraft::new("List", "eggs", "groceries-2026"))
        .await
        .unwrap();
    notes
        .create(&bob, NoteDraft::new("Groceries", "bob's", ""))
        .await
        .unwrap();

    let found = notes.search(&alice, "  grocer ", false).await.unwrap();
    let mut ids: Vec<_> = found.iter().map(|n| n.id).collect();
    ids.sort();
    let mut expected = vec![by_title.id, by_text.id, by_tag.id];
    expected.sort();
    assert_eq!(ids, expected);

    // Wildcards in the query are literal.
    assert!(notes.search(&alice, "%", false).await.unwrap().is_empty());

    // Blank query lists everything.
    assert_eq!(notes.search(&alice, "   ", false).await.unwrap().len(), 3);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_search_matches_non_ascii_as_typed() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.user("alice").await;
    let notes = &test_db.db.notes;

    let note = notes
        .create(&alice, NoteDraft::new("Über Plan", "Straße", "café"))
        .await
        .unwrap();

    for query in ["Über", " Über ", "straße", "CAFÉ"] {
        let found = notes.search(&alice, query, false).await.unwrap();
        let ids: Vec<_> = found.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![note.id], "query {:?}", query);
    }

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_delete_removes_note_and_keeps_tag() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.user("alice").await;
    let notes = &test_db.db.notes;

    let note = notes
        .create(&alice, NoteDraft::new("a", "b", "solo"))
        .await
        .unwrap();
    notes.delete(&alice, note.id).await.unwrap();

    assert!(matches!(
        notes.fetch(&alice, note.id).await,
        Err(Error::NotFoundOrForbidden(_))
    ));
    assert!(matches!(
        notes.delete(&alice, note.id).await,
        Err(Error::NotFoundOrForbidden(_))
    ));

    let tags = test_db.db.tags.list_with_counts(&alice).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].note_count, 0);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_user_upsert_refreshes_email() {
    let test_db = TestDatabase::new().await;
    let users = &test_db.db.users;

    let created = users
        .upsert(&IdentityUser {
            id: "gh|1".to_string(),
            email: "old@example.com".to_string(),
        })
        .await
        .unwrap();
    let refreshed = users
        .upsert(&IdentityUser {
            id: "gh|1".to_string(),
            email: "new@example.com".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(refreshed.email, "new@example.com");
    assert_eq!(refreshed.created_at, created.created_at);
    assert_eq!(users.get("gh|1").await.unwrap(), Some(refreshed));
    assert_eq!(users.get("gh|2").await.unwrap(), None);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database connection"]
async fn test_session_lifecycle() {
    let test_db = TestDatabase::new().await;
    test_db.user("alice").await;
    let sessions = &test_db.db.sessions;

    let token = sessions.create("alice", Duration::hours(1)).await.unwrap();
    assert_eq!(
        sessions.resolve(&token).await.unwrap().as_deref(),
        Some("alice")
    );
    assert_eq!(sessions.resolve("bogus").await.unwrap(), None);

    sessions.revoke(&token).await.unwrap();
    assert_eq!(sessions.resolve(&token).await.unwrap(), None);

    let expired = sessions
        .create("alice", Duration::seconds(-5))
        .await
        .unwrap();
    assert_eq!(sessions.resolve(&expired).await.unwrap(), None);
    assert!(sessions.purge_expired().await.unwrap() >= 1);

    sessions
        .create_login_state("state-1", "verifier-1", Duration::minutes(10))
        .await
        .unwrap();
    assert_eq!(
        sessions.consume_login_state("state-1").await.unwrap().as_deref(),
        Some("verifier-1")
    );
    assert_eq!(sessions.consume_login_state("state-1").await.unwrap(), None);

    sessions
        .create_login_state("state-2", "verifier-2", Duration::seconds(-5))
        .await
        .unwrap();
    assert_eq!(sessions.consume_login_state("state-2").await.unwrap(), None);

    test_db.cleanup().await;
}
