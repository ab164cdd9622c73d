//! Behavioral tests for the note and tag repositories, run against the
//! in-memory store so they need no database.

use notekeep_db::{
    normalize_tags, Error, MemoryStore, Note, NoteDraft, NoteRepository, RequestContext,
    TagRepository,
};

fn ctx(user: &str) -> RequestContext {
    RequestContext::new(user)
}

async fn create(store: &MemoryStore, user: &str, title: &str, text: &str, tags: &str) -> Note {
    NoteRepository::create(store, &ctx(user), NoteDraft::new(title, text, tags))
        .await
        .expect("create note")
}

fn ids(notes: &[Note]) -> Vec<uuid::Uuid> {
    notes.iter().map(|n| n.id).collect()
}

#[test]
fn test_normalize_tags_is_idempotent() {
    let once = normalize_tags("Work, work, Planning ");
    assert_eq!(once, vec!["work", "planning"]);
    assert_eq!(normalize_tags(&once.join(", ")), once);
}

#[tokio::test]
async fn test_create_then_fetch_round_trips_content() {
    let store = MemoryStore::new();
    let note = create(&store, "alice", "Plan", "Details here", "b, a").await;

    let fetched = store.fetch(&ctx("alice"), note.id).await.unwrap();
    assert_eq!(fetched.title, "Plan");
    assert_eq!(fetched.text, "Details here");
    assert_eq!(fetched.tags, vec!["a", "b"]);
}

#[tokio::test]
async fn test_archive_then_unarchive_restores_note() {
    let store = MemoryStore::new();
    let alice = ctx("alice");
    let note = create(&store, "alice", "t", "b", "x").await;

    store.archive(&alice, note.id).await.unwrap();
    let archived = store.fetch(&alice, note.id).await.unwrap();
    assert!(archived.archived);
    assert_eq!(archived.updated_at, note.updated_at);

    store.unarchive(&alice, note.id).await.unwrap();
    assert_eq!(store.fetch(&alice, note.id).await.unwrap(), note);
}

#[tokio::test]
async fn test_other_users_note_is_not_found_for_every_operation() {
    let store = MemoryStore::new();
    let note = create(&store, "alice", "t", "b", "").await;
    let bob = ctx("bob");

    let results = [
        store.fetch(&bob, note.id).await.map(|_| ()),
        store
            .update(&bob, note.id, NoteDraft::new("x", "y", ""))
            .await
            .map(|_| ()),
        store.archive(&bob, note.id).await,
        store.unarchive(&bob, note.id).await,
        store.delete(&bob, note.id).await,
    ];
    for result in results {
        assert!(matches!(result, Err(Error::NotFoundOrForbidden(id)) if id == note.id));
    }
    assert!(store.fetch(&ctx("alice"), note.id).await.is_ok());
}

#[tokio::test]
async fn test_blank_search_equals_list() {
    let store = MemoryStore::new();
    create(&store, "alice", "one", "b", "").await;
    create(&store, "alice", "two", "b", "").await;
    let alice = ctx("alice");

    let listed = store.list(&alice, false, None).await.unwrap();
    let searched = store.search(&alice, "", false).await.unwrap();
    assert_eq!(ids(&listed), ids(&searched));
}

#[tokio::test]
async fn test_search_unions_title_text_and_tag_matches() {
    let store = MemoryStore::new();
    let by_title = create(&store, "alice", "Vacation Plan", "beach", "").await;
    let by_text = create(&store, "alice", "Work", "make a plan for Q3", "").await;
    let by_tag = create(&store, "alice", "Misc", "stuff", "planning").await;
    let all_three = create(&store, "alice", "Plan", "plan", "plan").await;
    create(&store, "alice", "Unrelated", "nothing", "other").await;

    let found = store.search(&ctx("alice"), "PLAN", false).await.unwrap();
    let mut got = ids(&found);
    got.sort();
    let mut expected = vec![by_title.id, by_text.id, by_tag.id, all_three.id];
    expected.sort();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_deleted_note_leaves_tag_listed() {
    let store = MemoryStore::new();
    let alice = ctx("alice");
    let note = create(&store, "alice", "t", "b", "keep").await;

    store.delete(&alice, note.id).await.unwrap();

    let tags = store.list_with_counts(&alice).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "keep");
    assert_eq!(tags[0].note_count, 0);
}

#[tokio::test]
async fn test_blank_title_is_rejected() {
    let store = MemoryStore::new();
    let result = NoteRepository::create(&store, &ctx("alice"), NoteDraft::new(" ", "b", "t")).await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(store.list_with_counts(&ctx("alice")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tag_filter_is_case_insensitive() {
    let store = MemoryStore::new();
    let note = create(&store, "alice", "t", "b", "Work").await;

    let found = store.list(&ctx("alice"), false, Some("WORK")).await.unwrap();
    assert_eq!(ids(&found), vec![note.id]);
}

#[tokio::test]
async fn test_blank_tag_filter_matches_nothing() {
    let store = MemoryStore::new();
    create(&store, "alice", "t", "b", "work").await;
    create(&store, "alice", "untagged", "b", "").await;

    for tag in ["", "   "] {
        let found = store.list(&ctx("alice"), false, Some(tag)).await.unwrap();
        assert!(found.is_empty(), "tag {:?}", tag);
    }
}

#[tokio::test]
async fn test_search_matches_non_ascii_text() {
    let store = MemoryStore::new();
    let note = create(&store, "alice", "Über Plan", "Straße", "café").await;
    create(&store, "alice", "Other", "nothing", "").await;

    for query in ["Über", "straße", "CAFÉ"] {
        let found = store.search(&ctx("alice"), query, false).await.unwrap();
        assert_eq!(ids(&found), vec![note.id], "query {:?}", query);
    }
}

#[tokio::test]
async fn test_tag_counts_ignore_archived_notes() {
    let store = MemoryStore::new();
    let alice = ctx("alice");
    let a = create(&store, "alice", "a", "b", "work").await;
    create(&store, "alice", "b", "b", "work").await;
    store.archive(&alice, a.id).await.unwrap();

    let tags = store.list_with_counts(&alice).await.unwrap();
    assert_eq!(tags[0].note_count, 1);
}

#[tokio::test]
async fn test_list_orders_by_most_recent_update() {
    let store = MemoryStore::new();
    let alice = ctx("alice");
    let first = create(&store, "alice", "first", "b", "").await;
    let second = create(&store, "alice", "second", "b", "").await;
    assert_eq!(
        ids(&store.list(&alice, false, None).await.unwrap()),
        vec![second.id, first.id]
    );

    store
        .update(&alice, first.id, NoteDraft::new("first!", "b", ""))
        .await
        .unwrap();
    assert_eq!(
        ids(&store.list(&alice, false, None).await.unwrap()),
        vec![first.id, second.id]
    );
}

#[tokio::test]
async fn test_archived_flag_partitions_list_and_search() {
    let store = MemoryStore::new();
    let alice = ctx("alice");
    let live = create(&store, "alice", "topic live", "b", "").await;
    let gone = create(&store, "alice", "topic gone", "b", "").await;
    store.archive(&alice, gone.id).await.unwrap();

    assert_eq!(ids(&store.list(&alice, false, None).await.unwrap()), vec![live.id]);
    assert_eq!(ids(&store.list(&alice, true, None).await.unwrap()), vec![gone.id]);
    assert_eq!(
        ids(&store.search(&alice, "topic", true).await.unwrap()),
        vec![gone.id]
    );
}

#[tokio::test]
async fn test_tags_are_scoped_per_user() {
    let store = MemoryStore::new();
    create(&store, "alice", "a", "b", "work").await;
    create(&store, "bob", "a", "b", "work, home").await;

    let alice_tags = store.list_with_counts(&ctx("alice")).await.unwrap();
    let bob_tags = store.list_with_counts(&ctx("bob")).await.unwrap();
    assert_eq!(alice_tags.len(), 1);
    assert_eq!(bob_tags.len(), 2);
    assert_ne!(alice_tags[0].id, bob_tags[1].id);
}
