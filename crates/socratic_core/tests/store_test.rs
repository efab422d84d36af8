use socratic_core::{digest_bytes, MemorySessionStore, Role, Session, SessionError, SessionStore};
use uuid::Uuid;

fn sample_session(owner: Uuid) -> Session {
    Session::new(owner, digest_bytes(b"sample"), "sample.txt")
}

#[tokio::test]
async fn insert_then_fetch_round_trips() {
    let store = MemorySessionStore::new();
    let owner = Uuid::new_v4();
    let session = sample_session(owner);

    store.insert(&session).await.unwrap();
    let loaded = store.fetch(session.id, owner).await.unwrap();
    assert_eq!(loaded.id, session.id);
    assert_eq!(loaded.version, 0);
}

#[tokio::test]
async fn fetch_with_wrong_owner_is_not_found() {
    let store = MemorySessionStore::new();
    let owner = Uuid::new_v4();
    let session = sample_session(owner);
    store.insert(&session).await.unwrap();

    let err = store.fetch(session.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound));
}

#[tokio::test]
async fn versioned_update_bumps_version() {
    let store = MemorySessionStore::new();
    let owner = Uuid::new_v4();
    let mut session = sample_session(owner);
    store.insert(&session).await.unwrap();

    session.push_message(Role::User, "hi");
    store.update(&session, 0).await.unwrap();

    let loaded = store.fetch(session.id, owner).await.unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.messages.len(), 2);
}

#[tokio::test]
async fn stale_version_is_a_write_conflict() {
    let store = MemorySessionStore::new();
    let owner = Uuid::new_v4();
    let mut session = sample_session(owner);
    store.insert(&session).await.unwrap();

    session.push_message(Role::User, "first writer");
    store.update(&session, 0).await.unwrap();

    // a second writer holding the old version must not clobber the first
    let mut stale = store.fetch(session.id, owner).await.unwrap();
    stale.version = 0;
    stale.push_message(Role::User, "stale writer");
    let err = store.update(&stale, 0).await.unwrap_err();
    assert!(matches!(err, SessionError::WriteConflict));

    let loaded = store.fetch(session.id, owner).await.unwrap();
    assert_eq!(loaded.messages.last().unwrap().content, "first writer");
}

#[tokio::test]
async fn delete_is_scoped_to_the_owner() {
    let store = MemorySessionStore::new();
    let owner = Uuid::new_v4();
    let session = sample_session(owner);
    store.insert(&session).await.unwrap();

    let err = store.delete(session.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound));
    assert!(store.fetch(session.id, owner).await.is_ok());

    store.delete(session.id, owner).await.unwrap();
    let err = store.fetch(session.id, owner).await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound));
}

#[tokio::test]
async fn listing_is_most_recently_updated_first() {
    let store = MemorySessionStore::new();
    let owner = Uuid::new_v4();

    let older = sample_session(owner);
    store.insert(&older).await.unwrap();

    let mut newer = Session::new(owner, digest_bytes(b"other"), "other.txt");
    store.insert(&newer).await.unwrap();
    newer.push_message(Role::User, "touch");
    store.update(&newer, 0).await.unwrap();

    let listed = store.list_for_owner(owner).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);

    // other owners see nothing
    let empty = store.list_for_owner(Uuid::new_v4()).await.unwrap();
    assert!(empty.is_empty());
}
