use chrono::Duration;
use prep_core::Clock;
use prep_core::model::{NewAttempt, UserIdentity};
use prep_core::time::fixed_now;
use storage::repository::{AttemptRepository, Storage};
use storage::sqlite::SqliteRepository;

fn user(email: &str) -> UserIdentity {
    UserIdentity::new(email).unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_inserts_and_lists_attempts_newest_first() {
    let repo = connect("memdb_attempts").await;
    let earlier = repo
        .clone()
        .with_clock(Clock::fixed(fixed_now() - Duration::days(2)));
    let later = repo.clone().with_clock(Clock::fixed(fixed_now()));

    let first = earlier
        .insert_attempts(&[
            NewAttempt::new(user("a@example.com"), "Experience Edge", 1, 3).unwrap(),
            NewAttempt::new(user("b@example.com"), "Admin API", 2, 2).unwrap(),
        ])
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_ne!(first[0].id(), first[1].id());

    let second = later
        .insert_attempts(&[NewAttempt::new(user("a@example.com"), "Admin API", 3, 3).unwrap()])
        .await
        .unwrap();

    let listed = repo.list_attempts(&user("a@example.com")).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], second[0]);
    assert_eq!(listed[1], first[0]);
    assert_eq!(listed[1].created_at(), fixed_now() - Duration::days(2));
    assert!(listed[0].is_perfect());
}

#[tokio::test]
async fn sqlite_lists_nothing_for_unknown_user() {
    let repo = connect("memdb_unknown_user").await;
    let listed = repo.list_attempts(&user("nobody@example.com")).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(repo.pool())
        .await
        .unwrap();
    assert_eq!(versions, vec![1, 2]);
}

#[tokio::test]
async fn sqlite_handoff_slot_overwrites_and_clears() {
    let storage = Storage::from_sqlite(connect("memdb_handoff").await);

    assert_eq!(storage.handoff.get("topicResults").await.unwrap(), None);
    storage.handoff.put("topicResults", "one".into()).await.unwrap();
    storage.handoff.put("topicResults", "two".into()).await.unwrap();
    assert_eq!(
        storage.handoff.get("topicResults").await.unwrap().as_deref(),
        Some("two")
    );

    storage.handoff.clear("topicResults").await.unwrap();
    assert_eq!(storage.handoff.get("topicResults").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_rejects_rows_that_break_attempt_invariants() {
    let repo = connect("memdb_checks").await;
    let res = sqlx::query(
        "INSERT INTO quiz_attempts (user_email, topic, score, total_questions, created_at) VALUES ('a@example.com', 'X', 4, 3, ?1)",
    )
    .bind(fixed_now())
    .execute(repo.pool())
    .await;
    assert!(res.is_err());
}
