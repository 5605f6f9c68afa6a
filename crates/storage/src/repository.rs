use async_trait::async_trait;
use prep_core::Clock;
use prep_core::model::{AttemptId, NewAttempt, QuizAttempt, UserIdentity};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Attempt store contract.
///
/// The store assigns ids and creation timestamps; attempts are never updated.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Insert all attempts or none of them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be stored.
    async fn insert_attempts(&self, attempts: &[NewAttempt])
    -> Result<Vec<QuizAttempt>, StorageError>;

    /// All attempts of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempts cannot be read.
    async fn list_attempts(&self, user: &UserIdentity) -> Result<Vec<QuizAttempt>, StorageError>;
}

/// Short-lived key/value slot used to hand results from one step to the next.
#[async_trait]
pub trait HandoffStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn put(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Returns `Ok(None)` when nothing was stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be cleared.
    async fn clear(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
struct AttemptTable {
    next_id: u64,
    rows: Vec<QuizAttempt>,
}

/// In-memory implementation for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    clock: Clock,
    attempts: Arc<Mutex<AttemptTable>>,
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamps assigned on insert come from `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Store an already materialized attempt, keeping its id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is already taken.
    pub fn insert_persisted(&self, attempt: QuizAttempt) -> Result<(), StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.rows.iter().any(|row| row.id() == attempt.id()) {
            return Err(StorageError::Conflict);
        }
        guard.next_id = guard.next_id.max(attempt.id().value());
        guard.rows.push(attempt);
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn insert_attempts(
        &self,
        attempts: &[NewAttempt],
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let created_at = self.clock.now();
        let mut stored = Vec::with_capacity(attempts.len());
        for new in attempts {
            guard.next_id += 1;
            let attempt = QuizAttempt::from_new(AttemptId::new(guard.next_id), new.clone(), created_at);
            guard.rows.push(attempt.clone());
            stored.push(attempt);
        }
        Ok(stored)
    }

    async fn list_attempts(&self, user: &UserIdentity) -> Result<Vec<QuizAttempt>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<QuizAttempt> = guard
            .rows
            .iter()
            .filter(|a| a.user() == user)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(found)
    }
}

#[async_trait]
impl HandoffStore for InMemoryRepository {
    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn clear(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub attempts: Arc<dyn AttemptRepository>,
    pub handoff: Arc<dyn HandoffStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo.clone());
        let handoff: Arc<dyn HandoffStore> = Arc::new(repo);
        Self { attempts, handoff }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use prep_core::time::{fixed_clock, fixed_now};

    fn user(email: &str) -> UserIdentity {
        UserIdentity::new(email).unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_timestamps() {
        let repo = InMemoryRepository::new().with_clock(fixed_clock());
        let batch = vec![
            NewAttempt::new(user("a@example.com"), "X", 2, 2).unwrap(),
            NewAttempt::new(user("a@example.com"), "Y", 1, 3).unwrap(),
        ];

        let stored = repo.insert_attempts(&batch).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id(), AttemptId::new(1));
        assert_eq!(stored[1].id(), AttemptId::new(2));
        assert!(stored.iter().all(|a| a.created_at() == fixed_now()));
    }

    #[tokio::test]
    async fn list_is_per_user_and_newest_first() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        for (id, email, days) in [(1, "a@example.com", 3), (2, "b@example.com", 1), (3, "a@example.com", 1)] {
            let attempt = QuizAttempt::from_persisted(
                AttemptId::new(id),
                user(email),
                "X",
                1,
                2,
                now - Duration::days(days),
            )
            .unwrap();
            repo.insert_persisted(attempt).unwrap();
        }

        let listed = repo.list_attempts(&user("a@example.com")).await.unwrap();
        let ids: Vec<u64> = listed.iter().map(|a| a.id().value()).collect();
        assert_eq!(ids, vec![3, 1]);

        let next = repo
            .insert_attempts(&[NewAttempt::new(user("a@example.com"), "X", 0, 1).unwrap()])
            .await
            .unwrap();
        assert_eq!(next[0].id(), AttemptId::new(4));
    }

    #[tokio::test]
    async fn persisted_ids_must_be_unique() {
        let repo = InMemoryRepository::new();
        let attempt = QuizAttempt::from_persisted(
            AttemptId::new(7),
            user("a@example.com"),
            "X",
            1,
            1,
            fixed_now(),
        )
        .unwrap();
        repo.insert_persisted(attempt.clone()).unwrap();
        assert!(matches!(
            repo.insert_persisted(attempt),
            Err(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn handoff_slot_put_get_clear() {
        let storage = Storage::in_memory();
        assert_eq!(storage.handoff.get("topicResults").await.unwrap(), None);

        storage
            .handoff
            .put("topicResults", "{\"topics\":[]}".into())
            .await
            .unwrap();
        assert_eq!(
            storage.handoff.get("topicResults").await.unwrap().as_deref(),
            Some("{\"topics\":[]}")
        );

        storage.handoff.clear("topicResults").await.unwrap();
        assert_eq!(storage.handoff.get("topicResults").await.unwrap(), None);
    }
}
