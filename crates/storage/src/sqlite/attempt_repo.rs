use prep_core::model::{NewAttempt, QuizAttempt, UserIdentity};

use super::SqliteRepository;
use super::mapping::{attempt_id_from_i64, conn, map_attempt_row};
use crate::repository::{AttemptRepository, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn insert_attempts(
        &self,
        attempts: &[NewAttempt],
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let created_at = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let mut stored = Vec::with_capacity(attempts.len());

        for new in attempts {
            let res = sqlx::query(
                r"
                    INSERT INTO quiz_attempts (user_email, topic, score, total_questions, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(new.user.as_str())
            .bind(new.topic.as_str())
            .bind(i64::from(new.score))
            .bind(i64::from(new.total_questions))
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

            let id = attempt_id_from_i64(res.last_insert_rowid())?;
            stored.push(QuizAttempt::from_new(id, new.clone(), created_at));
        }

        tx.commit().await.map_err(conn)?;
        Ok(stored)
    }

    async fn list_attempts(&self, user: &UserIdentity) -> Result<Vec<QuizAttempt>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_email, topic, score, total_questions, created_at
                FROM quiz_attempts
                WHERE user_email = ?1
                ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}
