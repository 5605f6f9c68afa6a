use prep_core::model::{AttemptId, QuizAttempt, UserIdentity};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn attempt_id_from_i64(v: i64) -> Result<AttemptId, StorageError> {
    u64::try_from(v)
        .map(AttemptId::new)
        .map_err(|_| StorageError::Serialization("attempt id sign overflow".into()))
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizAttempt, StorageError> {
    let email: String = row.try_get("user_email").map_err(ser)?;
    let user = UserIdentity::new(email.as_str())
        .ok_or_else(|| StorageError::Serialization(format!("invalid user_email: {email:?}")))?;

    QuizAttempt::from_persisted(
        attempt_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user,
        row.try_get::<String, _>("topic").map_err(ser)?,
        u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
