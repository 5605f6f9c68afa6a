use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{AttemptId, UserIdentity};
use crate::percent::{Ratio, score_percent};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt topic cannot be empty")]
    EmptyTopic,

    #[error("attempt must cover at least one question")]
    ZeroTotal,

    #[error("score {score} exceeds total questions {total}")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

fn validate(topic: &str, score: u32, total: u32) -> Result<(), AttemptError> {
    if topic.trim().is_empty() {
        return Err(AttemptError::EmptyTopic);
    }
    if total == 0 {
        return Err(AttemptError::ZeroTotal);
    }
    if score > total {
        return Err(AttemptError::ScoreExceedsTotal { score, total });
    }
    Ok(())
}

//
// ─── NEW ATTEMPT ───────────────────────────────────────────────────────────────
//

/// Insert payload for the attempt store; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttempt {
    pub user: UserIdentity,
    pub topic: String,
    pub score: u32,
    pub total_questions: u32,
}

impl NewAttempt {
    /// # Errors
    ///
    /// Returns `AttemptError` if the topic is blank, the total is zero, or the
    /// score exceeds the total.
    pub fn new(
        user: UserIdentity,
        topic: impl Into<String>,
        score: u32,
        total_questions: u32,
    ) -> Result<Self, AttemptError> {
        let topic = topic.into();
        validate(&topic, score, total_questions)?;
        Ok(Self {
            user,
            topic,
            score,
            total_questions,
        })
    }
}

//
// ─── QUIZ ATTEMPT ──────────────────────────────────────────────────────────────
//

/// One scored quiz submission for a single topic, as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    id: AttemptId,
    user: UserIdentity,
    topic: String,
    score: u32,
    total_questions: u32,
    created_at: DateTime<Utc>,
}

impl QuizAttempt {
    /// Rehydrate an attempt read back from storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` when the persisted row breaks attempt invariants.
    pub fn from_persisted(
        id: AttemptId,
        user: UserIdentity,
        topic: impl Into<String>,
        score: u32,
        total_questions: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        let topic = topic.into();
        validate(&topic, score, total_questions)?;
        Ok(Self {
            id,
            user,
            topic,
            score,
            total_questions,
            created_at,
        })
    }

    /// Materialize an insert payload with store-assigned id and timestamp.
    #[must_use]
    pub fn from_new(id: AttemptId, new: NewAttempt, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user: new.user,
            topic: new.topic,
            score: new.score,
            total_questions: new.total_questions,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn ratio(&self) -> Ratio {
        Ratio::of(u64::from(self.score), u64::from(self.total_questions))
    }

    /// Rounded percentage of correct answers in this attempt.
    #[must_use]
    pub fn score_percent(&self) -> u8 {
        score_percent(u64::from(self.score), u64::from(self.total_questions))
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.score == self.total_questions
    }
}
