use std::sync::Arc;

use prep_core::model::{QuizResponse, TopicResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;
use storage::repository::HandoffStore;

use crate::error::HandoffError;

/// Slot holding the latest topic selection result.
pub const TOPIC_RESULTS_KEY: &str = "topicResults";
/// Slot holding the most recently generated quiz.
pub const QUIZ_KEY: &str = "quizData";

/// Typed access to the handoff slots shared by the study steps.
#[derive(Clone)]
pub struct SessionHandoff {
    store: Arc<dyn HandoffStore>,
}

impl SessionHandoff {
    #[must_use]
    pub fn new(store: Arc<dyn HandoffStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `HandoffError` if the result cannot be encoded or stored.
    pub async fn save_topic_results(&self, results: &TopicResponse) -> Result<(), HandoffError> {
        self.put(TOPIC_RESULTS_KEY, results).await
    }

    /// `Ok(None)` means no topics have been selected yet.
    ///
    /// # Errors
    ///
    /// Returns `HandoffError` if the slot cannot be read or decoded.
    pub async fn topic_results(&self) -> Result<Option<TopicResponse>, HandoffError> {
        self.get(TOPIC_RESULTS_KEY).await
    }

    /// # Errors
    ///
    /// Returns `HandoffError` if the quiz cannot be encoded or stored.
    pub async fn save_quiz(&self, quiz: &QuizResponse) -> Result<(), HandoffError> {
        self.put(QUIZ_KEY, quiz).await
    }

    /// # Errors
    ///
    /// Returns `HandoffError` if the slot cannot be read or decoded.
    pub async fn quiz(&self) -> Result<Option<QuizResponse>, HandoffError> {
        self.get(QUIZ_KEY).await
    }

    /// Forget both slots.
    ///
    /// # Errors
    ///
    /// Returns `HandoffError` if the store cannot clear a slot.
    pub async fn clear(&self) -> Result<(), HandoffError> {
        self.store.clear(TOPIC_RESULTS_KEY).await?;
        self.store.clear(QUIZ_KEY).await?;
        Ok(())
    }

    async fn put<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), HandoffError> {
        let json = serde_json::to_string(value)?;
        self.store.put(key, json).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, HandoffError> {
        match self.store.get(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
