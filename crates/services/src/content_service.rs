use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use prep_core::model::{Sources, TopicContent, TopicResponse};

use crate::error::{ApiError, ValidationError};
use crate::study_api::{ContentGenerator, DEFAULT_TIMEOUT};

/// Where the study material shown to the user came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOrigin {
    Remote,
    Fallback { reason: ApiError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyContent {
    pub response: TopicResponse,
    pub origin: ContentOrigin,
}

impl StudyContent {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, ContentOrigin::Fallback { .. })
    }
}

/// Fetches topic content, degrading to placeholder material on any failure.
#[derive(Clone)]
pub struct ContentService {
    generator: Arc<dyn ContentGenerator>,
    timeout: Duration,
}

impl ContentService {
    #[must_use]
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            generator,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Content for `topics`; never fails once at least one topic is given.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NoTopicsSelected` when `topics` is empty.
    pub async fn fetch(&self, topics: &[String]) -> Result<StudyContent, ValidationError> {
        if topics.is_empty() {
            return Err(ValidationError::NoTopicsSelected);
        }

        match self.fetch_remote(topics).await {
            Ok(response) => Ok(StudyContent {
                response,
                origin: ContentOrigin::Remote,
            }),
            Err(reason) => {
                tracing::warn!(error = %reason, topics = topics.len(), "using placeholder topic content");
                Ok(StudyContent {
                    response: placeholder_topic_response(topics),
                    origin: ContentOrigin::Fallback { reason },
                })
            }
        }
    }

    async fn fetch_remote(&self, topics: &[String]) -> Result<TopicResponse, ApiError> {
        let response = tokio::time::timeout(self.timeout, self.generator.generate_content(topics))
            .await
            .map_err(|_| ApiError::Timeout)??;

        let missing: Vec<&str> = topics
            .iter()
            .map(String::as_str)
            .filter(|topic| response.content_for(topic).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::Malformed(format!(
                "no content for {}",
                missing.join(", ")
            )));
        }
        tracing::info!(topics = topics.len(), "received topic content");
        Ok(response)
    }
}

/// Deterministic stand-in content used when the generator is unavailable.
#[must_use]
pub fn placeholder_topic_response(topics: &[String]) -> TopicResponse {
    let mut content = BTreeMap::new();
    let mut sources = BTreeMap::new();

    for topic in topics {
        content.insert(
            topic.clone(),
            TopicContent {
                explanation: format!(
                    "{topic} is a key concept in XM Cloud that enables developers to efficiently build and manage digital experiences."
                ),
                example: format!(
                    "When implementing {topic}, developers typically start by understanding the requirements and then applying best practices specific to XM Cloud."
                ),
                exam_tips: format!(
                    "For the certification exam, focus on the practical applications of {topic} and how it integrates with other XM Cloud components."
                ),
                common_questions: vec![
                    format!("What is the purpose of {topic} in XM Cloud?"),
                    format!("How does {topic} improve the development workflow?"),
                    format!("What are common challenges when implementing {topic}?"),
                ],
            },
        );
        sources.insert(
            topic.clone(),
            Sources::Single(format!(
                "https://developers.sitecore.com/learn/{}",
                slug(topic)
            )),
        );
    }

    TopicResponse {
        topics: topics.to_vec(),
        content,
        sources,
    }
}

/// Lowercase with each whitespace run replaced by a single `-`.
fn slug(topic: &str) -> String {
    let mut out = String::with_capacity(topic.len());
    let mut in_space = false;
    for ch in topic.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.extend(ch.to_lowercase());
            in_space = false;
        }
    }
    out
}
