use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use async_trait::async_trait;
use prep_core::model::{QuizResponse, TopicResponse};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

//
// ─── COLLABORATOR TRAITS ───────────────────────────────────────────────────────
//

/// Produces study material for a list of topics.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(&self, topics: &[String]) -> Result<TopicResponse, ApiError>;
}

/// Produces a multiple-choice quiz for a list of topics.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate_quiz(&self, topics: &[String]) -> Result<QuizResponse, ApiError>;
}

/// Re-grades a submitted quiz and returns a revised one.
#[async_trait]
pub trait QuizRechecker: Send + Sync {
    async fn recheck_quiz(
        &self,
        quiz: &QuizResponse,
        answers: &BTreeMap<usize, String>,
    ) -> Result<QuizResponse, ApiError>;
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct StudyApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl StudyApiConfig {
    /// # Errors
    ///
    /// Returns `url::ParseError` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, timeout })
    }

    /// Read `PREP_API_BASE_URL` and `PREP_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the configured base URL is invalid.
    pub fn from_env() -> Result<Self, url::ParseError> {
        let base_url = env::var("PREP_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout = env::var("PREP_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        Self::new(&base_url, timeout)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Network(format!("invalid endpoint {path}: {e}")))
    }
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

/// `reqwest` client for the study API.
#[derive(Clone)]
pub struct StudyApiClient {
    client: Client,
    config: StudyApiConfig,
}

#[derive(Debug, Serialize)]
struct TopicListRequest<'a> {
    #[serde(rename = "topicList")]
    topic_list: &'a [String],
}

#[derive(Debug, Serialize)]
struct RecheckRequest<'a> {
    #[serde(rename = "existingQuiz")]
    existing_quiz: &'a QuizResponse,
    #[serde(rename = "userAnswers")]
    user_answers: BTreeMap<String, &'a str>,
}

impl StudyApiClient {
    #[must_use]
    pub fn new(config: StudyApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &StudyApiConfig {
        &self.config
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &impl Serialize,
    ) -> Result<T, ApiError> {
        let url = self.config.endpoint(path)?;
        tracing::debug!(%url, "calling study api");

        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Server {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        parse_body(&body)
    }
}

pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))
}

/// Stringified question indices, as the recheck endpoint expects.
pub(crate) fn answers_payload(answers: &BTreeMap<usize, String>) -> BTreeMap<String, &str> {
    answers
        .iter()
        .map(|(index, answer)| (index.to_string(), answer.as_str()))
        .collect()
}

#[async_trait]
impl ContentGenerator for StudyApiClient {
    async fn generate_content(&self, topics: &[String]) -> Result<TopicResponse, ApiError> {
        self.post("api/topics", &TopicListRequest { topic_list: topics })
            .await
    }
}

#[async_trait]
impl QuizGenerator for StudyApiClient {
    async fn generate_quiz(&self, topics: &[String]) -> Result<QuizResponse, ApiError> {
        self.post("api/quiz/generate", &TopicListRequest { topic_list: topics })
            .await
    }
}

#[async_trait]
impl QuizRechecker for StudyApiClient {
    async fn recheck_quiz(
        &self,
        quiz: &QuizResponse,
        answers: &BTreeMap<usize, String>,
    ) -> Result<QuizResponse, ApiError> {
        let payload = RecheckRequest {
            existing_quiz: quiz,
            user_answers: answers_payload(answers),
        };
        self.post("api/quiz/recheck", &payload).await
    }
}
