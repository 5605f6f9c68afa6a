use std::sync::Arc;
use std::time::Duration;

use prep_core::model::{
    NewAttempt, QuizQuestion, QuizResponse, QuizScore, SessionId, TopicScore, UserIdentity,
};
use storage::repository::AttemptRepository;

use super::state::{QuestionReview, QuizSessionState};
use crate::error::{ApiError, QuizSessionError, SessionFailure, ValidationError};
use crate::study_api::{DEFAULT_TIMEOUT, QuizGenerator, QuizRechecker};

/// Lifecycle of one quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    Loading,
    Ready,
    Submitted,
    Rechecking,
    Error(SessionFailure),
}

impl QuizPhase {
    fn label(&self) -> &'static str {
        match self {
            QuizPhase::Idle => "idle",
            QuizPhase::Loading => "loading",
            QuizPhase::Ready => "ready",
            QuizPhase::Submitted => "submitted",
            QuizPhase::Rechecking => "rechecking",
            QuizPhase::Error(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    Generated { questions: usize },
    AlreadyRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub score: QuizScore,
    pub topic_scores: Vec<TopicScore>,
    /// False when the attempt store rejected the write; the score still stands.
    pub persisted: bool,
}

/// Drives one quiz from generation through submit and recheck.
pub struct QuizSession {
    id: SessionId,
    user: UserIdentity,
    topics: Vec<String>,
    phase: QuizPhase,
    state: QuizSessionState,
    generate_requested: bool,
    timeout: Duration,
    generator: Arc<dyn QuizGenerator>,
    rechecker: Arc<dyn QuizRechecker>,
    attempts: Arc<dyn AttemptRepository>,
}

impl QuizSession {
    #[must_use]
    pub fn new(
        user: UserIdentity,
        generator: Arc<dyn QuizGenerator>,
        rechecker: Arc<dyn QuizRechecker>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            id: SessionId::random(),
            user,
            topics: Vec::new(),
            phase: QuizPhase::Idle,
            state: QuizSessionState::default(),
            generate_requested: false,
            timeout: DEFAULT_TIMEOUT,
            generator,
            rechecker,
            attempts,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    #[must_use]
    pub fn state(&self) -> &QuizSessionState {
        &self.state
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        self.state.questions()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.state.is_submitted()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&SessionFailure> {
        match &self.phase {
            QuizPhase::Error(failure) => Some(failure),
            _ => None,
        }
    }

    #[must_use]
    pub fn reviews(&self) -> Vec<QuestionReview> {
        self.state.reviews()
    }

    /// Request a quiz for `topics`. Only the first call per session reaches
    /// the generator; later calls report `AlreadyRequested`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NoTopicsSelected` for an empty topic list and
    /// `QuizSessionError::Api` when generation fails; the session is then in
    /// `QuizPhase::Error`.
    pub async fn generate(
        &mut self,
        topics: Vec<String>,
    ) -> Result<GenerateOutcome, QuizSessionError> {
        if topics.is_empty() {
            return Err(ValidationError::NoTopicsSelected.into());
        }
        if self.generate_requested {
            tracing::debug!(session = %self.id, "duplicate generate ignored");
            return Ok(GenerateOutcome::AlreadyRequested);
        }
        self.generate_requested = true;
        self.topics = topics;
        self.dispatch_generate().await
    }

    /// Continue with a quiz generated earlier instead of requesting one.
    /// Counts as this session's generate request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once generation was requested, and
    /// `QuizSessionError::Api` with `ApiError::Malformed` for an invalid quiz.
    pub fn resume(&mut self, quiz: QuizResponse) -> Result<usize, QuizSessionError> {
        if self.generate_requested {
            return Err(self.invalid("resume"));
        }
        let quiz = checked_quiz(quiz)?;
        let questions = quiz.questions.len();
        self.generate_requested = true;
        self.topics = quiz.topics;
        self.state = QuizSessionState::new(quiz.questions);
        self.phase = QuizPhase::Ready;
        tracing::info!(session = %self.id, questions, "quiz resumed");
        Ok(questions)
    }

    /// Re-issue generation after a failure, with the same topics.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::InvalidState` unless the session is in
    /// `QuizPhase::Error`, and `QuizSessionError::Api` if generation fails again.
    pub async fn retry_generate(&mut self) -> Result<GenerateOutcome, QuizSessionError> {
        if !matches!(self.phase, QuizPhase::Error(_)) {
            return Err(self.invalid("retry"));
        }
        self.dispatch_generate().await
    }

    async fn dispatch_generate(&mut self) -> Result<GenerateOutcome, QuizSessionError> {
        self.phase = QuizPhase::Loading;
        tracing::info!(session = %self.id, topics = self.topics.len(), "generating quiz");

        let result = tokio::time::timeout(self.timeout, self.generator.generate_quiz(&self.topics))
            .await
            .map_err(|_| ApiError::Timeout)
            .and_then(|res| res)
            .and_then(checked_quiz);

        match result {
            Ok(quiz) => {
                let questions = quiz.questions.len();
                self.state = QuizSessionState::new(quiz.questions);
                self.phase = QuizPhase::Ready;
                tracing::info!(session = %self.id, questions, "quiz ready");
                Ok(GenerateOutcome::Generated { questions })
            }
            Err(err) => {
                tracing::warn!(session = %self.id, error = %err, "quiz generation failed");
                self.phase = QuizPhase::Error(SessionFailure::from_api(&err));
                Err(err.into())
            }
        }
    }

    /// Select `option` for question `index`. Ignored (returns `false`) unless
    /// the quiz is ready for answers.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::AnswerOutOfRange` for an index outside the
    /// question list.
    pub fn set_answer(
        &mut self,
        index: usize,
        option: impl Into<String>,
    ) -> Result<bool, QuizSessionError> {
        if self.phase != QuizPhase::Ready {
            return Ok(false);
        }
        self.state.set_answer(index, option)
    }

    /// Score the quiz and record one attempt per topic.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Unanswered` (nothing changes) when any
    /// question lacks an answer, or `InvalidState` outside `Ready`.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, QuizSessionError> {
        if self.phase != QuizPhase::Ready {
            return Err(self.invalid("submit"));
        }
        let score = self.state.submit()?;
        self.phase = QuizPhase::Submitted;
        let topic_scores = self.state.topic_scores().to_vec();
        tracing::info!(session = %self.id, correct = score.correct, total = score.total, "quiz submitted");

        let persisted = self.persist(&topic_scores).await;
        Ok(SubmitOutcome {
            score,
            topic_scores,
            persisted,
        })
    }

    async fn persist(&self, topic_scores: &[TopicScore]) -> bool {
        let batch: Result<Vec<NewAttempt>, _> = topic_scores
            .iter()
            .map(|t| NewAttempt::new(self.user.clone(), t.topic.as_str(), t.correct, t.total))
            .collect();
        let batch = match batch {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!(session = %self.id, error = %err, "quiz attempts not recorded");
                return false;
            }
        };

        match self.attempts.insert_attempts(&batch).await {
            Ok(stored) => {
                tracing::debug!(session = %self.id, rows = stored.len(), "quiz attempts recorded");
                true
            }
            Err(err) => {
                tracing::warn!(session = %self.id, error = %err, "quiz attempts not recorded");
                false
            }
        }
    }

    /// Ask the rechecker to re-grade the submitted quiz. On success the
    /// revised questions replace the old ones and answers start over.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless submitted, or `QuizSessionError::Api` if
    /// the recheck fails; the submitted results are kept in that case.
    pub async fn recheck(&mut self) -> Result<usize, QuizSessionError> {
        if self.phase != QuizPhase::Submitted {
            return Err(self.invalid("recheck"));
        }
        self.phase = QuizPhase::Rechecking;
        tracing::info!(session = %self.id, "rechecking quiz");

        let current = QuizResponse {
            topics: self.topics.clone(),
            questions: self.state.questions().to_vec(),
        };
        let result = self
            .rechecker
            .recheck_quiz(&current, self.state.answers())
            .await
            .and_then(checked_quiz);

        match result {
            Ok(revised) => {
                let questions = revised.questions.len();
                self.topics = revised.topics;
                self.state.replace_questions(revised.questions);
                self.phase = QuizPhase::Ready;
                Ok(questions)
            }
            Err(err) => {
                tracing::warn!(session = %self.id, error = %err, "recheck failed");
                self.phase = QuizPhase::Submitted;
                Err(err.into())
            }
        }
    }

    fn invalid(&self, action: &'static str) -> QuizSessionError {
        QuizSessionError::InvalidState {
            action,
            phase: self.phase.label(),
        }
    }
}

fn checked_quiz(quiz: QuizResponse) -> Result<QuizResponse, ApiError> {
    quiz.validate()
        .map_err(|e| ApiError::Malformed(e.to_string()))?;
    Ok(quiz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use storage::repository::InMemoryRepository;

    fn question(topic: &str, correct: &str) -> QuizQuestion {
        QuizQuestion {
            question: format!("Pick {correct}"),
            options: vec!["a".into(), "b".into()],
            correct_answer: correct.into(),
            topic: topic.into(),
        }
    }

    struct Scripted {
        quizzes: Mutex<Vec<Result<QuizResponse, ApiError>>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<QuizResponse, ApiError>>) -> Self {
            replies.reverse();
            Self {
                quizzes: Mutex::new(replies),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl QuizGenerator for Scripted {
        async fn generate_quiz(&self, _topics: &[String]) -> Result<QuizResponse, ApiError> {
            *self.calls.lock().unwrap() += 1;
            self.quizzes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ApiError::Network("no reply scripted".into())))
        }
    }

    #[async_trait]
    impl QuizRechecker for Scripted {
        async fn recheck_quiz(
            &self,
            _quiz: &QuizResponse,
            _answers: &BTreeMap<usize, String>,
        ) -> Result<QuizResponse, ApiError> {
            self.generate_quiz(&[]).await
        }
    }

    fn quiz(questions: Vec<QuizQuestion>) -> QuizResponse {
        QuizResponse {
            topics: vec!["X".into()],
            questions,
        }
    }

    fn session(api: Arc<Scripted>) -> QuizSession {
        QuizSession::new(
            UserIdentity::new("me@example.com").unwrap(),
            api.clone(),
            api,
            Arc::new(InMemoryRepository::new()),
        )
    }

    #[tokio::test]
    async fn generate_is_issued_once() {
        let api = Arc::new(Scripted::new(vec![Ok(quiz(vec![question("X", "a")]))]));
        let mut session = session(api.clone());

        let first = session.generate(vec!["X".into()]).await.unwrap();
        assert_eq!(first, GenerateOutcome::Generated { questions: 1 });
        let second = session.generate(vec!["X".into()]).await.unwrap();
        assert_eq!(second, GenerateOutcome::AlreadyRequested);
        assert_eq!(api.calls(), 1);
        assert_eq!(session.phase(), &QuizPhase::Ready);
    }

    #[tokio::test]
    async fn empty_topic_list_is_rejected_before_dispatch() {
        let api = Arc::new(Scripted::new(vec![]));
        let mut session = session(api.clone());
        let err = session.generate(Vec::new()).await.unwrap_err();
        assert_eq!(err, QuizSessionError::Validation(ValidationError::NoTopicsSelected));
        assert_eq!(session.phase(), &QuizPhase::Idle);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn failed_generation_can_be_retried() {
        let api = Arc::new(Scripted::new(vec![
            Err(ApiError::Server { status: 503 }),
            Ok(quiz(vec![question("X", "a")])),
        ]));
        let mut session = session(api.clone());

        assert!(session.generate(vec!["X".into()]).await.is_err());
        let failure = session.failure().unwrap();
        assert_eq!(failure.action, crate::error::RecoveryAction::Retry);
        assert!(session.questions().is_empty());

        assert_eq!(
            session.generate(vec!["X".into()]).await.unwrap(),
            GenerateOutcome::AlreadyRequested
        );
        session.retry_generate().await.unwrap();
        assert_eq!(session.phase(), &QuizPhase::Ready);
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn empty_quiz_is_malformed() {
        let api = Arc::new(Scripted::new(vec![Ok(quiz(Vec::new()))]));
        let mut session = session(api);
        let err = session.generate(vec!["X".into()]).await.unwrap_err();
        assert!(matches!(err, QuizSessionError::Api(ApiError::Malformed(_))));
        assert!(matches!(session.phase(), QuizPhase::Error(_)));
    }

    #[tokio::test]
    async fn answers_are_ignored_outside_ready() {
        let api = Arc::new(Scripted::new(vec![]));
        let mut session = session(api);
        assert!(!session.set_answer(0, "a").unwrap());
        assert!(matches!(
            session.submit().await,
            Err(QuizSessionError::InvalidState { action: "submit", .. })
        ));
        assert!(matches!(
            session.retry_generate().await,
            Err(QuizSessionError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn resume_skips_the_generator() {
        let api = Arc::new(Scripted::new(vec![]));
        let mut session = session(api.clone());

        assert_eq!(session.resume(quiz(vec![question("X", "b")])).unwrap(), 1);
        assert_eq!(session.phase(), &QuizPhase::Ready);
        assert_eq!(session.topics(), ["X".to_string()].as_slice());
        assert_eq!(
            session.generate(vec!["X".into()]).await.unwrap(),
            GenerateOutcome::AlreadyRequested
        );
        assert_eq!(api.calls(), 0);
        assert!(matches!(
            session.resume(quiz(vec![question("X", "a")])),
            Err(QuizSessionError::InvalidState { action: "resume", .. })
        ));
    }

    #[test]
    fn resume_rejects_invalid_quiz() {
        let mut session = session(Arc::new(Scripted::new(vec![])));
        let err = session.resume(quiz(vec![question("X", "z")])).unwrap_err();
        assert!(matches!(err, QuizSessionError::Api(ApiError::Malformed(_))));
        assert_eq!(session.phase(), &QuizPhase::Idle);
    }

    #[tokio::test]
    async fn recheck_failure_keeps_submitted_results() {
        let api = Arc::new(Scripted::new(vec![
            Ok(quiz(vec![question("X", "a")])),
            Err(ApiError::Timeout),
        ]));
        let mut session = session(api);
        session.generate(vec!["X".into()]).await.unwrap();
        session.set_answer(0, "a").unwrap();
        session.submit().await.unwrap();

        assert!(session.recheck().await.is_err());
        assert_eq!(session.phase(), &QuizPhase::Submitted);
        assert!(session.is_submitted());
        assert_eq!(session.state().answer(0), Some("a"));
    }
}
