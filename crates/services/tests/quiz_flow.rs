use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use prep_core::model::{
    NewAttempt, QuizAttempt, QuizQuestion, QuizResponse, QuizScore, UserIdentity,
};
use services::{
    ApiError, GenerateOutcome, QuizGenerator, QuizPhase, QuizRechecker, QuizSession,
    QuizSessionError, ValidationError,
};
use storage::repository::{AttemptRepository, InMemoryRepository, StorageError};

fn question(topic: &str, text: &str, correct: &str) -> QuizQuestion {
    QuizQuestion {
        question: text.into(),
        options: vec!["GraphQL".into(), "REST".into(), "SOAP".into()],
        correct_answer: correct.into(),
        topic: topic.into(),
    }
}

/// Quiz API fake that records what it was sent.
struct FakeQuizApi {
    quiz: QuizResponse,
    revised: QuizResponse,
    generated_for: Mutex<Vec<Vec<String>>>,
    recheck_answers: Mutex<Option<BTreeMap<usize, String>>>,
}

impl FakeQuizApi {
    fn new(quiz: QuizResponse, revised: QuizResponse) -> Arc<Self> {
        Arc::new(Self {
            quiz,
            revised,
            generated_for: Mutex::new(Vec::new()),
            recheck_answers: Mutex::new(None),
        })
    }
}

#[async_trait]
impl QuizGenerator for FakeQuizApi {
    async fn generate_quiz(&self, topics: &[String]) -> Result<QuizResponse, ApiError> {
        self.generated_for.lock().unwrap().push(topics.to_vec());
        Ok(self.quiz.clone())
    }
}

#[async_trait]
impl QuizRechecker for FakeQuizApi {
    async fn recheck_quiz(
        &self,
        _quiz: &QuizResponse,
        answers: &BTreeMap<usize, String>,
    ) -> Result<QuizResponse, ApiError> {
        *self.recheck_answers.lock().unwrap() = Some(answers.clone());
        Ok(self.revised.clone())
    }
}

struct SlowQuizApi;

#[async_trait]
impl QuizGenerator for SlowQuizApi {
    async fn generate_quiz(&self, _topics: &[String]) -> Result<QuizResponse, ApiError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(ApiError::Network("never".into()))
    }
}

#[async_trait]
impl QuizRechecker for SlowQuizApi {
    async fn recheck_quiz(
        &self,
        _quiz: &QuizResponse,
        _answers: &BTreeMap<usize, String>,
    ) -> Result<QuizResponse, ApiError> {
        Err(ApiError::Network("never".into()))
    }
}

struct ReadOnlyStore;

#[async_trait]
impl AttemptRepository for ReadOnlyStore {
    async fn insert_attempts(
        &self,
        _attempts: &[NewAttempt],
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }

    async fn list_attempts(&self, _user: &UserIdentity) -> Result<Vec<QuizAttempt>, StorageError> {
        Ok(Vec::new())
    }
}

fn me() -> UserIdentity {
    UserIdentity::new("student@example.com").unwrap()
}

fn two_question_quiz() -> QuizResponse {
    QuizResponse {
        topics: vec!["X".into()],
        questions: vec![
            question("X", "Which API does Experience Edge expose?", "GraphQL"),
            question("X", "Which style does the Admin API use?", "REST"),
        ],
    }
}

#[tokio::test]
async fn perfect_quiz_persists_one_attempt_per_topic() {
    let api = FakeQuizApi::new(two_question_quiz(), two_question_quiz());
    let repo = InMemoryRepository::new();
    let mut session = QuizSession::new(me(), api.clone(), api.clone(), Arc::new(repo.clone()));

    session.generate(vec!["X".into()]).await.unwrap();
    assert_eq!(session.phase(), &QuizPhase::Ready);
    assert!(session.state().answers().is_empty());
    assert_eq!(api.generated_for.lock().unwrap().as_slice(), &[vec!["X".to_string()]]);

    assert!(session.set_answer(0, "GraphQL").unwrap());
    assert!(session.set_answer(1, "REST").unwrap());
    let outcome = session.submit().await.unwrap();

    assert_eq!(outcome.score, QuizScore { correct: 2, total: 2 });
    assert!(outcome.persisted);
    assert_eq!(session.phase(), &QuizPhase::Submitted);

    let rows = repo.list_attempts(&me()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].topic(), "X");
    assert_eq!(rows[0].score(), 2);
    assert_eq!(rows[0].total_questions(), 2);
    assert_eq!(rows[0].user(), &me());
}

#[tokio::test]
async fn submit_with_missing_answer_changes_nothing() {
    let mut quiz = two_question_quiz();
    quiz.questions.push(question("Y", "Which protocol is legacy?", "SOAP"));
    let api = FakeQuizApi::new(quiz.clone(), quiz);
    let repo = InMemoryRepository::new();
    let mut session = QuizSession::new(me(), api.clone(), api, Arc::new(repo.clone()));

    session.generate(vec!["X".into(), "Y".into()]).await.unwrap();
    session.set_answer(0, "GraphQL").unwrap();
    session.set_answer(2, "SOAP").unwrap();

    let err = session.submit().await.unwrap_err();
    assert_eq!(
        err,
        QuizSessionError::Validation(ValidationError::Unanswered { missing: vec![1] })
    );
    assert_eq!(session.phase(), &QuizPhase::Ready);
    assert!(!session.is_submitted());
    assert_eq!(session.state().answers().len(), 2);
    assert!(repo.list_attempts(&me()).await.unwrap().is_empty());
}

#[tokio::test]
async fn recheck_resets_answers_and_adopts_revised_quiz() {
    let revised = QuizResponse {
        topics: vec!["Y".into()],
        questions: vec![
            question("Y", "Revised: which API does Experience Edge expose?", "GraphQL"),
            question("Y", "Revised: which style does the Admin API use?", "REST"),
            question("Y", "Revised: which protocol is legacy?", "SOAP"),
        ],
    };
    let api = FakeQuizApi::new(two_question_quiz(), revised.clone());
    let mut session = QuizSession::new(me(), api.clone(), api.clone(), Arc::new(InMemoryRepository::new()));

    session.generate(vec!["X".into()]).await.unwrap();
    session.set_answer(0, "REST").unwrap();
    session.set_answer(1, "REST").unwrap();
    session.submit().await.unwrap();

    let count = session.recheck().await.unwrap();
    assert_eq!(count, 3);
    assert_eq!(session.phase(), &QuizPhase::Ready);
    assert!(!session.is_submitted());
    assert!(session.state().answers().is_empty());
    assert_eq!(session.questions(), revised.questions.as_slice());
    assert_eq!(session.topics(), ["Y".to_string()].as_slice());

    let sent = api.recheck_answers.lock().unwrap().clone().unwrap();
    assert_eq!(sent.get(&0).map(String::as_str), Some("REST"));
    assert_eq!(sent.len(), 2);
}

#[tokio::test]
async fn store_failure_does_not_undo_submission() {
    let api = FakeQuizApi::new(two_question_quiz(), two_question_quiz());
    let mut session = QuizSession::new(me(), api.clone(), api, Arc::new(ReadOnlyStore));

    session.generate(vec!["X".into()]).await.unwrap();
    session.set_answer(0, "GraphQL").unwrap();
    session.set_answer(1, "SOAP").unwrap();
    let outcome = session.submit().await.unwrap();

    assert!(!outcome.persisted);
    assert_eq!(outcome.score, QuizScore { correct: 1, total: 2 });
    assert!(session.is_submitted());
    assert_eq!(session.reviews().iter().filter(|r| r.is_correct).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_generation_times_out_without_fallback_questions() {
    let api = Arc::new(SlowQuizApi);
    let mut session = QuizSession::new(me(), api.clone(), api, Arc::new(InMemoryRepository::new()))
        .with_timeout(Duration::from_secs(5));

    let err = session.generate(vec!["X".into()]).await.unwrap_err();
    assert_eq!(err, QuizSessionError::Api(ApiError::Timeout));
    assert!(session.questions().is_empty());
    match session.phase() {
        QuizPhase::Error(failure) => assert_eq!(failure.kind, services::FailureKind::NetworkFailure),
        other => panic!("unexpected phase {other:?}"),
    }
    assert_eq!(
        session.generate(vec!["X".into()]).await.unwrap(),
        GenerateOutcome::AlreadyRequested
    );
}
