#![forbid(unsafe_code)]

pub mod app_services;
pub mod content_service;
pub mod dashboard_service;
pub mod error;
pub mod handoff;
pub mod quiz;
pub mod study_api;
pub mod topic_selection;

pub use prep_core::Clock;

pub use app_services::AppServices;
pub use content_service::{ContentOrigin, ContentService, StudyContent, placeholder_topic_response};
pub use dashboard_service::{DashboardService, DashboardSnapshot};
pub use error::{
    ApiError, AppServicesError, FailureKind, HandoffError, QuizSessionError, RecoveryAction,
    SessionFailure, ValidationError,
};
pub use handoff::SessionHandoff;
pub use quiz::{GenerateOutcome, QuestionReview, QuizPhase, QuizSession, QuizSessionState, SubmitOutcome};
pub use study_api::{ContentGenerator, QuizGenerator, QuizRechecker, StudyApiClient, StudyApiConfig};
pub use topic_selection::TopicSelection;
