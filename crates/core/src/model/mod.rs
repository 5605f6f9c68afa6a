mod attempt;
mod content;
mod ids;
mod quiz;

pub use attempt::{AttemptError, NewAttempt, QuizAttempt};
pub use content::{Sources, TopicContent, TopicResponse, TopicResult};
pub use ids::{AttemptId, ParseIdError, SessionId, UserIdentity};
pub use quiz::{QuestionError, QuizError, QuizQuestion, QuizResponse, QuizScore, TopicScore};
