mod session;
mod state;

pub use session::{GenerateOutcome, QuizPhase, QuizSession, SubmitOutcome};
pub use state::{QuestionReview, QuizSessionState};
