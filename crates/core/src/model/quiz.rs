use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::percent::score_percent;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("question has no options")]
    NoOptions,

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("correct answer is not one of the options: {0}")]
    AnswerNotAnOption(String),

    #[error("question topic cannot be empty")]
    EmptyTopic,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz contains no questions")]
    NoQuestions,

    #[error("question {index} is invalid: {source}")]
    Question {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question as supplied by the quiz generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub topic: String,
}

impl QuizQuestion {
    /// Check the option invariants: non-empty, unique, and containing the answer.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` found.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.question.trim().is_empty() {
            return Err(QuestionError::EmptyQuestion);
        }
        if self.topic.trim().is_empty() {
            return Err(QuestionError::EmptyTopic);
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption(option.clone()));
            }
        }
        if !seen.contains(self.correct_answer.as_str()) {
            return Err(QuestionError::AnswerNotAnOption(self.correct_answer.clone()));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_correct(&self, chosen: &str) -> bool {
        self.correct_answer == chosen
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Payload returned by quiz generation and recheck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResponse {
    pub topics: Vec<String>,
    pub questions: Vec<QuizQuestion>,
}

impl QuizResponse {
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty quiz and
    /// `QuizError::Question` for the first malformed question.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        for (index, question) in self.questions.iter().enumerate() {
            question
                .validate()
                .map_err(|source| QuizError::Question { index, source })?;
        }
        Ok(())
    }
}

//
// ─── SCORES ────────────────────────────────────────────────────────────────────
//

/// Overall result of a submitted quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
}

impl QuizScore {
    #[must_use]
    pub fn percent(&self) -> u8 {
        score_percent(u64::from(self.correct), u64::from(self.total))
    }
}

/// Correct/total for the questions of one topic within a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic: String,
    pub correct: u32,
    pub total: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(topic: &str, correct: &str) -> QuizQuestion {
        QuizQuestion {
            question: format!("About {topic}?"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct.into(),
            topic: topic.into(),
        }
    }

    #[test]
    fn valid_question_passes() {
        assert_eq!(question("X", "b").validate(), Ok(()));
        assert!(question("X", "b").is_correct("b"));
        assert!(!question("X", "b").is_correct("a"));
    }

    #[test]
    fn rejects_answer_outside_options() {
        let err = question("X", "z").validate().unwrap_err();
        assert_eq!(err, QuestionError::AnswerNotAnOption("z".into()));
    }

    #[test]
    fn rejects_duplicate_and_missing_options() {
        let mut q = question("X", "a");
        q.options.push("a".into());
        assert_eq!(q.validate(), Err(QuestionError::DuplicateOption("a".into())));

        q.options.clear();
        assert_eq!(q.validate(), Err(QuestionError::NoOptions));
    }

    #[test]
    fn quiz_validation_reports_index() {
        let quiz = QuizResponse {
            topics: vec!["X".into()],
            questions: vec![question("X", "a"), question("X", "nope")],
        };
        match quiz.validate() {
            Err(QuizError::Question { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected {other:?}"),
        }

        let empty = QuizResponse {
            topics: vec!["X".into()],
            questions: Vec::new(),
        };
        assert_eq!(empty.validate(), Err(QuizError::NoQuestions));
    }

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"{
            "topics": ["X"],
            "questions": [
                {"question": "Q?", "options": ["a", "b"], "correct_answer": "b", "topic": "X"}
            ]
        }"#;
        let quiz: QuizResponse = serde_json::from_str(json).unwrap();
        assert_eq!(quiz.questions[0].correct_answer, "b");
        assert_eq!(quiz.validate(), Ok(()));
    }

    #[test]
    fn score_percent_rounds() {
        let score = QuizScore { correct: 2, total: 3 };
        assert_eq!(score.percent(), 67);
        assert_eq!(QuizScore::default().percent(), 0);
    }
}
