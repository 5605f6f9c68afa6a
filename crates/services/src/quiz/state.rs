use std::collections::BTreeMap;

use prep_core::model::{QuizQuestion, QuizScore, TopicScore};
use serde::{Deserialize, Serialize};

use crate::error::{QuizSessionError, ValidationError};

/// Outcome of one question after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionReview {
    pub index: usize,
    pub chosen: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Questions, answers and scoring for a single quiz.
///
/// Answers are keyed by question index and always in range. Once submitted,
/// answers are frozen until the question set is replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSessionState {
    questions: Vec<QuizQuestion>,
    current_answers: BTreeMap<usize, String>,
    is_submitted: bool,
    score: Option<QuizScore>,
    topic_scores: Vec<TopicScore>,
}

impl QuizSessionState {
    #[must_use]
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, String> {
        &self.current_answers
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<&str> {
        self.current_answers.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    #[must_use]
    pub fn score(&self) -> Option<QuizScore> {
        self.score
    }

    #[must_use]
    pub fn topic_scores(&self) -> &[TopicScore] {
        &self.topic_scores
    }

    /// Indices that still lack an answer, ascending.
    #[must_use]
    pub fn unanswered(&self) -> Vec<usize> {
        (0..self.questions.len())
            .filter(|index| !self.current_answers.contains_key(index))
            .collect()
    }

    /// Record or overwrite the answer for `index`. Returns `false` once submitted.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::AnswerOutOfRange` if `index` is not a
    /// question of this quiz.
    pub fn set_answer(
        &mut self,
        index: usize,
        option: impl Into<String>,
    ) -> Result<bool, QuizSessionError> {
        if self.is_submitted {
            return Ok(false);
        }
        let len = self.questions.len();
        debug_assert!(index < len, "answer index {index} out of range for {len} questions");
        if index >= len {
            return Err(QuizSessionError::AnswerOutOfRange { index, len });
        }
        self.current_answers.insert(index, option.into());
        Ok(true)
    }

    /// Score every question and freeze the answers.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Unanswered` without changing anything if any
    /// question lacks an answer.
    pub fn submit(&mut self) -> Result<QuizScore, ValidationError> {
        let missing = self.unanswered();
        if !missing.is_empty() {
            return Err(ValidationError::Unanswered { missing });
        }

        let mut topic_scores: Vec<TopicScore> = Vec::new();
        let mut score = QuizScore::default();
        for (index, question) in self.questions.iter().enumerate() {
            let correct = self
                .current_answers
                .get(&index)
                .is_some_and(|chosen| question.is_correct(chosen));

            let entry = match topic_scores.iter().position(|t| t.topic == question.topic) {
                Some(pos) => &mut topic_scores[pos],
                None => {
                    topic_scores.push(TopicScore {
                        topic: question.topic.clone(),
                        correct: 0,
                        total: 0,
                    });
                    let last = topic_scores.len() - 1;
                    &mut topic_scores[last]
                }
            };
            entry.total += 1;
            score.total += 1;
            if correct {
                entry.correct += 1;
                score.correct += 1;
            }
        }

        self.is_submitted = true;
        self.score = Some(score);
        self.topic_scores = topic_scores;
        Ok(score)
    }

    /// Per-question results; empty until submitted.
    #[must_use]
    pub fn reviews(&self) -> Vec<QuestionReview> {
        if !self.is_submitted {
            return Vec::new();
        }
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let chosen = self.current_answers.get(&index).cloned().unwrap_or_default();
                QuestionReview {
                    index,
                    is_correct: question.is_correct(&chosen),
                    chosen,
                    correct_answer: question.correct_answer.clone(),
                }
            })
            .collect()
    }

    /// Swap in a revised question set and start over with no answers.
    pub fn replace_questions(&mut self, questions: Vec<QuizQuestion>) {
        *self = Self::new(questions);
    }
}
