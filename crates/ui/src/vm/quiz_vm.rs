use services::{QuizPhase, QuizSession, RecoveryAction, SessionFailure};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionMark {
    Correct,
    Incorrect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub label: String,
    pub selected: bool,
    pub mark: Option<OptionMark>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionVm {
    pub index: usize,
    pub heading: String,
    pub text: String,
    pub topic: String,
    pub options: Vec<OptionVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureVm {
    pub message: String,
    pub action_label: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizVm {
    pub status_label: &'static str,
    pub questions: Vec<QuestionVm>,
    pub answered_label: String,
    pub can_submit: bool,
    pub can_recheck: bool,
    pub score_label: Option<String>,
    pub topic_score_labels: Vec<String>,
    pub failure: Option<FailureVm>,
}

#[must_use]
pub fn map_failure(failure: &SessionFailure) -> FailureVm {
    FailureVm {
        message: failure.message.clone(),
        action_label: match failure.action {
            RecoveryAction::Retry => "Retry",
            RecoveryAction::Reselect => "Back to topics",
        },
    }
}

fn status_label(phase: &QuizPhase) -> &'static str {
    match phase {
        QuizPhase::Idle => "Choose topics to start a quiz",
        QuizPhase::Loading => "Preparing your quiz...",
        QuizPhase::Ready => "Answer every question, then submit",
        QuizPhase::Submitted => "Results",
        QuizPhase::Rechecking => "Rechecking your answers...",
        QuizPhase::Error(_) => "Something went wrong",
    }
}

#[must_use]
pub fn map_quiz(session: &QuizSession) -> QuizVm {
    let state = session.state();
    let total = state.questions().len();
    let submitted = state.is_submitted();

    let questions = state
        .questions()
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let chosen = state.answer(index);
            let options = question
                .options
                .iter()
                .map(|option| {
                    let selected = chosen == Some(option.as_str());
                    let mark = if !submitted {
                        None
                    } else if question.is_correct(option) {
                        Some(OptionMark::Correct)
                    } else if selected {
                        Some(OptionMark::Incorrect)
                    } else {
                        None
                    };
                    OptionVm {
                        label: option.clone(),
                        selected,
                        mark,
                    }
                })
                .collect();
            QuestionVm {
                index,
                heading: format!("Question {} of {total}", index + 1),
                text: question.question.clone(),
                topic: question.topic.clone(),
                options,
            }
        })
        .collect();

    let answered = total - state.unanswered().len();
    let score_label = state.score().map(|score| {
        format!("{}/{} correct ({}%)", score.correct, score.total, score.percent())
    });
    let topic_score_labels = state
        .topic_scores()
        .iter()
        .map(|t| format!("{}: {}/{}", t.topic, t.correct, t.total))
        .collect();

    QuizVm {
        status_label: status_label(session.phase()),
        questions,
        answered_label: format!("{answered}/{total} answered"),
        can_submit: *session.phase() == QuizPhase::Ready && total > 0 && answered == total,
        can_recheck: *session.phase() == QuizPhase::Submitted,
        score_label,
        topic_score_labels,
        failure: session.failure().map(map_failure),
    }
}
