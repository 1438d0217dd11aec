use std::time::Duration;

use crate::model::ids::QuestionId;

/// Payload sent to the backend for grading.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub user_answer: String,
    pub time_spent: Option<Duration>,
}

/// Authoritative grading outcome returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub user_answer: String,
}

/// Running score for a session.
///
/// `correct <= total` always holds; both only grow through `record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    correct: u32,
    total: u32,
}

impl Score {
    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    pub(crate) fn record(&mut self, is_correct: bool) {
        self.total = self.total.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Fraction of answered questions that were correct, `None` before any answer.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        (self.total > 0).then(|| f64::from(self.correct) / f64::from(self.total))
    }
}
