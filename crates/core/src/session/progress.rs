use chrono::{DateTime, Utc};

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub correct: u32,
}

impl SessionProgress {
    /// `(index + 1) / length`, in `(0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.position as f64 / self.total as f64
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.position == self.total
    }
}

/// Outcome of a finished session, produced by `QuizSession::end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub total_questions: usize,
    pub answered: u32,
    pub correct: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionSummary {
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        (self.answered > 0).then(|| f64::from(self.correct) / f64::from(self.answered))
    }
}
