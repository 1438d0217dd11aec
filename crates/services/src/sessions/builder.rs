use std::sync::Arc;

use backend::QuizBackend;
use quiz_core::model::SelectionCriteria;
use quiz_core::session::QuizSession;

use crate::Clock;
use crate::error::SessionStartError;

/// Turns criteria into a started `QuizSession` with one backend call.
///
/// The backend alone orders, shuffles and filters the pool; the session keeps
/// its order as received.
#[derive(Clone)]
pub struct SessionBuilder {
    clock: Clock,
    backend: Arc<dyn QuizBackend>,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(clock: Clock, backend: Arc<dyn QuizBackend>) -> Self {
        Self { clock, backend }
    }

    /// Build a session for `criteria`.
    ///
    /// `known_count` is the estimator's last resolved count; `None` means it has
    /// not resolved yet and the backend decides.
    ///
    /// # Errors
    ///
    /// Returns `SessionStartError::NoMatch` without a backend call when the
    /// selection is empty or the known count is zero, and
    /// `SessionStartError::Backend` when the backend call fails.
    pub async fn start(
        &self,
        criteria: &SelectionCriteria,
        known_count: Option<u32>,
    ) -> Result<QuizSession, SessionStartError> {
        if !criteria.has_pool() || known_count == Some(0) {
            return Err(SessionStartError::NoMatch);
        }

        let questions = self.backend.start(criteria).await.map_err(|err| {
            tracing::warn!(error = %err, "quiz start failed");
            SessionStartError::Backend(err)
        })?;
        let session = QuizSession::from_questions(questions, self.clock.now())?;

        tracing::info!(
            session = session.id().value(),
            questions = session.len(),
            "quiz session started"
        );
        Ok(session)
    }
}
