use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quiz_core::model::{Question, Score, SubmissionResult};
use quiz_core::session::{QuizSession, SessionId, SessionProgress, SessionState};

/// Shared session context passed between the quiz loop and bookmark tracker.
///
/// The lock is held only for synchronous transitions, never across a backend call.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    inner: Arc<Mutex<QuizSession>>,
}

impl SessionHandle {
    #[must_use]
    pub fn new(session: QuizSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QuizSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a read-only closure against the session.
    pub fn read<R>(&self, f: impl FnOnce(&QuizSession) -> R) -> R {
        f(&self.lock())
    }

    /// Run a transition against the session.
    pub fn update<R>(&self, f: impl FnOnce(&mut QuizSession) -> R) -> R {
        f(&mut self.lock())
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.read(QuizSession::id)
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        self.read(SessionView::from_session)
    }
}

/// Presentation-agnostic snapshot of the current question.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub session_id: SessionId,
    pub state: SessionState,
    pub progress: Option<SessionProgress>,
    pub question: Option<Question>,
    pub pending_answer: Option<String>,
    pub result: Option<SubmissionResult>,
    pub score: Score,
    pub is_submitting: bool,
    pub is_bookmarked: bool,
    pub bookmark_pending: bool,
}

impl SessionView {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let question = session.current_question().cloned();
        let (is_bookmarked, bookmark_pending) = question.as_ref().map_or((false, false), |q| {
            (
                session.is_bookmarked(q.id()),
                session.bookmarks().is_pending(q.id()),
            )
        });
        Self {
            session_id: session.id(),
            state: session.state(),
            progress: session.progress(),
            question,
            pending_answer: session.pending_answer().map(str::to_string),
            result: session.current_result().cloned(),
            score: session.score(),
            is_submitting: session.is_submitting(),
            is_bookmarked,
            bookmark_pending,
        }
    }
}
