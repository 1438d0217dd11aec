use std::sync::Arc;

use backend::QuizBackend;
use quiz_core::SessionError;
use quiz_core::model::{QuestionId, SelectionCriteria, SubmissionResult};
use quiz_core::session::SessionSummary;

use super::bookmarks::BookmarkTracker;
use super::builder::SessionBuilder;
use super::handle::SessionHandle;
use crate::Clock;
use crate::error::{BookmarkError, SessionStartError, SubmissionError};

/// Orchestrates the per-question quiz loop against the backend.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    backend: Arc<dyn QuizBackend>,
    builder: SessionBuilder,
    bookmarks: BookmarkTracker,
    hydrate_bookmarks: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, backend: Arc<dyn QuizBackend>) -> Self {
        Self {
            clock,
            builder: SessionBuilder::new(clock, Arc::clone(&backend)),
            bookmarks: BookmarkTracker::new(Arc::clone(&backend)),
            backend,
            hydrate_bookmarks: true,
        }
    }

    /// Whether new sessions load existing bookmarks from the backend.
    #[must_use]
    pub fn with_bookmark_hydration(mut self, hydrate: bool) -> Self {
        self.hydrate_bookmarks = hydrate;
        self
    }

    #[must_use]
    pub fn builder(&self) -> &SessionBuilder {
        &self.builder
    }

    #[must_use]
    pub fn bookmarks(&self) -> &BookmarkTracker {
        &self.bookmarks
    }

    /// Start a session for `criteria`; see `SessionBuilder::start`.
    ///
    /// A bookmark hydration failure is logged and leaves the session with no bookmarks.
    ///
    /// # Errors
    ///
    /// Returns `SessionStartError` when no session could be built.
    pub async fn start_session(
        &self,
        criteria: &SelectionCriteria,
        known_count: Option<u32>,
    ) -> Result<SessionHandle, SessionStartError> {
        let session = self.builder.start(criteria, known_count).await?;
        let handle = SessionHandle::new(session);

        if self.hydrate_bookmarks {
            match self.bookmarks.hydrate(&handle).await {
                Ok(count) => tracing::debug!(count, "bookmarks hydrated"),
                Err(err) => tracing::warn!(error = %err, "bookmark hydration failed"),
            }
        }
        Ok(handle)
    }

    /// Stage an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the question is answered, grading is in flight,
    /// or the label is not one of the question's choices.
    pub fn select_answer(
        &self,
        handle: &SessionHandle,
        answer: impl Into<String>,
    ) -> Result<(), SessionError> {
        handle.update(|s| s.select_answer(answer))
    }

    /// Submit the staged answer and record the backend's grading.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::Session` when the submission is rejected locally
    /// or the session ended while grading, and `SubmissionError::Backend` when the
    /// backend fails (the question stays unanswered and may be retried).
    pub async fn submit(&self, handle: &SessionHandle) -> Result<SubmissionResult, SubmissionError> {
        let now = self.clock.now();
        let ticket = handle.update(|s| s.begin_submit(now))?;

        match self.backend.submit(ticket.submission()).await {
            Ok(result) => {
                let recorded = handle.update(|s| s.complete_submit(&ticket, result).cloned());
                match &recorded {
                    Ok(result) => tracing::debug!(
                        question = %ticket.question_id(),
                        correct = result.is_correct,
                        "answer graded"
                    ),
                    Err(err) => tracing::debug!(error = %err, "grading dropped"),
                }
                Ok(recorded?)
            }
            Err(err) => {
                tracing::warn!(question = %ticket.question_id(), error = %err, "submit failed");
                handle.update(|s| s.abort_submit(&ticket));
                Err(err.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotAnswered` if the current question has no result yet.
    pub fn next(&self, handle: &SessionHandle) -> Result<bool, SessionError> {
        let now = self.clock.now();
        handle.update(|s| s.next(now))
    }

    /// # Errors
    ///
    /// Returns `SessionError` outside an active session or while grading is in flight.
    pub fn previous(&self, handle: &SessionHandle) -> Result<bool, SessionError> {
        let now = self.clock.now();
        handle.update(|s| s.previous(now))
    }

    /// # Errors
    ///
    /// See `BookmarkTracker::toggle`.
    pub async fn toggle_bookmark(
        &self,
        handle: &SessionHandle,
        question_id: QuestionId,
    ) -> Result<bool, BookmarkError> {
        self.bookmarks.toggle(handle, question_id).await
    }

    /// End the session; pending backend responses for it are dropped on arrival.
    pub fn end(&self, handle: &SessionHandle) -> Option<SessionSummary> {
        let now = self.clock.now();
        let summary = handle.update(|s| s.end(now));
        if let Some(summary) = &summary {
            tracing::info!(
                answered = summary.answered,
                correct = summary.correct,
                total = summary.total_questions,
                "quiz session ended"
            );
        }
        summary
    }
}
