use std::sync::Arc;

use backend::{BackendError, QuizBackend};
use quiz_core::model::QuestionId;

use super::handle::SessionHandle;
use crate::error::BookmarkError;

/// Keeps session bookmarks consistent with the backend.
///
/// Toggles apply locally first, then call the backend; a refusal restores the
/// previous membership.
#[derive(Clone)]
pub struct BookmarkTracker {
    backend: Arc<dyn QuizBackend>,
}

impl BookmarkTracker {
    #[must_use]
    pub fn new(backend: Arc<dyn QuizBackend>) -> Self {
        Self { backend }
    }

    /// Flip the bookmark of `question_id` and return the new membership.
    ///
    /// A `Conflict` on add or `NotFound` on remove means the backend already holds
    /// the requested state, so the flip is kept.
    ///
    /// # Errors
    ///
    /// Returns `BookmarkError::Session` if the toggle cannot begin (unknown question,
    /// previous toggle pending, session not active) and `BookmarkError::Backend`
    /// after rolling back a refused change.
    pub async fn toggle(
        &self,
        handle: &SessionHandle,
        question_id: QuestionId,
    ) -> Result<bool, BookmarkError> {
        let ticket = handle.update(|s| s.begin_bookmark_toggle(question_id))?;
        let bookmarked = ticket.bookmarked();

        let outcome = if bookmarked {
            self.backend.add_bookmark(question_id).await
        } else {
            self.backend.remove_bookmark(question_id).await
        };

        match outcome {
            Ok(()) => {}
            Err(BackendError::Conflict(_)) if bookmarked => {
                tracing::debug!(question = %question_id, "bookmark already present on backend");
            }
            Err(BackendError::NotFound(_)) if !bookmarked => {
                tracing::debug!(question = %question_id, "bookmark already absent on backend");
            }
            Err(err) => {
                tracing::warn!(question = %question_id, error = %err, "bookmark update failed; rolling back");
                if let Err(stale) = handle.update(|s| s.rollback_bookmark(&ticket)) {
                    tracing::debug!(error = %stale, "bookmark rollback dropped");
                }
                return Err(err.into());
            }
        }

        handle.update(|s| s.confirm_bookmark(&ticket))?;
        Ok(bookmarked)
    }

    /// Load the backend's bookmark list into the session.
    ///
    /// Returns how many of the session's questions are bookmarked.
    ///
    /// # Errors
    ///
    /// Returns `BookmarkError::Backend` if the list cannot be fetched, or
    /// `BookmarkError::Session` if the session ended meanwhile.
    pub async fn hydrate(&self, handle: &SessionHandle) -> Result<usize, BookmarkError> {
        let ids = self.backend.list_bookmarks().await?;
        handle.update(|s| -> Result<usize, BookmarkError> {
            let in_session: Vec<QuestionId> = ids
                .into_iter()
                .filter(|id| s.questions().iter().any(|q| q.id() == *id))
                .collect();
            s.hydrate_bookmarks(in_session)?;
            Ok(s.bookmarks().len())
        })
    }
}
