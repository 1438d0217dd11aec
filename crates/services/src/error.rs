//! Shared error types for the services crate.

use thiserror::Error;

use backend::BackendError;
use quiz_core::SessionError;

/// Errors emitted while resolving the matching-question count.
///
/// Never surfaced to the user; the estimator logs it and shows 0.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CountError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted by `SessionBuilder` and `QuizLoopService::start_session`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionStartError {
    #[error("no questions match the selected filters")]
    NoMatch,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl SessionStartError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoMatch => "No questions match the selected filters.".into(),
            Self::Backend(BackendError::NotFound(_)) => {
                "No questions found for these filters. Try widening them.".into()
            }
            Self::Backend(_) => "Could not start the quiz. Please try again.".into(),
            Self::Session(err) => format!("Could not start the quiz: {err}."),
        }
    }
}

/// Errors emitted by `QuizLoopService::submit`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SubmissionError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(SessionError::EmptyAnswer) => "Please choose or type an answer.".into(),
            Self::Session(SessionError::AlreadyAnswered) => {
                "This question has already been answered.".into()
            }
            Self::Session(SessionError::SubmissionInFlight) => {
                "Your answer is still being graded.".into()
            }
            Self::Session(err) => format!("Cannot submit: {err}."),
            Self::Backend(_) => "Could not submit your answer. Please try again.".into(),
        }
    }
}

/// Errors emitted by `BookmarkTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BookmarkError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl BookmarkError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(SessionError::BookmarkPending(_)) => {
                "Still saving the previous bookmark change.".into()
            }
            Self::Session(err) => format!("Cannot change bookmark: {err}."),
            Self::Backend(_) => "Could not update the bookmark.".into(),
        }
    }
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CatalogServiceError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(BackendError::NotFound(detail)) => format!("Not found: {detail}"),
            Self::Backend(_) => "The question catalog is unavailable right now.".into(),
        }
    }
}

/// Errors emitted by `UploadService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UploadServiceError {
    #[error("uploads are not available with this backend")]
    Disabled,
    #[error("unsupported file {0:?}: only .pdf and .docx are accepted")]
    UnsupportedFile(String),
    #[error("content for question generation is empty")]
    EmptyContent,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl UploadServiceError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Disabled => "Uploads need a running quiz server.".into(),
            Self::UnsupportedFile(_) => "Only PDF and DOCX files are supported.".into(),
            Self::EmptyContent => "Please enter some content to generate questions from.".into(),
            Self::Io(err) => format!("Could not read the file: {err}."),
            Self::Backend(_) => "The upload failed. Please try again.".into(),
        }
    }
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
