use thiserror::Error;

use crate::model::{CriteriaError, QuestionError, QuestionId};

/// Rejections raised by quiz session transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has not started")]
    NotStarted,

    #[error("session already started")]
    AlreadyStarted,

    #[error("session has ended")]
    Ended,

    #[error("no questions available for session")]
    Empty,

    #[error("question already answered")]
    AlreadyAnswered,

    #[error("current question has not been answered yet")]
    NotAnswered,

    #[error("answer cannot be empty")]
    EmptyAnswer,

    #[error("{label:?} is not a choice of question {question_id}")]
    UnknownChoice {
        question_id: QuestionId,
        label: String,
    },

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("bookmark toggle for question {0} is still pending")]
    BookmarkPending(QuestionId),

    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),

    #[error("response belongs to a superseded session or question")]
    StaleTicket,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
