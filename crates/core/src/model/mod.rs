mod bookmark;
mod criteria;
mod ids;
mod question;
mod submission;

pub use ids::{ParseIdError, QuestionId, QuestionSetId};

pub use bookmark::{BookmarkSet, BookmarkToggle};
pub use criteria::{
    CriteriaError, DEFAULT_SESSION_LIMIT, MAX_SESSION_LIMIT, SelectionCriteria, TypeFilter,
};
pub use question::{Choice, Question, QuestionError, QuestionRecord, QuestionSet, QuestionType};
pub use submission::{AnswerSubmission, Score, SubmissionResult};
