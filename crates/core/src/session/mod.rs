mod progress;
mod state;

pub use progress::{SessionProgress, SessionSummary};
pub use state::{AnswerState, BookmarkTicket, QuizSession, SessionId, SessionState, SubmitTicket};
