mod bookmarks;
mod builder;
mod handle;
mod workflow;

// Public API of the session subsystem.
pub use bookmarks::BookmarkTracker;
pub use builder::SessionBuilder;
pub use handle::{SessionHandle, SessionView};
pub use workflow::QuizLoopService;
