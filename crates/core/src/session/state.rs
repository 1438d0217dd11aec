use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SessionError;
use crate::model::{
    AnswerSubmission, BookmarkSet, BookmarkToggle, Question, QuestionId, Score, SubmissionResult,
};

use super::progress::{SessionProgress, SessionSummary};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a session, used to drop responses for superseded sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    Unanswered,
    Answered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Active(AnswerState),
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    NotStarted,
    Active,
    Ended,
}

/// Per-index submission state; kept for every question so revisits redisplay results.
#[derive(Debug, Clone, Default)]
struct QuestionSlot {
    draft: Option<String>,
    result: Option<SubmissionResult>,
    in_flight: bool,
    presented_at: Option<DateTime<Utc>>,
}

//
// ─── TICKETS ───────────────────────────────────────────────────────────────────
//

/// Issued by `begin_submit`; hand it back with the backend's response.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    session: SessionId,
    index: usize,
    submission: AnswerSubmission,
}

impl SubmitTicket {
    #[must_use]
    pub fn submission(&self) -> &AnswerSubmission {
        &self.submission
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.submission.question_id
    }
}

/// Issued by `begin_bookmark_toggle`; confirm or roll back once the backend answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookmarkTicket {
    session: SessionId,
    toggle: BookmarkToggle,
}

impl BookmarkTicket {
    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.toggle.question_id()
    }

    #[must_use]
    pub fn bookmarked(&self) -> bool {
        self.toggle.bookmarked()
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Quiz session context: question order, position, per-question results, score and bookmarks.
///
/// All mutation goes through the transition methods below. Backend calls are split into
/// a `begin_*` step that returns a ticket and a completion step that consumes it, so the
/// session never awaits anything itself.
pub struct QuizSession {
    id: SessionId,
    lifecycle: Lifecycle,
    questions: Vec<Question>,
    slots: Vec<QuestionSlot>,
    index: usize,
    score: Score,
    bookmarks: BookmarkSet,
    started_at: Option<DateTime<Utc>>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    /// A session in `NotStarted`, waiting for its question list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::next(),
            lifecycle: Lifecycle::NotStarted,
            questions: Vec::new(),
            slots: Vec::new(),
            index: 0,
            score: Score::default(),
            bookmarks: BookmarkSet::new(),
            started_at: None,
        }
    }

    /// Create and start a session in one step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn from_questions(
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new();
        session.start(questions, now)?;
        Ok(session)
    }

    /// `NotStarted → Active(unanswered)` at index 0 with a zero score.
    ///
    /// The question order is kept exactly as given.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` / `Ended` outside `NotStarted`,
    /// and `SessionError::Empty` for an empty question list.
    pub fn start(&mut self, questions: Vec<Question>, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.lifecycle {
            Lifecycle::NotStarted => {}
            Lifecycle::Active => return Err(SessionError::AlreadyStarted),
            Lifecycle::Ended => return Err(SessionError::Ended),
        }
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        self.slots = vec![QuestionSlot::default(); questions.len()];
        self.questions = questions;
        self.index = 0;
        self.score = Score::default();
        self.lifecycle = Lifecycle::Active;
        self.started_at = Some(now);
        self.present_current(now);
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.lifecycle {
            Lifecycle::NotStarted => SessionState::NotStarted,
            Lifecycle::Ended => SessionState::Ended,
            Lifecycle::Active => {
                if self.slots.get(self.index).is_some_and(|s| s.result.is_some()) {
                    SessionState::Active(AnswerState::Answered)
                } else {
                    SessionState::Active(AnswerState::Unanswered)
                }
            }
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    /// Answer staged for the current question, if any.
    #[must_use]
    pub fn pending_answer(&self) -> Option<&str> {
        self.slots.get(self.index).and_then(|s| s.draft.as_deref())
    }

    /// Stored result of the current question, if it was submitted.
    #[must_use]
    pub fn current_result(&self) -> Option<&SubmissionResult> {
        self.result_at(self.index)
    }

    #[must_use]
    pub fn result_at(&self, index: usize) -> Option<&SubmissionResult> {
        self.slots.get(index).and_then(|s| s.result.as_ref())
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.slots.get(self.index).is_some_and(|s| s.in_flight)
    }

    /// Number of indices with a stored result; always equals `score().total()`.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|s| s.result.is_some()).count()
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn bookmarks(&self) -> &BookmarkSet {
        &self.bookmarks
    }

    #[must_use]
    pub fn is_bookmarked(&self, id: QuestionId) -> bool {
        self.bookmarks.contains(id)
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Progress for an active session.
    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        if !self.is_active() {
            return None;
        }
        Some(SessionProgress {
            position: self.index + 1,
            total: self.questions.len(),
            answered: self.answered_count(),
            correct: self.score.correct(),
        })
    }

    /// Stage an answer (choice label or free text) for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyAnswered` once the question has a result,
    /// `SessionError::SubmissionInFlight` while grading is pending, and
    /// `SessionError::UnknownChoice` for a label the question does not offer.
    pub fn select_answer(&mut self, answer: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_active()?;
        let answer = answer.into();
        let question = self
            .questions
            .get(self.index)
            .ok_or(SessionError::NotStarted)?;
        let slot = self
            .slots
            .get_mut(self.index)
            .ok_or(SessionError::NotStarted)?;

        if slot.result.is_some() {
            return Err(SessionError::AlreadyAnswered);
        }
        if slot.in_flight {
            return Err(SessionError::SubmissionInFlight);
        }

        let staged = if question.has_choices() {
            let label = answer.trim();
            if !label.is_empty() && question.choice(label).is_none() {
                return Err(SessionError::UnknownChoice {
                    question_id: question.id(),
                    label: label.to_owned(),
                });
            }
            label.to_owned()
        } else {
            answer
        };
        slot.draft = Some(staged);
        Ok(())
    }

    /// Mark the current question as being graded and build the backend payload.
    ///
    /// `now` is used to compute time spent since the question was presented.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyAnswered` for an answered question,
    /// `SessionError::SubmissionInFlight` if a submission is already pending, and
    /// `SessionError::EmptyAnswer` when nothing non-blank is staged.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Result<SubmitTicket, SessionError> {
        self.ensure_active()?;
        let index = self.index;
        let question_id = self
            .questions
            .get(index)
            .map(Question::id)
            .ok_or(SessionError::NotStarted)?;
        let slot = self.slots.get_mut(index).ok_or(SessionError::NotStarted)?;

        if slot.result.is_some() {
            return Err(SessionError::AlreadyAnswered);
        }
        if slot.in_flight {
            return Err(SessionError::SubmissionInFlight);
        }
        let user_answer = slot
            .draft
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(SessionError::EmptyAnswer)?
            .to_owned();

        let time_spent = slot
            .presented_at
            .and_then(|at| (now - at).to_std().ok());
        slot.in_flight = true;

        Ok(SubmitTicket {
            session: self.id,
            index,
            submission: AnswerSubmission {
                question_id,
                user_answer,
                time_spent,
            },
        })
    }

    /// Record the backend's grading: `Active(unanswered) → Active(answered)` plus score update.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Ended` if the session ended while grading was in flight
    /// (the result is dropped), and `SessionError::StaleTicket` for a ticket that does
    /// not match a pending submission of this session.
    pub fn complete_submit(
        &mut self,
        ticket: &SubmitTicket,
        result: SubmissionResult,
    ) -> Result<&SubmissionResult, SessionError> {
        self.check_ticket(ticket.session)?;
        let slot = self
            .slots
            .get_mut(ticket.index)
            .ok_or(SessionError::StaleTicket)?;
        if !slot.in_flight || slot.result.is_some() {
            return Err(SessionError::StaleTicket);
        }

        slot.in_flight = false;
        self.score.record(result.is_correct);
        Ok(slot.result.insert(result))
    }

    /// Release a pending submission after a backend failure so the user can retry.
    ///
    /// Returns `false` if the ticket no longer matches anything.
    pub fn abort_submit(&mut self, ticket: &SubmitTicket) -> bool {
        if self.check_ticket(ticket.session).is_err() {
            return false;
        }
        match self.slots.get_mut(ticket.index) {
            Some(slot) if slot.in_flight => {
                slot.in_flight = false;
                true
            }
            _ => false,
        }
    }

    /// Advance to the next question.
    ///
    /// Returns `Ok(false)` on the last question (no-op).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAnswered` if the current question has no result yet.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<bool, SessionError> {
        self.ensure_active()?;
        let slot = self
            .slots
            .get(self.index)
            .ok_or(SessionError::NotStarted)?;
        if slot.in_flight {
            return Err(SessionError::SubmissionInFlight);
        }
        if slot.result.is_none() {
            return Err(SessionError::NotAnswered);
        }
        if self.index + 1 >= self.questions.len() {
            return Ok(false);
        }

        self.index += 1;
        self.present_current(now);
        Ok(true)
    }

    /// Step back one question; an answered question keeps its stored result.
    ///
    /// Returns `Ok(false)` on the first question (no-op). Leaving an unanswered
    /// question discards its staged answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SubmissionInFlight` while the current question is being graded.
    pub fn previous(&mut self, now: DateTime<Utc>) -> Result<bool, SessionError> {
        self.ensure_active()?;
        let slot = self
            .slots
            .get_mut(self.index)
            .ok_or(SessionError::NotStarted)?;
        if slot.in_flight {
            return Err(SessionError::SubmissionInFlight);
        }
        if self.index == 0 {
            return Ok(false);
        }
        if slot.result.is_none() {
            slot.draft = None;
        }

        self.index -= 1;
        self.present_current(now);
        Ok(true)
    }

    /// Any state → `Ended`. Questions, results and bookmarks are discarded.
    ///
    /// Returns a summary when the session was active.
    pub fn end(&mut self, now: DateTime<Utc>) -> Option<SessionSummary> {
        let summary = match (self.lifecycle, self.started_at) {
            (Lifecycle::Active, Some(started_at)) => Some(SessionSummary {
                total_questions: self.questions.len(),
                answered: self.score.total(),
                correct: self.score.correct(),
                started_at,
                ended_at: now,
            }),
            _ => None,
        };

        self.lifecycle = Lifecycle::Ended;
        self.questions.clear();
        self.slots.clear();
        self.index = 0;
        self.bookmarks = BookmarkSet::new();
        summary
    }

    /// Optimistically flip the bookmark of a question in this session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownQuestion` for ids outside the session and
    /// `SessionError::BookmarkPending` while a previous toggle awaits the backend.
    pub fn begin_bookmark_toggle(
        &mut self,
        question_id: QuestionId,
    ) -> Result<BookmarkTicket, SessionError> {
        self.ensure_active()?;
        if !self.questions.iter().any(|q| q.id() == question_id) {
            return Err(SessionError::UnknownQuestion(question_id));
        }
        let toggle = self
            .bookmarks
            .begin_toggle(question_id)
            .ok_or(SessionError::BookmarkPending(question_id))?;
        Ok(BookmarkTicket {
            session: self.id,
            toggle,
        })
    }

    /// Keep the optimistic flip after the backend accepted it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Ended` / `StaleTicket` when the ticket outlived its session.
    pub fn confirm_bookmark(&mut self, ticket: &BookmarkTicket) -> Result<(), SessionError> {
        self.check_ticket(ticket.session)?;
        self.bookmarks.confirm(&ticket.toggle);
        Ok(())
    }

    /// Undo the optimistic flip after the backend refused it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Ended` / `StaleTicket` when the ticket outlived its session.
    pub fn rollback_bookmark(&mut self, ticket: &BookmarkTicket) -> Result<(), SessionError> {
        self.check_ticket(ticket.session)?;
        self.bookmarks.rollback(&ticket.toggle);
        Ok(())
    }

    /// Replace bookmark membership with the backend's list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` / `Ended` outside an active session.
    pub fn hydrate_bookmarks(
        &mut self,
        ids: impl IntoIterator<Item = QuestionId>,
    ) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.bookmarks.hydrate(ids);
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.lifecycle {
            Lifecycle::Active => Ok(()),
            Lifecycle::NotStarted => Err(SessionError::NotStarted),
            Lifecycle::Ended => Err(SessionError::Ended),
        }
    }

    fn check_ticket(&self, session: SessionId) -> Result<(), SessionError> {
        if session != self.id {
            return Err(SessionError::StaleTicket);
        }
        match self.lifecycle {
            Lifecycle::Active => Ok(()),
            Lifecycle::Ended => Err(SessionError::Ended),
            Lifecycle::NotStarted => Err(SessionError::StaleTicket),
        }
    }

    fn present_current(&mut self, now: DateTime<Utc>) {
        if let Some(slot) = self.slots.get_mut(self.index) {
            if slot.result.is_none() {
                slot.presented_at = Some(now);
            }
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle)
            .field("questions_len", &self.questions.len())
            .field("index", &self.index)
            .field("score", &self.score)
            .field("bookmarks_len", &self.bookmarks.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
