#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backend::{BackendError, QuizBackend};
use quiz_core::model::{
    AnswerSubmission, Choice, Question, QuestionId, QuestionType, SelectionCriteria,
    SubmissionResult,
};

/// Scripted quiz backend for exercising the services without a server.
#[derive(Default)]
pub struct ScriptedBackend {
    /// Count per selected set id; summed over the selection.
    pub counts: HashMap<u64, u32>,
    /// Extra latency of a count request, keyed by the first selected set id.
    pub count_delays: HashMap<u64, Duration>,
    pub questions: Vec<Question>,
    pub answer_key: HashMap<QuestionId, String>,
    pub submit_delay: Duration,
    pub fail_next_submits: AtomicUsize,
    pub fail_bookmarks: bool,
    pub conflict_on_add: bool,
    pub fail_removes: bool,
    pub fail_bookmark_list: bool,
    pub server_bookmarks: Mutex<BTreeSet<QuestionId>>,
    pub count_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn with_questions(questions: Vec<Question>, answers: &[(u64, &str)]) -> Self {
        Self {
            questions,
            answer_key: answers
                .iter()
                .map(|(id, answer)| (QuestionId::new(*id), (*answer).to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn server_bookmarks(&self) -> BTreeSet<QuestionId> {
        self.server_bookmarks.lock().unwrap().clone()
    }
}

pub fn mc_question(id: u64, stem: &str) -> Question {
    Question::new(
        QuestionId::new(id),
        QuestionType::MultipleChoice,
        stem,
        vec![
            Choice::new("A", "first"),
            Choice::new("B", "second"),
            Choice::new("C", "third"),
        ],
    )
    .unwrap()
}

pub fn short_question(id: u64, stem: &str) -> Question {
    Question::new(QuestionId::new(id), QuestionType::ShortAnswer, stem, Vec::new()).unwrap()
}

#[async_trait]
impl QuizBackend for ScriptedBackend {
    async fn count(&self, criteria: &SelectionCriteria) -> Result<u32, BackendError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let first = criteria.set_ids().iter().next().map(|id| id.value());
        if let Some(delay) = first.and_then(|id| self.count_delays.get(&id)) {
            tokio::time::sleep(*delay).await;
        }
        let mut total = 0;
        for id in criteria.set_ids() {
            match self.counts.get(&id.value()) {
                Some(count) => total += count,
                None => return Err(BackendError::Connection("count unavailable".into())),
            }
        }
        Ok(total)
    }

    async fn start(&self, _criteria: &SelectionCriteria) -> Result<Vec<Question>, BackendError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.questions.is_empty() {
            return Err(BackendError::NotFound(
                "No questions found matching criteria".into(),
            ));
        }
        Ok(self.questions.clone())
    }

    async fn submit(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmissionResult, BackendError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        let should_fail = self
            .fail_next_submits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(BackendError::Rejected {
                status: 500,
                detail: "grading unavailable".into(),
            });
        }
        let correct_answer = self
            .answer_key
            .get(&submission.question_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound("Question not found".into()))?;
        Ok(SubmissionResult {
            is_correct: correct_answer.eq_ignore_ascii_case(submission.user_answer.trim()),
            correct_answer,
            explanation: None,
            user_answer: submission.user_answer.clone(),
        })
    }

    async fn add_bookmark(&self, id: QuestionId) -> Result<(), BackendError> {
        if self.fail_bookmarks {
            return Err(BackendError::Connection("offline".into()));
        }
        if self.conflict_on_add {
            return Err(BackendError::Conflict("Question already bookmarked".into()));
        }
        self.server_bookmarks.lock().unwrap().insert(id);
        Ok(())
    }

    async fn remove_bookmark(&self, id: QuestionId) -> Result<(), BackendError> {
        if self.fail_bookmarks || self.fail_removes {
            return Err(BackendError::Connection("offline".into()));
        }
        if self.server_bookmarks.lock().unwrap().remove(&id) {
            Ok(())
        } else {
            Err(BackendError::NotFound("Bookmark not found".into()))
        }
    }

    async fn list_bookmarks(&self) -> Result<Vec<QuestionId>, BackendError> {
        if self.fail_bookmark_list {
            return Err(BackendError::Connection("offline".into()));
        }
        Ok(self.server_bookmarks().into_iter().collect())
    }
}
