use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::Clock;
use quiz_core::model::{
    AnswerSubmission, Choice, Question, QuestionId, QuestionRecord, QuestionSet, QuestionSetId,
    QuestionType, SelectionCriteria, SubmissionResult,
};
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::api::{
    BackendError, CatalogBackend, MAX_QUESTION_PAGE, QuestionQuery, QuizBackend,
};

/// Correct rate below which a question counts as frequently wrong for session pools.
pub const FREQUENTLY_WRONG_THRESHOLD: f64 = 0.5;

/// Minimum attempts before the catalog lists a question as frequently wrong.
const CATALOG_MIN_ATTEMPTS: usize = 2;

/// Question to import into the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub kind: QuestionType,
    pub stem: String,
    pub answer: String,
    pub explanation: Option<String>,
    pub choices: Vec<Choice>,
}

impl NewQuestion {
    #[must_use]
    pub fn multiple_choice(
        stem: impl Into<String>,
        choices: Vec<Choice>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            kind: QuestionType::MultipleChoice,
            stem: stem.into(),
            answer: answer.into(),
            explanation: None,
            choices,
        }
    }

    #[must_use]
    pub fn short_answer(stem: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            kind: QuestionType::ShortAnswer,
            stem: stem.into(),
            answer: answer.into(),
            explanation: None,
            choices: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// A named set of questions to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestionSet {
    pub name: String,
    pub description: Option<String>,
    pub file_name: Option<String>,
    pub questions: Vec<NewQuestion>,
}

impl NewQuestionSet {
    #[must_use]
    pub fn new(name: impl Into<String>, questions: Vec<NewQuestion>) -> Self {
        Self {
            name: name.into(),
            description: None,
            file_name: None,
            questions,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredQuestion {
    record: QuestionRecord,
    set_id: QuestionSetId,
    order_index: usize,
}

/// One graded submission, as recorded by [`InMemoryBackend::submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub user_answer: String,
    pub time_spent: Option<Duration>,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    sets: BTreeMap<QuestionSetId, QuestionSet>,
    questions: BTreeMap<QuestionId, StoredQuestion>,
    bookmarks: BTreeSet<QuestionId>,
    attempts: Vec<Attempt>,
    next_set_id: u64,
    next_question_id: u64,
}

impl Inner {
    /// `(correct rate, attempts)` for a question that has been attempted.
    #[allow(clippy::cast_precision_loss)]
    fn correct_rate(&self, id: QuestionId) -> Option<(f64, usize)> {
        let (correct, total) = self
            .attempts
            .iter()
            .filter(|a| a.question_id == id)
            .fold((0_usize, 0_usize), |(c, t), a| {
                (c + usize::from(a.is_correct), t + 1)
            });
        (total > 0).then(|| (correct as f64 / total as f64, total))
    }

    fn is_frequently_wrong(&self, id: QuestionId, threshold: f64, min_attempts: usize) -> bool {
        self.correct_rate(id)
            .is_some_and(|(rate, attempts)| attempts >= min_attempts && rate < threshold)
    }

    /// Questions eligible under the criteria, in catalog order.
    fn pool(&self, criteria: &SelectionCriteria) -> Vec<&StoredQuestion> {
        if !criteria.has_pool() {
            return Vec::new();
        }
        let mut pool: Vec<&StoredQuestion> = self
            .questions
            .values()
            .filter(|q| criteria.set_ids().contains(&q.set_id))
            .filter(|q| criteria.type_filter().matches(q.record.question.kind()))
            .filter(|q| !criteria.bookmarked_only() || self.bookmarks.contains(&q.record.id()))
            .filter(|q| {
                !criteria.frequently_wrong_only()
                    || self.is_frequently_wrong(q.record.id(), FREQUENTLY_WRONG_THRESHOLD, 1)
            })
            .collect();
        pool.sort_by_key(|q| (q.set_id, q.order_index, q.record.id()));
        pool
    }
}

/// Local quiz backend with the same pool, grading and bookmark rules as the server.
///
/// Useful for tests and offline demos; state lives only as long as the value.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    clock: Clock,
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, BackendError> {
        self.inner
            .lock()
            .map_err(|e| BackendError::Connection(e.to_string()))
    }

    /// Import a named set and return its id.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Invalid` if any question fails validation.
    pub fn import_set(&self, set: NewQuestionSet) -> Result<QuestionSetId, BackendError> {
        let now = self.clock.now();
        let mut inner = self.lock()?;

        inner.next_set_id += 1;
        let set_id = QuestionSetId::new(inner.next_set_id);

        let mut stored = Vec::with_capacity(set.questions.len());
        for (order_index, draft) in set.questions.into_iter().enumerate() {
            let id = QuestionId::new(inner.next_question_id + 1 + order_index as u64);
            let question = Question::new(id, draft.kind, draft.stem, draft.choices)
                .map_err(|e| BackendError::Invalid(e.to_string()))?;
            stored.push(StoredQuestion {
                record: QuestionRecord {
                    question,
                    set_id: Some(set_id),
                    answer: draft.answer,
                    explanation: draft.explanation.filter(|e| !e.trim().is_empty()),
                },
                set_id,
                order_index,
            });
        }

        inner.next_question_id += stored.len() as u64;
        for question in stored {
            inner.questions.insert(question.record.id(), question);
        }
        inner.sets.insert(
            set_id,
            QuestionSet {
                id: set_id,
                name: set.name,
                description: set.description,
                file_name: set.file_name,
                created_at: now,
            },
        );
        Ok(set_id)
    }

    /// Number of graded attempts recorded so far.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Connection` if the state lock is poisoned.
    pub fn attempt_count(&self) -> Result<usize, BackendError> {
        Ok(self.lock()?.attempts.len())
    }

    /// Attempt history of one question, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Connection` if the state lock is poisoned.
    pub fn attempts_for(&self, id: QuestionId) -> Result<Vec<Attempt>, BackendError> {
        Ok(self
            .lock()?
            .attempts
            .iter()
            .filter(|a| a.question_id == id)
            .cloned()
            .collect())
    }
}

fn shuffled_session(
    pool: Vec<StoredQuestion>,
    criteria: &SelectionCriteria,
) -> Result<Vec<Question>, BackendError> {
    let mut rng = rand::rng();
    let mut pool = pool;
    if criteria.shuffle_questions() {
        pool.shuffle(&mut rng);
    }
    pool.truncate(usize::try_from(criteria.limit()).unwrap_or(usize::MAX));

    pool.into_iter()
        .map(|stored| {
            let question = stored.record.question;
            let mut choices = question.choices().to_vec();
            if criteria.shuffle_choices() {
                choices.shuffle(&mut rng);
            }
            Question::new(question.id(), question.kind(), question.stem(), choices)
                .map_err(|e| BackendError::Serialization(e.to_string()))
        })
        .collect()
}

fn grade(answer_key: &str, user_answer: &str) -> bool {
    answer_key.trim().to_lowercase() == user_answer.trim().to_lowercase()
}

#[async_trait]
impl QuizBackend for InMemoryBackend {
    async fn count(&self, criteria: &SelectionCriteria) -> Result<u32, BackendError> {
        let inner = self.lock()?;
        let len = inner.pool(criteria).len();
        Ok(u32::try_from(len).unwrap_or(u32::MAX))
    }

    async fn start(&self, criteria: &SelectionCriteria) -> Result<Vec<Question>, BackendError> {
        let pool: Vec<StoredQuestion> = {
            let inner = self.lock()?;
            inner.pool(criteria).into_iter().cloned().collect()
        };
        if pool.is_empty() {
            return Err(BackendError::NotFound(
                "No questions found matching criteria".into(),
            ));
        }
        shuffled_session(pool, criteria)
    }

    async fn submit(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmissionResult, BackendError> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        let record = inner
            .questions
            .get(&submission.question_id)
            .map(|q| q.record.clone())
            .ok_or_else(|| BackendError::NotFound("Question not found".into()))?;

        let is_correct = grade(&record.answer, &submission.user_answer);
        inner.attempts.push(Attempt {
            question_id: submission.question_id,
            is_correct,
            user_answer: submission.user_answer.clone(),
            time_spent: submission.time_spent,
            attempted_at: now,
        });

        Ok(SubmissionResult {
            is_correct,
            correct_answer: record.answer,
            explanation: record.explanation,
            user_answer: submission.user_answer.clone(),
        })
    }

    async fn add_bookmark(&self, id: QuestionId) -> Result<(), BackendError> {
        let mut inner = self.lock()?;
        if !inner.questions.contains_key(&id) {
            return Err(BackendError::NotFound("Question not found".into()));
        }
        if !inner.bookmarks.insert(id) {
            return Err(BackendError::Conflict("Question already bookmarked".into()));
        }
        Ok(())
    }

    async fn remove_bookmark(&self, id: QuestionId) -> Result<(), BackendError> {
        let mut inner = self.lock()?;
        if !inner.bookmarks.remove(&id) {
            return Err(BackendError::NotFound("Bookmark not found".into()));
        }
        Ok(())
    }

    async fn list_bookmarks(&self) -> Result<Vec<QuestionId>, BackendError> {
        let inner = self.lock()?;
        Ok(inner.bookmarks.iter().copied().collect())
    }
}

#[async_trait]
impl CatalogBackend for InMemoryBackend {
    async fn list_sets(&self) -> Result<Vec<QuestionSet>, BackendError> {
        let inner = self.lock()?;
        let mut sets: Vec<QuestionSet> = inner.sets.values().cloned().collect();
        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(sets)
    }

    async fn list_questions(
        &self,
        query: &QuestionQuery,
    ) -> Result<Vec<QuestionRecord>, BackendError> {
        if query.limit > MAX_QUESTION_PAGE {
            return Err(BackendError::Invalid(format!(
                "limit must be at most {MAX_QUESTION_PAGE}"
            )));
        }
        let inner = self.lock()?;
        let mut matching: Vec<&StoredQuestion> = inner
            .questions
            .values()
            .filter(|q| query.set_id.is_none_or(|set| q.set_id == set))
            .filter(|q| {
                query
                    .question_type
                    .is_none_or(|kind| q.record.question.kind() == kind)
            })
            .collect();
        matching.sort_by_key(|q| (q.order_index, q.record.id()));

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|q| q.record.clone())
            .collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<QuestionRecord, BackendError> {
        let inner = self.lock()?;
        inner
            .questions
            .get(&id)
            .map(|q| q.record.clone())
            .ok_or_else(|| BackendError::NotFound("Question not found".into()))
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), BackendError> {
        let mut inner = self.lock()?;
        if inner.questions.remove(&id).is_none() {
            return Err(BackendError::NotFound("Question not found".into()));
        }
        inner.bookmarks.remove(&id);
        inner.attempts.retain(|a| a.question_id != id);
        Ok(())
    }

    async fn delete_set(&self, id: QuestionSetId) -> Result<(), BackendError> {
        let mut inner = self.lock()?;
        if inner.sets.remove(&id).is_none() {
            return Err(BackendError::NotFound("Question set not found".into()));
        }
        let removed: BTreeSet<QuestionId> = inner
            .questions
            .values()
            .filter(|q| q.set_id == id)
            .map(|q| q.record.id())
            .collect();
        inner.questions.retain(|qid, _| !removed.contains(qid));
        inner.bookmarks.retain(|qid| !removed.contains(qid));
        inner.attempts.retain(|a| !removed.contains(&a.question_id));
        Ok(())
    }

    async fn frequently_wrong(&self, threshold: f64) -> Result<Vec<QuestionRecord>, BackendError> {
        let inner = self.lock()?;
        Ok(inner
            .questions
            .values()
            .filter(|q| inner.is_frequently_wrong(q.record.id(), threshold, CATALOG_MIN_ATTEMPTS))
            .map(|q| q.record.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capitals() -> NewQuestionSet {
        NewQuestionSet::new(
            "Capitals",
            vec![
                NewQuestion::multiple_choice(
                    "Capital of France?",
                    vec![Choice::new("A", "Paris"), Choice::new("B", "Lyon")],
                    "A",
                ),
                NewQuestion::short_answer("Capital of Japan?", "Tokyo")
                    .with_explanation("Tokyo has been the capital since 1868."),
            ],
        )
    }

    #[tokio::test]
    async fn grading_is_trimmed_and_case_insensitive() {
        let backend = InMemoryBackend::new();
        backend.import_set(capitals()).unwrap();

        let result = backend
            .submit(&AnswerSubmission {
                question_id: QuestionId::new(2),
                user_answer: "  tokyo ".into(),
                time_spent: None,
            })
            .await
            .unwrap();

        assert!(result.is_correct);
        assert_eq!(result.correct_answer, "Tokyo");
        assert_eq!(result.user_answer, "  tokyo ");
        assert!(result.explanation.is_some());
        assert_eq!(backend.attempt_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_bookmark_conflicts_and_missing_removal_is_not_found() {
        let backend = InMemoryBackend::new();
        backend.import_set(capitals()).unwrap();
        let id = QuestionId::new(1);

        backend.add_bookmark(id).await.unwrap();
        assert!(matches!(
            backend.add_bookmark(id).await,
            Err(BackendError::Conflict(_))
        ));
        backend.remove_bookmark(id).await.unwrap();
        assert!(matches!(
            backend.remove_bookmark(id).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_question_is_rejected_on_import() {
        let backend = InMemoryBackend::new();
        let err = backend
            .import_set(NewQuestionSet::new(
                "Broken",
                vec![NewQuestion::short_answer("   ", "x")],
            ))
            .unwrap_err();
        assert!(matches!(err, BackendError::Invalid(_)));
    }
}
