use std::sync::Arc;

use backend::{CatalogBackend, MAX_QUESTION_PAGE, QuestionQuery};
use quiz_core::model::{QuestionId, QuestionRecord, QuestionSet, QuestionSetId};

use crate::error::CatalogServiceError;

/// Correct rate below which the catalog reports a question as frequently wrong.
pub const DEFAULT_WRONG_THRESHOLD: f64 = 0.5;

/// Browsing and housekeeping over question sets and questions.
#[derive(Clone)]
pub struct CatalogService {
    backend: Arc<dyn CatalogBackend>,
}

impl CatalogService {
    #[must_use]
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self { backend }
    }

    /// Question sets, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Backend` on backend failures.
    pub async fn list_sets(&self) -> Result<Vec<QuestionSet>, CatalogServiceError> {
        Ok(self.backend.list_sets().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::Backend` on backend failures or an oversized page.
    pub async fn list_questions(
        &self,
        query: &QuestionQuery,
    ) -> Result<Vec<QuestionRecord>, CatalogServiceError> {
        Ok(self.backend.list_questions(query).await?)
    }

    /// Number of questions in `set_id`, paging through the whole set.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Backend` on backend failures.
    pub async fn count_questions(&self, set_id: QuestionSetId) -> Result<usize, CatalogServiceError> {
        let mut query = QuestionQuery {
            set_id: Some(set_id),
            limit: MAX_QUESTION_PAGE,
            ..QuestionQuery::default()
        };
        let mut total = 0;
        loop {
            let page = self.backend.list_questions(&query).await?.len();
            total += page;
            if page < MAX_QUESTION_PAGE as usize {
                return Ok(total);
            }
            query.offset += MAX_QUESTION_PAGE;
        }
    }

    /// Full record of one question, answer included.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Backend` if the question does not exist.
    pub async fn question(&self, id: QuestionId) -> Result<QuestionRecord, CatalogServiceError> {
        Ok(self.backend.get_question(id).await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogServiceError::Backend` if the question does not exist.
    pub async fn delete_question(&self, id: QuestionId) -> Result<(), CatalogServiceError> {
        self.backend.delete_question(id).await?;
        tracing::info!(question = %id, "question deleted");
        Ok(())
    }

    /// Delete a set and every question in it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Backend` if the set does not exist.
    pub async fn delete_set(&self, id: QuestionSetId) -> Result<(), CatalogServiceError> {
        self.backend.delete_set(id).await?;
        tracing::info!(set = %id, "question set deleted");
        Ok(())
    }

    /// Questions answered wrong often; `threshold` defaults to 0.5.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Backend` on backend failures.
    pub async fn frequently_wrong(
        &self,
        threshold: Option<f64>,
    ) -> Result<Vec<QuestionRecord>, CatalogServiceError> {
        let threshold = threshold.unwrap_or(DEFAULT_WRONG_THRESHOLD);
        Ok(self.backend.frequently_wrong(threshold).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{InMemoryBackend, NewQuestion, NewQuestionSet};

    #[tokio::test]
    async fn question_count_spans_every_page() {
        let backend = InMemoryBackend::new();
        let big = backend
            .import_set(NewQuestionSet {
                name: "Large".into(),
                description: None,
                file_name: None,
                questions: (0..250)
                    .map(|i| NewQuestion::short_answer(format!("Question {i}"), "yes"))
                    .collect(),
            })
            .unwrap();
        let exact = backend
            .import_set(NewQuestionSet {
                name: "Exact page".into(),
                description: None,
                file_name: None,
                questions: (0..100)
                    .map(|i| NewQuestion::short_answer(format!("Item {i}"), "no"))
                    .collect(),
            })
            .unwrap();
        let catalog = CatalogService::new(Arc::new(backend));

        assert_eq!(catalog.count_questions(big).await.unwrap(), 250);
        assert_eq!(catalog.count_questions(exact).await.unwrap(), 100);
    }
}
