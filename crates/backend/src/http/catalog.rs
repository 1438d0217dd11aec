use async_trait::async_trait;
use quiz_core::model::{QuestionId, QuestionRecord, QuestionSet, QuestionSetId};

use super::HttpBackend;
use super::wire::{QuestionRecordDto, QuestionSetDto, into_records};
use crate::api::{BackendError, CatalogBackend, MAX_QUESTION_PAGE, QuestionQuery};

#[async_trait]
impl CatalogBackend for HttpBackend {
    async fn list_sets(&self) -> Result<Vec<QuestionSet>, BackendError> {
        let sets: Vec<QuestionSetDto> = self
            .send_json(self.client.get(self.url("/api/questions/sets/")))
            .await?;
        sets.into_iter().map(QuestionSetDto::into_set).collect()
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

        let mut params: Vec<(&str, String)> = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(set_id) = query.set_id {
            params.push(("question_set_id", set_id.value().to_string()));
        }
        if let Some(kind) = query.question_type {
            params.push(("question_type", kind.as_str().to_string()));
        }

        let records: Vec<QuestionRecordDto> = self
            .send_json(self.client.get(self.url("/api/questions/")).query(&params))
            .await?;
        into_records(records)
    }

    async fn get_question(&self, id: QuestionId) -> Result<QuestionRecord, BackendError> {
        let path = format!("/api/questions/{}", id.value());
        let record: QuestionRecordDto = self.send_json(self.client.get(self.url(&path))).await?;
        record.into_record()
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), BackendError> {
        let path = format!("/api/questions/{}", id.value());
        self.send(self.client.delete(self.url(&path))).await?;
        Ok(())
    }

    async fn delete_set(&self, id: QuestionSetId) -> Result<(), BackendError> {
        let path = format!("/api/questions/sets/{}", id.value());
        self.send(self.client.delete(self.url(&path))).await?;
        Ok(())
    }

    async fn frequently_wrong(&self, threshold: f64) -> Result<Vec<QuestionRecord>, BackendError> {
        let records: Vec<QuestionRecordDto> = self
            .send_json(
                self.client
                    .get(self.url("/api/quiz/frequently-wrong"))
                    .query(&[("threshold", threshold)]),
            )
            .await?;
        into_records(records)
    }
}
