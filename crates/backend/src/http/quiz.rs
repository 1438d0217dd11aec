use async_trait::async_trait;
use quiz_core::model::{
    AnswerSubmission, Question, QuestionId, SelectionCriteria, SubmissionResult,
};

use super::HttpBackend;
use super::wire::{
    BookmarkBody, BookmarkDto, CountResponse, CriteriaBody, StartResponse, SubmitBody,
    SubmitResponse,
};
use crate::api::{BackendError, QuizBackend};

#[async_trait]
impl QuizBackend for HttpBackend {
    async fn count(&self, criteria: &SelectionCriteria) -> Result<u32, BackendError> {
        let body = CriteriaBody::from(criteria);
        let response: CountResponse = self
            .send_json(self.client.post(self.url("/api/quiz/count")).json(&body))
            .await?;
        Ok(response.count)
    }

    async fn start(&self, criteria: &SelectionCriteria) -> Result<Vec<Question>, BackendError> {
        let body = CriteriaBody::from(criteria);
        let response: StartResponse = self
            .send_json(self.client.post(self.url("/api/quiz/start")).json(&body))
            .await?;
        Ok(response.into_questions())
    }

    async fn submit(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmissionResult, BackendError> {
        let body = SubmitBody::from(submission);
        let response: SubmitResponse = self
            .send_json(self.client.post(self.url("/api/quiz/submit")).json(&body))
            .await?;
        Ok(response.into())
    }

    async fn add_bookmark(&self, id: QuestionId) -> Result<(), BackendError> {
        let body = BookmarkBody {
            question_id: id.value(),
        };
        self.send(self.client.post(self.url("/api/bookmarks/")).json(&body))
            .await?;
        Ok(())
    }

    async fn remove_bookmark(&self, id: QuestionId) -> Result<(), BackendError> {
        let path = format!("/api/bookmarks/{}", id.value());
        self.send(self.client.delete(self.url(&path))).await?;
        Ok(())
    }

    async fn list_bookmarks(&self) -> Result<Vec<QuestionId>, BackendError> {
        let bookmarks: Vec<BookmarkDto> = self
            .send_json(self.client.get(self.url("/api/bookmarks/")))
            .await?;
        Ok(bookmarks
            .into_iter()
            .map(|b| QuestionId::new(b.question_id))
            .collect())
    }
}
