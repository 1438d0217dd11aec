//! JSON shapes exchanged with the quiz server.

use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerSubmission, Choice, Question, QuestionId, QuestionRecord, QuestionSet, QuestionSetId,
    QuestionType, SelectionCriteria, SubmissionResult,
};
use serde::{Deserialize, Serialize};

use crate::api::{BackendError, GenerationOutcome, GenerationRequest, UploadOutcome};

#[derive(Debug, Serialize)]
pub(crate) struct CriteriaBody {
    /// Single-set form understood by older servers; only sent for one set.
    #[serde(skip_serializing_if = "Option::is_none")]
    question_set_id: Option<u64>,
    question_set_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    question_type: Option<QuestionType>,
    shuffle_questions: bool,
    shuffle_choices: bool,
    bookmarked_only: bool,
    frequently_wrong_only: bool,
    limit: u32,
}

impl From<&SelectionCriteria> for CriteriaBody {
    fn from(criteria: &SelectionCriteria) -> Self {
        let question_set_ids: Vec<u64> = criteria.set_ids().iter().map(|id| id.value()).collect();
        let question_set_id = match question_set_ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        Self {
            question_set_id,
            question_set_ids,
            question_type: criteria.type_filter().as_type(),
            shuffle_questions: criteria.shuffle_questions(),
            shuffle_choices: criteria.shuffle_choices(),
            bookmarked_only: criteria.bookmarked_only(),
            frequently_wrong_only: criteria.frequently_wrong_only(),
            limit: criteria.limit(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountResponse {
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceDto {
    label: String,
    text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizQuestionDto {
    id: u64,
    #[serde(rename = "type")]
    kind: QuestionType,
    stem: String,
    #[serde(default)]
    choices: Vec<ChoiceDto>,
}

impl QuizQuestionDto {
    fn into_question(self) -> Result<Question, BackendError> {
        let choices = self
            .choices
            .into_iter()
            .map(|c| Choice::new(c.label, c.text))
            .collect();
        Question::new(QuestionId::new(self.id), self.kind, self.stem, choices)
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartResponse {
    questions: Vec<QuizQuestionDto>,
}

impl StartResponse {
    /// Served questions that fail validation are logged and left out.
    pub(crate) fn into_questions(self) -> Vec<Question> {
        self.questions
            .into_iter()
            .filter_map(|dto| {
                let id = dto.id;
                dto.into_question()
                    .inspect_err(|err| {
                        tracing::warn!(question = id, error = %err, "skipping malformed question");
                    })
                    .ok()
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitBody<'a> {
    question_id: u64,
    user_answer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_spent_seconds: Option<f64>,
}

impl<'a> From<&'a AnswerSubmission> for SubmitBody<'a> {
    fn from(submission: &'a AnswerSubmission) -> Self {
        Self {
            question_id: submission.question_id.value(),
            user_answer: &submission.user_answer,
            time_spent_seconds: submission.time_spent.map(|d| d.as_secs_f64()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    is_correct: bool,
    correct_answer: String,
    #[serde(default)]
    explanation: Option<String>,
    user_answer: String,
}

impl From<SubmitResponse> for SubmissionResult {
    fn from(dto: SubmitResponse) -> Self {
        Self {
            is_correct: dto.is_correct,
            correct_answer: dto.correct_answer,
            explanation: dto.explanation.filter(|e| !e.trim().is_empty()),
            user_answer: dto.user_answer,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BookmarkBody {
    pub question_id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookmarkDto {
    pub question_id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionSetDto {
    id: u64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    created_at: String,
}

impl QuestionSetDto {
    pub(crate) fn into_set(self) -> Result<QuestionSet, BackendError> {
        Ok(QuestionSet {
            id: QuestionSetId::new(self.id),
            name: self.name,
            description: self.description,
            file_name: self.file_name,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Accepts RFC 3339 and the offset-less ISO form naive server clocks emit.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BackendError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| BackendError::Serialization(format!("bad timestamp {raw:?}: {e}")))
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionRecordDto {
    id: u64,
    #[serde(rename = "type")]
    kind: QuestionType,
    stem: String,
    answer: String,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    choices: Vec<ChoiceDto>,
    #[serde(default)]
    question_set_id: Option<u64>,
}

impl QuestionRecordDto {
    pub(crate) fn into_record(self) -> Result<QuestionRecord, BackendError> {
        let question = QuizQuestionDto {
            id: self.id,
            kind: self.kind,
            stem: self.stem,
            choices: self.choices,
        }
        .into_question()?;
        Ok(QuestionRecord {
            question,
            set_id: self.question_set_id.map(QuestionSetId::new),
            answer: self.answer,
            explanation: self.explanation.filter(|e| !e.trim().is_empty()),
        })
    }
}

pub(crate) fn into_records(dtos: Vec<QuestionRecordDto>) -> Result<Vec<QuestionRecord>, BackendError> {
    dtos.into_iter().map(QuestionRecordDto::into_record).collect()
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    question_set_id: u64,
    questions_extracted: u32,
}

impl From<UploadResponse> for UploadOutcome {
    fn from(dto: UploadResponse) -> Self {
        Self {
            question_set_id: QuestionSetId::new(dto.question_set_id),
            questions_extracted: dto.questions_extracted,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateBody<'a> {
    content: &'a str,
    num_questions: u32,
    question_type: QuestionType,
    question_set_name: &'a str,
}

impl<'a> From<&'a GenerationRequest> for GenerateBody<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            content: &request.content,
            num_questions: request.num_questions,
            question_type: request.question_type,
            question_set_name: &request.set_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    question_set_id: u64,
    questions_generated: u32,
}

impl From<GenerateResponse> for GenerationOutcome {
    fn from(dto: GenerateResponse) -> Self {
        Self {
            question_set_id: QuestionSetId::new(dto.question_set_id),
            questions_generated: dto.questions_generated,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// FastAPI-style `detail` is either a string or a list of validation errors.
    pub(crate) fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}
