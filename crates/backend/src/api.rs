use async_trait::async_trait;
use quiz_core::model::{
    AnswerSubmission, Question, QuestionId, QuestionRecord, QuestionSet, QuestionSetId,
    QuestionType, SelectionCriteria, SubmissionResult,
};
use std::sync::Arc;
use thiserror::Error;

use crate::http::{HttpBackend, HttpBackendConfig};
use crate::memory::InMemoryBackend;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("request rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),
}

//
// ─── CATALOG / UPLOAD TYPES ────────────────────────────────────────────────────
//

/// Largest page the catalog listing endpoint serves.
pub const MAX_QUESTION_PAGE: u32 = 100;

/// Filters and paging for catalog listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionQuery {
    pub set_id: Option<QuestionSetId>,
    pub question_type: Option<QuestionType>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for QuestionQuery {
    fn default() -> Self {
        Self {
            set_id: None,
            question_type: None,
            limit: 50,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Detect the kind from a file name's extension (case-insensitive).
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// A file handed to the upload service for question extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    pub question_set_id: QuestionSetId,
    pub questions_extracted: u32,
}

/// Ask the backend to generate questions from raw study material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub content: String,
    pub num_questions: u32,
    pub question_type: QuestionType,
    pub set_name: String,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            num_questions: 10,
            question_type: QuestionType::MultipleChoice,
            set_name: "AI Generated Questions".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub question_set_id: QuestionSetId,
    pub questions_generated: u32,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Quiz backend contract: pool sizing, session questions, grading and bookmarks.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Number of questions matching the criteria (before the session limit).
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the count cannot be resolved.
    async fn count(&self, criteria: &SelectionCriteria) -> Result<u32, BackendError>;

    /// Ordered, possibly shuffled, questions for a new session; answers withheld.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects the criteria or is unreachable.
    async fn start(&self, criteria: &SelectionCriteria) -> Result<Vec<Question>, BackendError>;

    /// Grade one answer.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for unknown questions, or other backend errors.
    async fn submit(&self, submission: &AnswerSubmission)
    -> Result<SubmissionResult, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::Conflict` if the question is already bookmarked.
    async fn add_bookmark(&self, id: QuestionId) -> Result<(), BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no bookmark exists for the question.
    async fn remove_bookmark(&self, id: QuestionId) -> Result<(), BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` if the bookmark list cannot be fetched.
    async fn list_bookmarks(&self) -> Result<Vec<QuestionId>, BackendError>;
}

/// Question catalog contract: browsing and deleting questions and sets.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Question sets, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on backend failures.
    async fn list_sets(&self) -> Result<Vec<QuestionSet>, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` on backend failures.
    async fn list_questions(&self, query: &QuestionQuery)
    -> Result<Vec<QuestionRecord>, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the question does not exist.
    async fn get_question(&self, id: QuestionId) -> Result<QuestionRecord, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the question does not exist.
    async fn delete_question(&self, id: QuestionId) -> Result<(), BackendError>;

    /// Delete a set together with all of its questions.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the set does not exist.
    async fn delete_set(&self, id: QuestionSetId) -> Result<(), BackendError>;

    /// Questions with at least two attempts and a correct rate below `threshold`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on backend failures.
    async fn frequently_wrong(&self, threshold: f64) -> Result<Vec<QuestionRecord>, BackendError>;
}

/// Upload/generation contract; extraction and generation happen server-side.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` if the backend cannot parse or store the document.
    async fn upload(&self, document: Document) -> Result<UploadOutcome, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` if generation fails.
    async fn generate(&self, request: &GenerationRequest)
    -> Result<GenerationOutcome, BackendError>;
}

/// Aggregates backend contracts behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Backends {
    pub quiz: Arc<dyn QuizBackend>,
    pub catalog: Arc<dyn CatalogBackend>,
    pub uploads: Option<Arc<dyn UploadBackend>>,
}

impl Backends {
    /// Local backend without upload support.
    #[must_use]
    pub fn in_memory(backend: InMemoryBackend) -> Self {
        let quiz: Arc<dyn QuizBackend> = Arc::new(backend.clone());
        let catalog: Arc<dyn CatalogBackend> = Arc::new(backend);
        Self {
            quiz,
            catalog,
            uploads: None,
        }
    }

    /// Remote backend reached over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Connection` if the HTTP client cannot be built.
    pub fn http(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let http = HttpBackend::new(config)?;
        let quiz: Arc<dyn QuizBackend> = Arc::new(http.clone());
        let catalog: Arc<dyn CatalogBackend> = Arc::new(http.clone());
        let uploads: Arc<dyn UploadBackend> = Arc::new(http);
        Ok(Self {
            quiz,
            catalog,
            uploads: Some(uploads),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_kind_from_extension() {
        assert_eq!(
            DocumentKind::from_file_name("Exam.PDF"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(
            DocumentKind::from_file_name("notes.final.docx"),
            Some(DocumentKind::Docx)
        );
        assert_eq!(DocumentKind::from_file_name("notes.txt"), None);
        assert_eq!(DocumentKind::from_file_name("README"), None);
    }

    #[test]
    fn generation_request_defaults() {
        let request = GenerationRequest::new("Photosynthesis converts light...");
        assert_eq!(request.num_questions, 10);
        assert_eq!(request.question_type, QuestionType::MultipleChoice);
    }
}
