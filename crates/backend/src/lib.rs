#![forbid(unsafe_code)]

pub mod api;
pub mod http;
pub mod memory;

pub use api::{
    BackendError, Backends, CatalogBackend, Document, DocumentKind, GenerationOutcome,
    GenerationRequest, MAX_QUESTION_PAGE, QuestionQuery, QuizBackend, UploadBackend,
    UploadOutcome,
};
pub use http::{HttpBackend, HttpBackendConfig};
pub use memory::{Attempt, InMemoryBackend, NewQuestion, NewQuestionSet};
