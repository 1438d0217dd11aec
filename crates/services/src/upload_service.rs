use std::path::Path;
use std::sync::Arc;

use backend::{
    Document, DocumentKind, GenerationOutcome, GenerationRequest, UploadBackend, UploadOutcome,
};

use crate::error::UploadServiceError;

/// Hands documents and study material to the backend for question extraction.
///
/// Disabled when the backend has no upload support (the in-memory demo).
#[derive(Clone)]
pub struct UploadService {
    backend: Option<Arc<dyn UploadBackend>>,
}

impl UploadService {
    #[must_use]
    pub fn new(backend: Option<Arc<dyn UploadBackend>>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> Result<&Arc<dyn UploadBackend>, UploadServiceError> {
        self.backend.as_ref().ok_or(UploadServiceError::Disabled)
    }

    /// Read a `.pdf` or `.docx` file from disk and upload it.
    ///
    /// # Errors
    ///
    /// Returns `UploadServiceError::UnsupportedFile` for other extensions (before
    /// reading), `Io` if the file cannot be read, and `Backend` if the upload fails.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadOutcome, UploadServiceError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = DocumentKind::from_file_name(&file_name)
            .ok_or_else(|| UploadServiceError::UnsupportedFile(file_name.clone()))?;
        self.backend()?;

        let bytes = tokio::fs::read(path).await?;
        self.upload(Document {
            file_name,
            kind,
            bytes,
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `UploadServiceError::Disabled` without upload support and
    /// `UploadServiceError::Backend` if the upload fails.
    pub async fn upload(&self, document: Document) -> Result<UploadOutcome, UploadServiceError> {
        let outcome = self.backend()?.upload(document).await?;
        tracing::info!(
            set = %outcome.question_set_id,
            extracted = outcome.questions_extracted,
            "document uploaded"
        );
        Ok(outcome)
    }

    /// Generate questions from study material.
    ///
    /// # Errors
    ///
    /// Returns `UploadServiceError::EmptyContent` for blank content (no backend
    /// call) and `UploadServiceError::Backend` if generation fails.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, UploadServiceError> {
        if request.content.trim().is_empty() {
            return Err(UploadServiceError::EmptyContent);
        }
        let outcome = self.backend()?.generate(request).await?;
        tracing::info!(
            set = %outcome.question_set_id,
            generated = outcome.questions_generated,
            "questions generated"
        );
        Ok(outcome)
    }
}
