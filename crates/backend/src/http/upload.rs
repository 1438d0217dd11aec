use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::HttpBackend;
use super::wire::{GenerateBody, GenerateResponse, UploadResponse};
use crate::api::{
    BackendError, Document, DocumentKind, GenerationOutcome, GenerationRequest, UploadBackend,
    UploadOutcome,
};

fn upload_path(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Pdf => "/api/upload/pdf",
        DocumentKind::Docx => "/api/upload/docx",
    }
}

#[async_trait]
impl UploadBackend for HttpBackend {
    async fn upload(&self, document: Document) -> Result<UploadOutcome, BackendError> {
        let Document {
            file_name,
            kind,
            bytes,
        } = document;
        tracing::info!(%file_name, size = bytes.len(), "uploading document");

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(kind.mime_type())
            .map_err(|e| BackendError::Invalid(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response: UploadResponse = self
            .send_json(self.client.post(self.url(upload_path(kind))).multipart(form))
            .await?;
        Ok(response.into())
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, BackendError> {
        let body = GenerateBody::from(request);
        let response: GenerateResponse = self
            .send_json(
                self.client
                    .post(self.url("/api/questions/generate"))
                    .json(&body),
            )
            .await?;
        Ok(response.into())
    }
}
