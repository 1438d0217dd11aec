use std::sync::Arc;

use backend::{Backends, InMemoryBackend, QuizBackend};

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::config::AppConfig;
use crate::count_estimator::CountEstimator;
use crate::error::AppServicesError;
use crate::sessions::QuizLoopService;
use crate::upload_service::UploadService;

/// Assembles app-facing services over one set of backends.
#[derive(Clone)]
pub struct AppServices {
    config: AppConfig,
    quiz_backend: Arc<dyn QuizBackend>,
    quiz_loop: Arc<QuizLoopService>,
    catalog: Arc<CatalogService>,
    uploads: Arc<UploadService>,
}

impl AppServices {
    /// Build services against the HTTP quiz server named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Backend` if the HTTP client cannot be built.
    pub fn http(config: AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let backends = Backends::http(config.api.clone())?;
        tracing::info!(base_url = %config.api.base_url, "using quiz server");
        Ok(Self::from_backends(backends, config, clock))
    }

    /// Build services over a local in-memory backend (no uploads).
    #[must_use]
    pub fn in_memory(backend: InMemoryBackend, config: AppConfig, clock: Clock) -> Self {
        Self::from_backends(Backends::in_memory(backend), config, clock)
    }

    #[must_use]
    pub fn from_backends(backends: Backends, config: AppConfig, clock: Clock) -> Self {
        let quiz_loop = QuizLoopService::new(clock, Arc::clone(&backends.quiz))
            .with_bookmark_hydration(config.hydrate_bookmarks);
        Self {
            quiz_loop: Arc::new(quiz_loop),
            catalog: Arc::new(CatalogService::new(backends.catalog)),
            uploads: Arc::new(UploadService::new(backends.uploads)),
            quiz_backend: backends.quiz,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// A fresh live counter using the configured animation tick.
    #[must_use]
    pub fn count_estimator(&self) -> CountEstimator {
        CountEstimator::new(Arc::clone(&self.quiz_backend)).with_tick(self.config.count_tick)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn uploads(&self) -> Arc<UploadService> {
        Arc::clone(&self.uploads)
    }
}
