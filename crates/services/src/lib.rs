#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod config;
pub mod count_estimator;
pub mod error;
pub mod sessions;
pub mod upload_service;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use config::AppConfig;
pub use count_estimator::{CountDisplay, CountEstimator};
pub use error::{
    AppServicesError, BookmarkError, CatalogServiceError, ConfigError, CountError,
    SessionStartError, SubmissionError, UploadServiceError,
};
pub use upload_service::UploadService;

pub use sessions::{BookmarkTracker, QuizLoopService, SessionBuilder, SessionHandle, SessionView};
