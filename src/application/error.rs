use thiserror::Error;

use crate::cache::CacheError;
use crate::domain::error::DomainError;
use crate::{application::repos::RepoError, config::ConfigError};

/// Umbrella error for the application services.
///
/// Not-found is deliberately absent: unknown slugs and empty datasets are
/// values (`Ok(None)`, empty collections), never errors, so callers can
/// render a not-found state without matching on error variants.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// True when the failure originated in the storage layer (directly or
    /// through a cache computation), meaning a retry may succeed.
    pub fn is_upstream(&self) -> bool {
        match self {
            AppError::Repo(_) => true,
            AppError::Cache(err) => {
                matches!(err, CacheError::Timeout(_)) || err.as_repo_error().is_some()
            }
            _ => false,
        }
    }
}
