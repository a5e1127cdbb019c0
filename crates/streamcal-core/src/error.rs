//! Error taxonomy for the core.
//!
//! Network and conflict errors reach the view store, which turns them into
//! a single alert message. A stale fallback is not an error: fetchers report
//! it through [`crate::fetch::FetchSource::StaleFallback`] and log it.

use std::time::Duration;

use thiserror::Error;

use crate::api::ApiError;
use crate::schedule::ConflictError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] ApiError),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Cache entry could not be decoded: {0}")]
    Cache(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Text for the single alert line the calendar shows.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(ApiError::Unauthorized) | Error::Network(ApiError::AccessDenied(_)) => {
                "You do not have permission to change the schedule.".to_string()
            }
            Error::Network(_) | Error::Timeout(_) => {
                "Could not reach the server. Please try again.".to_string()
            }
            Error::Conflict(conflict) => conflict.to_string(),
            Error::Validation(reason) => reason.clone(),
            Error::Cache(_) => "Cached data was unreadable; reload the page.".to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout(_))
    }
}
