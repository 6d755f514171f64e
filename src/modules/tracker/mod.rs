//! Issue tracker integration
//!
//! Files RCA tickets as GitHub issues through the REST API.

mod github_client;

use crate::core::error::AppError;

pub use github_client::{GitHubClient, NewIssue, TrackerError};

impl From<TrackerError> for AppError {
    fn from(e: TrackerError) -> Self {
        AppError::Internal(format!("GitHub client error: {}", e))
    }
}
