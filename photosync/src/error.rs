use std::path::PathBuf;

use photosync_core::{client::ServiceError, types::RenditionKind};
use thiserror::Error;

use crate::window::TimeWindowError;

/// Errors which abort the whole run
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Identity check failed: {0}")]
    Identity(#[source] ServiceError),
    #[error("No destination folder configured")]
    MissingDestination,
    #[error("Listing of page {0} failed: {1}")]
    Listing(u32, #[source] ServiceError),
    #[error("Invalid time window: {0}")]
    TimeWindow(#[from] TimeWindowError),
    #[error("Invalid scrub pattern: {0}")]
    ScrubPattern(#[from] regex::Error),
}

/// Errors which make one photo fail, the run continues with the next one
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Invalid date: {0}")]
    InvalidDate(#[from] InvalidDateError),
    #[error("Detail call failed: {0}")]
    Detail(#[source] ServiceError),
    #[error("Size listing failed: {0}")]
    Sizes(#[source] ServiceError),
    #[error("Metadata error: {0:#}")]
    Metadata(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Capture date {0:?} is not a valid YYYY-MM-DD date")]
pub struct InvalidDateError(pub Option<String>);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("No {0} size available")]
pub struct SizeUnavailableError(pub RenditionKind);

#[derive(Debug, Error)]
pub enum RenditionError {
    #[error("{0}")]
    SizeUnavailable(#[from] SizeUnavailableError),
    #[error("Unable to create folder {0}: {1}")]
    CreateFolder(PathBuf, #[source] std::io::Error),
    #[error("Transfer failed: {0}")]
    Transfer(#[from] ServiceError),
}
