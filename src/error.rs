//! Errors raised by the external capability clients.
//!
//! These never escape the quiz engine, extractor, or session controller;
//! those components turn them into sentinel values. They do surface from
//! the clients themselves so callers can log a precise cause.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CapabilityError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{0} returned an empty response")]
    EmptyResponse(&'static str),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for CapabilityError {
    fn from(e: serde_json::Error) -> Self {
        CapabilityError::Malformed(e.to_string())
    }
}
