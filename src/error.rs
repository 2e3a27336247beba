//! Error types for the move advisor.
//!
//! The crate uses `thiserror` to give callers a single error enum.
//! Only interactive paths (manual trigger, configuration) surface these
//! to the user; the passive mutation loop logs them and carries on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    /// The host board element or its game object is not present.
    #[error("Board unavailable")]
    BoardUnavailable,

    /// Transport failure or non-success status from the advisory service.
    #[error("Advisory service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service answered, but not with the expected payload.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Engine settings entered by the user could not be parsed.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl AdvisorError {
    /// Builds a `ServiceUnavailable` from a reqwest failure.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        AdvisorError::ServiceUnavailable(format!("Request error: {err}"))
    }
}
