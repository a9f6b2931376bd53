use thiserror::Error;

/// Failure of a single weather lookup.
///
/// Every variant carries a human-readable message; the orchestrator shows the
/// `Display` text of the error as-is, so messages are written for end users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The query could not be turned into a request.
    #[error("Invalid search: {message}")]
    InvalidQuery { message: String },

    /// The request never produced a response.
    #[error("Network error: {message}")]
    TransportFailure { message: String },

    /// The response did not have the expected shape.
    #[error("Unexpected response from the weather service: {message}")]
    DecodeFailure { message: String },

    /// The response was well-formed but could not be normalized.
    #[error("Could not read the weather data: {message}")]
    MappingFailure { message: String },
}

impl LookupError {
    pub fn invalid_query<S: Into<String>>(message: S) -> Self {
        Self::InvalidQuery { message: message.into() }
    }

    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::TransportFailure { message: message.into() }
    }

    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::DecodeFailure { message: message.into() }
    }

    pub fn mapping<S: Into<String>>(message: S) -> Self {
        Self::MappingFailure { message: message.into() }
    }
}

/// Returned by [`crate::orchestrator::OrchestratorHandle`] once the
/// orchestrator task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("search orchestrator is no longer running")]
    Closed,
}
