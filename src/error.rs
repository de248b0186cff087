use thiserror::Error;

/// Failure while turning one request into a list of words.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response body.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status and no error message.
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    /// The body was not the JSON document the service normally sends.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A `written_on` field did not match `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The service reported an error of its own.
    #[error("service error: {0}")]
    Service(String),
}

/// Failure of a cursor navigation call.
///
/// The four boundary variants are expected outcomes for callers that skip the
/// `has_*` checks. None of them, nor a fetch failure, moves the cursor.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("there isn't a page prior to the current one")]
    NoPreviousPage,

    #[error("there isn't a word prior to the current one")]
    NoPreviousWord,

    #[error("there isn't a page after the current one")]
    NoNextPage,

    #[error("there isn't a word after the current one")]
    NoNextWord,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl CursorError {
    /// True for the navigation boundary variants.
    pub fn is_boundary(&self) -> bool {
        !matches!(self, CursorError::Fetch(_))
    }
}
