use thiserror::Error;

/// Failure talking to a remote instance.
///
/// An empty page is never an error; these variants only cover requests that
/// did not produce a usable answer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The instance rejected the credential (HTTP 401/403). Do not retry.
    #[error("instance rejected the credential: {0}")]
    Auth(String),
    /// Network failure, timeout, rate limit or server error. The caller may retry later.
    #[error("transient instance failure: {0}")]
    Transient(String),
    /// The response body did not have the expected shape.
    #[error("malformed instance response: {0}")]
    Parse(String),
}

impl ApiError {
    pub(crate) fn from_request(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transient(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}
