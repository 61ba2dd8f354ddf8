/// Outcome tag of a failed FoxESS Cloud call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Rejected or expired token.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("timed out: {0}")]
    Timeout(String),

    /// Malformed JSON, unexpected structure, or an application error code.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Connection or HTTP failure not otherwise classified.
    #[error("request failed: {0}")]
    Generic(String),
}

impl ApiError {
    pub(super) fn from_transport(path: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(format!("`{path}` did not respond in time"))
        } else {
            Self::Generic(format!("failed to call `{path}`: {error}"))
        }
    }

    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
