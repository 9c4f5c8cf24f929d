use thiserror::Error;

/// Why a Knowledge Service call failed. Callers normalize every variant to
/// its display text; the split only matters for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("{0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("{}", describe_status(.status, .detail))]
    Status { status: u16, detail: Option<String> },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout
        } else if err.is_decode() {
            ServiceError::Malformed(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

fn describe_status(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.clone(),
        None => format!("request failed with status {status}"),
    }
}
