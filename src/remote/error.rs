use thiserror::Error;

/// Failure of a call to one of the network collaborators.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no client credentials configured")]
    NotConfigured,
}
