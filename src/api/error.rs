use thiserror::Error;

/// Why a fetch did not produce a payload. The cache is never touched when
/// one of these is returned.
#[derive(Error, Debug)]
pub enum FetchFailed {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

impl FetchFailed {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchFailed::Http { status, .. } => Some(*status),
            FetchFailed::Transport(e) => e.status().map(|s| s.as_u16()),
            FetchFailed::Body(_) => None,
        }
    }
}
