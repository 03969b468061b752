use thiserror::Error;

#[derive(Error, Debug)]
pub enum FundingError {
    #[error("Funding API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Funding API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Funding API unavailable: {0}")]
    Unavailable(String),
}
