use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerClientError {
    /// Connection, timeout or protocol failure talking to the runner.
    #[error("runner transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The runner answered, but not with a success status.
    #[error("runner rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    #[error("invalid runner URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RunnerClientResult<T> = Result<T, RunnerClientError>;
