use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The API answered with an `error` member. Carries the full decoded response.
    #[error("Graph API error: {payload}")]
    RemoteApi { payload: serde_json::Value },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        GraphError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::MalformedDocument(err.to_string())
    }
}
