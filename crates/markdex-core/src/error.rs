use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkdexError {
    #[error("API base not set (use `markdex config set --api <url>`)")]
    ConfigMissing,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http {status}")]
    Upstream { status: u16 },

    #[error("unexpected response format: {0}")]
    MalformedResponse(String),

    #[error("ambiguous hash prefix {prefix}, matches:\n{}", candidates.join("\n"))]
    AmbiguousSelection {
        prefix: String,
        candidates: Vec<String>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{tool} not found in PATH ({hint})")]
    ToolMissing { tool: String, hint: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type MarkdexResult<T> = Result<T, MarkdexError>;
