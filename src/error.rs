use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request-fatal pipeline failures. Per-record timestamp problems are not
/// represented here; those are `normalize::ParseError` and only cost the
/// affected record.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The search backend was unreachable or rejected the query.
    #[error("upstream query failed: {0}")]
    UpstreamQuery(String),
    /// Anything unexpected inside the pipeline itself.
    #[error("internal pipeline failure: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Wrap a search-client error, flattening its context chain into one
    /// message.
    pub fn upstream(err: anyhow::Error) -> Self {
        Self::UpstreamQuery(format!("{err:#}"))
    }

    /// Stable machine-readable kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpstreamQuery(_) => "upstream_query",
            Self::Internal(_) => "internal",
        }
    }

    /// The generic failure shape handed to callers. Carries the kind and
    /// a short message, nothing else.
    pub fn to_failure(&self) -> Failure {
        let message = match self {
            Self::UpstreamQuery(msg) | Self::Internal(msg) => msg.clone(),
        };
        Failure {
            error: self.kind().to_string(),
            message,
        }
    }
}

/// Wire shape for a failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub error: String,
    pub message: String,
}
