use thiserror::Error;

use crate::provider::ProviderId;

/// Failure talking to one upstream provider.
///
/// Transport errors, timeouts, non-success statuses and unparseable bodies all
/// land here. "No such place" is not a fetch failure; see [`AggregateError::NotFound`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{provider} request failed: {source}")]
    Request {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: ProviderId,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{provider} returned a malformed response: {reason}")]
    Malformed { provider: ProviderId, reason: String },
}

impl FetchError {
    pub fn provider(&self) -> ProviderId {
        match self {
            FetchError::Request { provider, .. }
            | FetchError::Status { provider, .. }
            | FetchError::Malformed { provider, .. } => *provider,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Request { source, .. } if source.is_timeout())
    }
}

/// Outcome of a failed aggregation.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("city is required")]
    InvalidQuery,

    #[error("could not find '{0}'")]
    NotFound(String),

    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),
}

impl AggregateError {
    /// Message suitable for the dashboard.
    ///
    /// Upstream failures deliberately hide provider details; those go to the log.
    pub fn user_message(&self) -> String {
        match self {
            AggregateError::InvalidQuery => "city is required".to_string(),
            AggregateError::NotFound(query) => format!("could not find '{query}'"),
            AggregateError::Upstream(_) => "upstream service unavailable".to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AggregateError::NotFound(_))
    }
}
