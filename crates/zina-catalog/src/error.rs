use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport failure: DNS, TLS, connect, timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("catalog API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog API URL is not configured")]
    NotConfigured,

    #[error("invalid catalog API URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: u32 },

    /// A field was rejected, either locally before sending or by the API.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
}

impl CatalogError {
    /// `true` for network-level failures where the API was never reached.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, CatalogError::Http(_))
    }

    /// HTTP status reported by the API, if the failure came from one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
