use thiserror::Error;

/// Main error type for Pagesentry operations
#[derive(Error, Debug)]
pub enum PagesentryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unsupported content type '{content_type}' at {url}")]
    UnsupportedContent { url: String, content_type: String },

    #[error("No visible content at {0}")]
    EmptyContent(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Malformed target record '{id}': {reason}")]
    MalformedTarget { id: String, reason: String },
}

impl PagesentryError {
    /// True for fetch-side failures: the stored target record is left
    /// untouched so the target stays due and is retried on the next tick.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            PagesentryError::Timeout(_)
                | PagesentryError::Network { .. }
                | PagesentryError::HttpStatus { .. }
                | PagesentryError::UnsupportedContent { .. }
                | PagesentryError::EmptyContent(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PagesentryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_classification() {
        assert!(PagesentryError::Timeout("https://example.com".to_string()).is_fetch_error());
        assert!(PagesentryError::HttpStatus {
            url: "https://example.com".to_string(),
            status: 503,
        }
        .is_fetch_error());
        assert!(!PagesentryError::Persistence("disk full".to_string()).is_fetch_error());
        assert!(!PagesentryError::Config("bad toml".to_string()).is_fetch_error());
    }
}
