use thiserror::Error;

/// Error types for metrics configuration, generation and delivery
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Invalid or inconsistent metrics configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A host-supplied count fetcher failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The push gateway rejected a push
    #[error("Push error: {0}")]
    Push(String),

    /// Metric creation, registration or encoding errors
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Transport errors talking to the push gateway
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Encoded metrics were not valid UTF-8
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No async runtime available to drive recurring jobs
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl MetricsError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MetricsError::Config(msg.into())
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(msg: S) -> Self {
        MetricsError::Fetch(msg.into())
    }

    /// Create a new push error
    pub fn push<S: Into<String>>(msg: S) -> Self {
        MetricsError::Push(msg.into())
    }

    /// Create a new runtime error
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        MetricsError::Runtime(msg.into())
    }

    /// Whether this error came from configuration validation
    pub fn is_config(&self) -> bool {
        matches!(self, MetricsError::Config(_))
    }
}

/// Result type for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;
