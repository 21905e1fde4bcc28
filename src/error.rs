//! Error handling for the network speed tester

use thiserror::Error;

/// Custom error types for the network speed tester
#[derive(Error, Debug)]
pub enum SpeedtestError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Parsing errors (URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Latency probe errors
    #[error("Latency probe error: {0}")]
    Probe(String),

    /// Test execution errors
    #[error("Test execution error: {0}")]
    TestExecution(String),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, SpeedtestError>;

impl SpeedtestError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new latency probe error
    pub fn probe<S: Into<String>>(message: S) -> Self {
        Self::Probe(message.into())
    }

    /// Create a new test execution error
    pub fn test_execution<S: Into<String>>(message: S) -> Self {
        Self::TestExecution(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Network(_) => "NETWORK",
            Self::HttpRequest(_) => "HTTP",
            Self::Timeout(_) => "TIMEOUT",
            Self::Validation(_) => "VALIDATION",
            Self::Parse(_) => "PARSE",
            Self::Probe(_) => "PROBE",
            Self::TestExecution(_) => "TEST",
        }
    }

    /// Check if the error is a transient per-transfer failure that a
    /// throughput phase tolerates (one lost sample barely perturbs the
    /// aggregate rate)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::HttpRequest(_) | Self::Timeout(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Probe(_) | Self::TestExecution(_) => false,
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Network(_) | Self::HttpRequest(_) => 2,
            Self::Timeout(_) => 3,
            Self::Probe(_) | Self::TestExecution(_) => 4,
        }
    }
}

impl From<reqwest::Error> for SpeedtestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_status() || err.is_builder() || err.is_request() {
            Self::HttpRequest(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for SpeedtestError {
    fn from(err: url::ParseError) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = SpeedtestError::config("missing url");
        assert!(matches!(err, SpeedtestError::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: missing url");

        let err = SpeedtestError::probe("connection refused");
        assert!(matches!(err, SpeedtestError::Probe(_)));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(SpeedtestError::network("n").category(), "NETWORK");
        assert_eq!(SpeedtestError::http_request("h").category(), "HTTP");
        assert_eq!(SpeedtestError::timeout("t").category(), "TIMEOUT");
        assert_eq!(SpeedtestError::probe("p").category(), "PROBE");
    }

    #[test]
    fn test_transient_classification() {
        // Per-transfer failures are tolerated by throughput phases
        assert!(SpeedtestError::network("reset").is_transient());
        assert!(SpeedtestError::timeout("slow").is_transient());
        assert!(SpeedtestError::http_request("500").is_transient());

        // Setup and probe failures are fatal
        assert!(!SpeedtestError::config("bad").is_transient());
        assert!(!SpeedtestError::probe("lost sample").is_transient());
        assert!(!SpeedtestError::validation("bad url").is_transient());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(SpeedtestError::config("c").exit_code(), 1);
        assert_eq!(SpeedtestError::network("n").exit_code(), 2);
        assert_eq!(SpeedtestError::timeout("t").exit_code(), 3);
        assert_eq!(SpeedtestError::probe("p").exit_code(), 4);
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let err: SpeedtestError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, SpeedtestError::Parse(_)));
    }
}
