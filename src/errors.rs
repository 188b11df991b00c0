//! Error handling for the intervention ranker
//!
//! Every failure in the recommendation pipeline is fatal for the request that
//! raised it: there are no partial recommendations and nothing is retried.

use thiserror::Error;

/// Main error type for the recommendation pipeline
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Oracle '{oracle}' failed: {message}")]
    Oracle { oracle: String, message: String },

    #[error("Invalid value for feature '{feature}': {value:?}")]
    InvalidFeatureValue { feature: String, value: String },

    #[error("Model load failed: {path} - {message}")]
    ModelLoad { path: String, message: String },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for Result with RecommendError
pub type RecommendResult<T> = Result<T, RecommendError>;

impl RecommendError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an oracle error
    pub fn oracle(oracle: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Oracle {
            oracle: oracle.into(),
            message: message.into(),
        }
    }

    /// Create an invalid feature value error
    pub fn invalid_feature(feature: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidFeatureValue {
            feature: feature.into(),
            value: value.into(),
        }
    }

    /// Create a model load error
    pub fn model_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Whether the error ends the request. Always true: the pipeline never
    /// degrades to a partial result and never retries.
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Short machine-readable category, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendError::Config { .. } => "configuration",
            RecommendError::Oracle { .. } => "oracle",
            RecommendError::InvalidFeatureValue { .. } => "invalid_feature_value",
            RecommendError::ModelLoad { .. } => "model_load",
            RecommendError::Serialization { .. } => "serialization",
            RecommendError::Io { .. } => "io",
        }
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for RecommendError {
    fn from(err: serde_json::Error) -> Self {
        RecommendError::serialization("json_operation", err)
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for RecommendError {
    fn from(err: std::io::Error) -> Self {
        RecommendError::io("io_operation", err)
    }
}

/// Convert from figment errors
impl From<figment::Error> for RecommendError {
    fn from(err: figment::Error) -> Self {
        RecommendError::config(err.to_string())
    }
}

/// Convert from candle errors raised during inference
impl From<candle_core::Error> for RecommendError {
    fn from(err: candle_core::Error) -> Self {
        RecommendError::oracle("candle", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = RecommendError::config("top_k out of range");
        assert!(config_err.to_string().contains("Configuration error"));
        assert_eq!(config_err.kind(), "configuration");

        let feature_err = RecommendError::invalid_feature("housing", "Castle");
        assert!(feature_err.to_string().contains("housing"));
        assert!(feature_err.to_string().contains("Castle"));
    }

    #[test]
    fn test_error_chaining() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err = RecommendError::io("reading model", io_err);

        assert!(err.source().is_some());
        assert!(err.to_string().contains("I/O operation failed"));
    }

    #[test]
    fn test_every_error_is_fatal() {
        assert!(RecommendError::oracle("sum", "shape").is_fatal());
        assert!(RecommendError::model_load("m.json", "bad").is_fatal());
    }
}
