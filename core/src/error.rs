//! Error types shared by every somstat-rs probe.

use thiserror::Error;

/// Errors produced while reading or interpreting platform statistics.
///
/// The variants map onto the failure modes of kernel pseudo-files: the file
/// may be missing entirely (sensor not wired up, wrong kernel version,
/// permissions), it may open but hold something other than the expected
/// token shape, or a derived computation may be undefined for the sampled
/// values.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// I/O error occurred while reading a pseudo-file.
    ///
    /// Callers treat this as "telemetry unavailable" for the affected
    /// section, never as a fatal condition for the whole report.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File opened but did not contain the expected token shape.
    #[error("parse error: {message}")]
    Parse {
        /// Description of what failed to parse
        message: String,
        /// Optional source error for chaining
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid construction or caller-supplied parameter.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration issue
        message: String,
    },

    /// A required row or label is absent from an otherwise readable file.
    #[error("probe unavailable: {reason}")]
    Unavailable {
        /// Reason why the probe cannot produce a value
        reason: String,
    },

    /// A derived computation is undefined for the sampled values.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the undefined condition
        message: String,
    },
}

impl ProbeError {
    /// Create a new parse error with a simple message.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new parse error with a source error.
    pub fn parse_with_source<S: Into<String>, E>(message: S, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new unavailable error.
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a new invalid-state error.
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_carry_the_os_error_text() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such sensor");
        let err = ProbeError::from(io);
        assert!(err.to_string().contains("no such sensor"));
    }

    #[test]
    fn parse_errors_chain_their_source() {
        let source = "x".parse::<u64>().unwrap_err();
        let err = ProbeError::parse_with_source("bad counter", source);
        assert!(std::error::Error::source(&err).is_some());
    }
}
