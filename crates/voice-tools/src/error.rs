//! Error types for tool execution

use thiserror::Error;

/// Result type alias for tool execution
pub type Result<T> = std::result::Result<T, Error>;

/// Error type reported by tools to the invoking layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Arguments did not match the tool's input schema
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// No tool registered under the requested name
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The tool ran but could not resolve the call
    ///
    /// `kind` is a stable snake_case identifier the caller can branch on.
    #[error("{kind}: {message}")]
    Resolution { kind: String, message: String },
}

impl Error {
    /// Stable identifier for the failure, suitable for reporting back to the agent
    pub fn kind(&self) -> &str {
        match self {
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::ToolNotFound(_) => "tool_not_found",
            Self::Resolution { kind, .. } => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Resolution {
            kind: "no_match".to_string(),
            message: "nothing found".to_string(),
        };
        assert_eq!(err.to_string(), "no_match: nothing found");
        assert_eq!(err.kind(), "no_match");

        let err = Error::ToolNotFound("search_web".to_string());
        assert_eq!(err.to_string(), "Tool not found: search_web");
        assert_eq!(err.kind(), "tool_not_found");
    }
}
