//! Conversions from domain errors into `McpError`

use rmcp::ErrorData as McpError;

pub type McpResult<T> = Result<T, McpError>;

/// Domain errors that know which MCP error code they belong to.
///
/// Server crates implement this for their own error enums so tool bodies can
/// use `?` through [`ResultExt::to_mcp_err`].
pub trait IntoMcpError {
    fn into_mcp_error(self) -> McpError;
}

impl IntoMcpError for serde_json::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(format!("JSON error: {}", self), None)
    }
}

impl IntoMcpError for std::io::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(format!("IO error: {}", self), None)
    }
}

/// `result.to_mcp_err()?` for any error implementing [`IntoMcpError`]
pub trait ResultExt<T> {
    fn to_mcp_err(self) -> Result<T, McpError>;
}

impl<T, E: IntoMcpError> ResultExt<T> for Result<T, E> {
    fn to_mcp_err(self) -> Result<T, McpError> {
        self.map_err(IntoMcpError::into_mcp_error)
    }
}

/// Server-side failure the caller cannot fix by changing the request
pub fn internal_error(message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), None)
}

/// Request arguments failed to deserialize or were malformed
pub fn invalid_params(message: impl Into<String>) -> McpError {
    McpError::invalid_params(message.into(), None)
}

/// Well-formed request refused by server policy
pub fn invalid_request(message: impl Into<String>) -> McpError {
    McpError::invalid_request(message.into(), None)
}
