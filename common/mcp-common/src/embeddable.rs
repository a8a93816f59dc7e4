//! In-process tool execution
//!
//! [`EmbeddableMcp`] lets a host (or a test) list and call a server's tools
//! directly, skipping the stdio transport and JSON-RPC framing.
//!
//! ```rust,ignore
//! use mcp_common::EmbeddableMcp;
//! use linux_mcp::LinuxMcpServer;
//!
//! let server = LinuxMcpServer::new()?;
//! let result = server
//!     .call_tool("run_command", serde_json::json!({ "command": "uname", "args": ["-r"] }))
//!     .await?;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] serde_json::Error),

    /// The tool ran and returned an MCP error
    #[error("mcp error: {message}")]
    McpError {
        code: i32,
        message: String,
    },
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError {
            code: err.code.0,
            message: err.message.to_string(),
        }
    }
}

pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// A server whose tools can be called without a transport.
///
/// Implementations delegate `list_tools` to their `ToolRouter` and dispatch
/// `call_tool` by name, deserializing `params` into the tool's parameter type.
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Name used in MCP client configuration
    fn server_name(&self) -> &str;

    fn list_tools(&self) -> Vec<Tool>;

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    fn server_description(&self) -> Option<&str> {
        None
    }
}
