//! MCP Common - plumbing shared by the linux-mcp binaries
//!
//! - **Initialization**: [`serve_stdio!`] starts a server on the stdio transport
//! - **Results**: [`json_success`] / [`text_success`] build `CallToolResult`s
//! - **Errors**: [`IntoMcpError`] and [`ResultExt`] turn domain errors into `McpError`
//! - **Embeddable**: [`EmbeddableMcp`] calls tools in-process, without a transport
//!
//! ```rust,ignore
//! // main.rs
//! mcp_common::serve_stdio!(LinuxMcpServer, "linux_mcp");
//!
//! // a tool body
//! let output = gateway.execute(request).await.to_mcp_err()?;
//! json_success(&output)
//! ```

pub mod embeddable;
pub mod error;
pub mod init;
pub mod result;

pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use error::{internal_error, invalid_params, invalid_request, IntoMcpError, McpResult, ResultExt};
pub use init::init_tracing;
pub use result::{json_success, text_success};

pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

pub use async_trait::async_trait;
