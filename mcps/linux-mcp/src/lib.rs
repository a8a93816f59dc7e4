//! Linux MCP Library
//!
//! Runs Linux commands for an MCP client. One gateway, two modes:
//! whitelisted (allowed command names, checked arguments, argument-vector
//! execution) and unrestricted (anything, plus a shell tool).
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use linux_mcp::{LinuxMcpServer, EmbeddableMcp};
//!
//! let server = LinuxMcpServer::new()?;
//! let result = server
//!     .call_tool("run_command", serde_json::json!({ "command": "df", "args": ["-h"] }))
//!     .await?;
//! ```
//!
//! # Usage as Binary
//!
//! ```json
//! { "mcpServers": { "linux": { "command": "./linux-mcp" } } }
//! ```
//!
//! `linux-mcp-unrestricted` serves the same tools with the whitelist off.

pub mod allowlist;
pub mod gateway;
pub mod guard;
pub mod handlers;
pub mod params;
pub mod server;
pub mod types;

// Re-export main server type
pub use server::LinuxMcpServer;

pub use gateway::CommandGateway;
pub use params::*;
pub use types::{CommandOutput, CommandRequest, Config, ExecMode, GatewayError};

// Re-export EmbeddableMcp trait for in-process usage
pub use mcp_common::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
