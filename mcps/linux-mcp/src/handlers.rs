//! Tool handlers
//!
//! Each handler turns its parameters into a gateway call and renders the
//! captured output in the requested format.

use mcp_common::{
    internal_error, invalid_request, json_success, text_success, CallToolResult, IntoMcpError,
    McpError, ResultExt,
};

use crate::gateway::CommandGateway;
use crate::params::*;
use crate::types::{CommandOutput, CommandRequest, GatewayError};

// ============================================================================
// Helper Functions
// ============================================================================

/// Policy refusals are the caller's problem; everything else is ours
impl IntoMcpError for GatewayError {
    fn into_mcp_error(self) -> McpError {
        if self.is_rejection() {
            invalid_request(self.to_string())
        } else {
            internal_error(self.to_string())
        }
    }
}

fn render(output: &CommandOutput, format: OutputFormat) -> Result<CallToolResult, McpError> {
    match format {
        OutputFormat::Json => json_success(output),
        OutputFormat::Text => Ok(text_success(output.to_string())),
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

pub async fn run_command(
    gateway: &CommandGateway,
    params: RunCommandParams,
) -> Result<CallToolResult, McpError> {
    let format = params.format;
    let request = CommandRequest::from(params);

    let output = gateway.execute(&request).await.to_mcp_err()?;

    render(&output, format)
}

pub async fn run_shell(
    gateway: &CommandGateway,
    params: RunShellParams,
) -> Result<CallToolResult, McpError> {
    let output = gateway
        .execute_shell(&params.command, params.cwd.as_deref(), params.timeout_secs)
        .await
        .to_mcp_err()?;

    render(&output, params.format)
}

pub fn list_allowed_commands(gateway: &CommandGateway) -> Result<CallToolResult, McpError> {
    json_success(&gateway.allowed_commands())
}
