//! Parameter types for Linux MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::CommandRequest;

/// How a command result is rendered back to the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty JSON with every captured field
    #[default]
    Json,
    /// `STDOUT:` / `STDERR:` / `RETURN CODE:` sections
    Text,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RunCommandParams {
    #[schemars(description = "Program to run, e.g. \"ls\". A bare name, not a full command line")]
    pub command: String,

    #[schemars(description = "Arguments passed to the program as-is, without shell interpretation")]
    #[serde(default)]
    pub args: Vec<String>,

    #[schemars(description = "Working directory (optional, defaults to the server's)")]
    #[serde(default)]
    pub cwd: Option<String>,

    #[schemars(description = "Timeout in seconds (optional, clamped to server max)")]
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[schemars(description = "Result format: \"json\" (default) or \"text\"")]
    #[serde(default)]
    pub format: OutputFormat,
}

impl From<RunCommandParams> for CommandRequest {
    fn from(params: RunCommandParams) -> Self {
        Self {
            command: params.command,
            args: params.args,
            cwd: params.cwd,
            timeout_secs: params.timeout_secs,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RunShellParams {
    #[schemars(description = "Shell command line; pipes, redirects and globbing are honored")]
    pub command: String,

    #[schemars(description = "Working directory (optional, defaults to the server's)")]
    #[serde(default)]
    pub cwd: Option<String>,

    #[schemars(description = "Timeout in seconds (optional, clamped to server max)")]
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[schemars(description = "Result format: \"json\" (default) or \"text\"")]
    #[serde(default)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_run_command() {
        let params: RunCommandParams =
            serde_json::from_value(serde_json::json!({ "command": "uptime" })).unwrap();
        assert!(params.args.is_empty());
        assert_eq!(params.format, OutputFormat::Json);

        let request = CommandRequest::from(params);
        assert_eq!(request, CommandRequest::new("uptime"));
    }

    #[test]
    fn test_text_format() {
        let params: RunShellParams = serde_json::from_value(serde_json::json!({
            "command": "df -h | head -1",
            "format": "text",
            "timeout_secs": 5
        }))
        .unwrap();
        assert_eq!(params.format, OutputFormat::Text);
        assert_eq!(params.timeout_secs, Some(5));
    }
}
