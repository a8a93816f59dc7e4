//! MCP Server implementation for Linux command execution
//!
//! Defines the server and its tool router. Handler implementations are in
//! the handlers module; policy and process handling live in the gateway.

use std::path::{Path, PathBuf};

use mcp_common::{
    async_trait, CallToolResult, EmbeddableError, EmbeddableMcp, EmbeddableResult, McpError,
    Tool,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde_json::Value;

use crate::gateway::CommandGateway;
use crate::handlers;
use crate::params::*;
use crate::types::{Config, ExecMode, GatewayError};

/// The Linux MCP Server
#[derive(Clone)]
pub struct LinuxMcpServer {
    gateway: CommandGateway,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Tool Router - Each tool delegates to its handler
// ============================================================================

#[tool_router]
impl LinuxMcpServer {
    /// Create a server from the first config file found
    ///
    /// Config is searched in order:
    /// 1. `LINUX_MCP_CONFIG` env var
    /// 2. `./linux-mcp.toml`
    /// 3. `$XDG_CONFIG_HOME/linux-mcp/config.toml`
    /// 4. `~/.linux-mcp.toml`
    /// 5. Default config (whitelisted) if none found
    pub fn new() -> Result<Self, GatewayError> {
        Self::with_config(Self::load_config())
    }

    /// Same config search as [`Self::new`], with the mode forced to unrestricted
    pub fn unrestricted() -> Result<Self, GatewayError> {
        Self::with_mode(ExecMode::Unrestricted)
    }

    pub fn with_mode(mode: ExecMode) -> Result<Self, GatewayError> {
        let mut config = Self::load_config();
        config.mode = mode;
        Self::with_config(config)
    }

    /// Create a new server with explicit config
    pub fn with_config(config: Config) -> Result<Self, GatewayError> {
        let mode = config.mode;
        let allowed = config.commands.allowed.len();
        let gateway = CommandGateway::new(config)?;

        tracing::info!(%mode, allowed, "Command gateway ready");

        Ok(Self {
            gateway,
            tool_router: Self::tool_router(),
        })
    }

    pub fn mode(&self) -> ExecMode {
        self.gateway.mode()
    }

    fn load_config() -> Config {
        if let Ok(env_path) = std::env::var("LINUX_MCP_CONFIG") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                if let Some(config) = read_config(&path) {
                    return config;
                }
            } else {
                tracing::warn!("LINUX_MCP_CONFIG={} does not exist", env_path);
            }
        }

        let mut config_paths = vec![PathBuf::from("linux-mcp.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("linux-mcp").join("config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            config_paths.push(home.join(".linux-mcp.toml"));
        }

        for path in config_paths {
            if path.exists() {
                if let Some(config) = read_config(&path) {
                    return config;
                }
            }
        }

        tracing::info!("Using default configuration");
        Config::default()
    }

    #[tool(
        description = "Run a Linux command with an argument list (no shell). In whitelisted mode only allowed commands with safe arguments run. Returns stdout, stderr and exit code."
    )]
    async fn run_command(
        &self,
        Parameters(params): Parameters<RunCommandParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::run_command(&self.gateway, params).await
    }

    #[tool(
        description = "Run a command line through the server shell, with pipes and redirects. Only available when the server is unrestricted."
    )]
    async fn run_shell(
        &self,
        Parameters(params): Parameters<RunShellParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::run_shell(&self.gateway, params).await
    }

    #[tool(description = "Show the execution mode and the commands allowed in whitelisted mode")]
    async fn list_allowed_commands(&self) -> Result<CallToolResult, McpError> {
        handlers::list_allowed_commands(&self.gateway)
    }
}

fn read_config(path: &Path) -> Option<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read config {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str::<Config>(&content) {
        Ok(config) => {
            tracing::info!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            tracing::warn!("Failed to parse config {}: {}", path.display(), e);
            None
        }
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for LinuxMcpServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = match self.mode() {
            ExecMode::Whitelisted => {
                "Linux command execution MCP server (whitelisted). \
                 Only allowed commands run, arguments are checked, and run_shell is disabled. \
                 Call list_allowed_commands to see what is permitted."
            }
            ExecMode::Unrestricted => {
                "Linux command execution MCP server (unrestricted). \
                 Any command may run; run_shell accepts full shell command lines."
            }
        };

        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Embeddable Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for LinuxMcpServer {
    fn server_name(&self) -> &str {
        "linux"
    }

    fn server_description(&self) -> Option<&str> {
        Some("Runs Linux commands on the host, whitelisted or unrestricted.")
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        match name {
            "run_command" => {
                let params: RunCommandParams = serde_json::from_value(params)?;
                self.run_command(Parameters(params)).await.map_err(Into::into)
            }

            "run_shell" => {
                let params: RunShellParams = serde_json::from_value(params)?;
                self.run_shell(Parameters(params)).await.map_err(Into::into)
            }

            "list_allowed_commands" => self.list_allowed_commands().await.map_err(Into::into),

            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}
