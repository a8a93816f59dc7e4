//! Type definitions for linux MCP

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

/// Whether commands are checked against the allowed set before running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    #[default]
    Whitelisted,
    Unrestricted,
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecMode::Whitelisted => f.write_str("whitelisted"),
            ExecMode::Unrestricted => f.write_str("unrestricted"),
        }
    }
}

/// Server configuration, read once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: ExecMode,
    #[serde(default)]
    pub commands: CommandConfig,
    #[serde(default)]
    pub arguments: ArgumentConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub environment: EnvConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Base names of the commands allowed in whitelisted mode
    #[serde(default = "default_allowed_commands")]
    pub allowed: Vec<String>,

    /// Shell used by `run_shell` in unrestricted mode
    #[serde(default = "default_shell")]
    pub shell: String,
}

fn default_allowed_commands() -> Vec<String> {
    [
        "ls", "cat", "head", "tail", "less", "grep", "egrep", "fgrep", "wc",
        "df", "du", "ps", "top", "uname", "whoami", "id", "uptime", "free",
        "ip", "ifconfig", "ss", "netstat", "journalctl", "systemctl",
        "mount", "umount", "stat", "find", "sed", "awk", "cut", "sort",
        "uniq", "tr", "date", "hostname", "readlink", "file", "which",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            allowed: default_allowed_commands(),
            shell: default_shell(),
        }
    }
}

/// Argument checks applied in whitelisted mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentConfig {
    #[serde(default = "default_max_args")]
    pub max_args: usize,

    /// Longest accepted argument, in bytes
    #[serde(default = "default_max_arg_len")]
    pub max_arg_len: usize,

    /// Regex patterns no argument may match
    #[serde(default = "default_arg_deny_patterns")]
    pub deny_patterns: Vec<String>,

    /// Reject any argument containing `..`
    #[serde(default = "default_true")]
    pub deny_parent_traversal: bool,
}

fn default_max_args() -> usize {
    30
}

fn default_max_arg_len() -> usize {
    1024
}

fn default_arg_deny_patterns() -> Vec<String> {
    vec![
        r"[;&|<>$`\\]".to_string(), // shell metacharacters
        r"(?:^|\s)--?exec(?:dir)?\b".to_string(), // find -exec / -execdir
    ]
}

fn default_true() -> bool {
    true
}

impl Default for ArgumentConfig {
    fn default() -> Self {
        Self {
            max_args: default_max_args(),
            max_arg_len: default_max_arg_len(),
            deny_patterns: default_arg_deny_patterns(),
            deny_parent_traversal: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Used when a request does not name a timeout
    #[serde(default = "default_timeout")]
    pub default_secs: u64,
    /// Hard cap for per-request timeouts
    #[serde(default = "default_max_timeout")]
    pub max_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

fn default_max_timeout() -> u64 {
    300
}

impl TimeoutConfig {
    /// Timeout for one request: the requested value clamped to `max_secs`
    pub fn resolve(&self, requested: Option<u64>) -> u64 {
        requested.unwrap_or(self.default_secs).min(self.max_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_secs: default_timeout(),
            max_secs: default_max_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum output size per stream (stdout/stderr) in bytes
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
}

fn default_max_output() -> usize {
    1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: default_max_output(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Environment variables to set
    #[serde(default)]
    pub set: HashMap<String, String>,
    /// Environment variables to remove
    #[serde(default)]
    pub remove: Vec<String>,
}

// ============================================================================
// Request / Response Types
// ============================================================================

/// One command invocation: a program and its argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            cwd: None,
            timeout_secs: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn cwd(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Command and arguments joined with spaces, for logs and responses
    pub fn display_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of one finished process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    pub command: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub truncated: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Text rendering: `STDOUT:` / `STDERR:` sections (when non-empty) and the return code
impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections = Vec::with_capacity(3);
        if !self.stdout.is_empty() {
            sections.push(format!("STDOUT:\n{}", self.stdout.trim_end()));
        }
        if !self.stderr.is_empty() {
            sections.push(format!("STDERR:\n{}", self.stderr.trim_end()));
        }
        match (self.exit_code, self.signal) {
            (Some(code), _) => sections.push(format!("RETURN CODE: {}", code)),
            (None, Some(sig)) => sections.push(format!("TERMINATED BY SIGNAL: {}", sig)),
            (None, None) => sections.push("RETURN CODE: unknown".to_string()),
        }
        if self.truncated {
            sections.push("(output truncated)".to_string());
        }
        f.write_str(&sections.join("\n\n"))
    }
}

/// Response for `list_allowed_commands`
#[derive(Debug, Serialize, Deserialize)]
pub struct AllowedCommandsResponse {
    pub mode: ExecMode,
    pub commands: BTreeSet<String>,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Command '{0}' is not allowed by server whitelist")]
    Rejected(String),

    #[error("Unsafe argument detected: {0}")]
    UnsafeArgument(String),

    #[error("Too many arguments (limit {0})")]
    TooManyArguments(usize),

    #[error("No command provided")]
    EmptyCommand,

    #[error("Command '{0}' not found on server PATH")]
    NotFound(String),

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Working directory not usable: {0}")]
    InvalidCwd(String),

    #[error("Command timed out after {0} seconds")]
    Timeout(u64),

    #[error("Config error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Refused by policy before anything was spawned
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GatewayError::Rejected(_)
                | GatewayError::UnsafeArgument(_)
                | GatewayError::TooManyArguments(_)
                | GatewayError::EmptyCommand
        )
    }

    /// The process could not be started
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::NotFound(_)
                | GatewayError::Spawn { .. }
                | GatewayError::Wait { .. }
                | GatewayError::InvalidCwd(_)
        )
    }
}
