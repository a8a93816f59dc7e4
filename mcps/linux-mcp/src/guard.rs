//! Command guard - policy layer in front of process creation
//!
//! In whitelisted mode a request must name an allowed command, its
//! arguments must pass the argument policy, and the program is resolved on
//! the server's `PATH`. In unrestricted mode only the empty command is refused.

use std::path::PathBuf;

use regex::Regex;

use crate::allowlist::{base_name, AllowedCommands};
use crate::types::{CommandRequest, Config, ExecMode, GatewayError};

/// Command execution guard, built once from config
#[derive(Clone)]
pub struct CommandGuard {
    mode: ExecMode,
    allowed: AllowedCommands,
    arg_deny_patterns: Vec<Regex>,
    max_args: usize,
    max_arg_len: usize,
    deny_parent_traversal: bool,
    shell: String,
}

impl CommandGuard {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let arg_deny_patterns = config
            .arguments
            .deny_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    GatewayError::Config(format!("Invalid argument pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if config.commands.shell.trim().is_empty() {
            return Err(GatewayError::Config("commands.shell is empty".to_string()));
        }

        Ok(Self {
            mode: config.mode,
            allowed: AllowedCommands::new(&config.commands.allowed),
            arg_deny_patterns,
            max_args: config.arguments.max_args,
            max_arg_len: config.arguments.max_arg_len,
            deny_parent_traversal: config.arguments.deny_parent_traversal,
            shell: config.commands.shell.clone(),
        })
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn allowed(&self) -> &AllowedCommands {
        &self.allowed
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Apply the mode's policy and return the program to spawn.
    ///
    /// Never spawns anything itself.
    pub fn check_command(&self, request: &CommandRequest) -> Result<PathBuf, GatewayError> {
        let command = request.command.trim();
        if command.is_empty() {
            return Err(GatewayError::EmptyCommand);
        }

        match self.mode {
            ExecMode::Unrestricted => Ok(PathBuf::from(command)),
            ExecMode::Whitelisted => {
                let base = base_name(command);
                if !self.allowed.contains(base) {
                    return Err(GatewayError::Rejected(base.to_string()));
                }

                self.check_args(&request.args)?;

                // Run what PATH says the name is, never a caller-supplied directory
                which::which(base).map_err(|_| GatewayError::NotFound(base.to_string()))
            }
        }
    }

    /// Raw shell lines are only accepted in unrestricted mode
    pub fn check_shell(&self) -> Result<(), GatewayError> {
        match self.mode {
            ExecMode::Unrestricted => Ok(()),
            ExecMode::Whitelisted => Err(GatewayError::Rejected(base_name(&self.shell).to_string())),
        }
    }

    fn check_args(&self, args: &[String]) -> Result<(), GatewayError> {
        if args.len() > self.max_args {
            return Err(GatewayError::TooManyArguments(self.max_args));
        }

        for arg in args {
            if !self.is_safe_arg(arg) {
                return Err(GatewayError::UnsafeArgument(arg.clone()));
            }
        }

        Ok(())
    }

    fn is_safe_arg(&self, arg: &str) -> bool {
        if arg.len() > self.max_arg_len {
            return false;
        }
        if self.deny_parent_traversal && arg.contains("..") {
            return false;
        }
        !self.arg_deny_patterns.iter().any(|p| p.is_match(arg))
    }

    /// Resolve an optional working directory; `None` inherits the server's
    pub fn validate_cwd(&self, cwd: Option<&str>) -> Result<Option<PathBuf>, GatewayError> {
        let Some(dir) = cwd else {
            return Ok(None);
        };

        let path = resolve_path(dir);
        let canonical = path
            .canonicalize()
            .map_err(|e| GatewayError::InvalidCwd(format!("{}: {}", dir, e)))?;

        if !canonical.is_dir() {
            return Err(GatewayError::InvalidCwd(format!(
                "{} is not a directory",
                canonical.display()
            )));
        }

        Ok(Some(canonical))
    }
}

/// Resolve ~ to home directory
fn resolve_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}
