//! Command gateway - runs checked requests and captures their output
//!
//! Every request goes through [`CommandGuard`] before a process is created.
//! Processes run with stdin closed, both output streams piped, and a
//! timeout after which the child is killed.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::guard::CommandGuard;
use crate::types::{
    AllowedCommandsResponse, CommandOutput, CommandRequest, Config, ExecMode, GatewayError,
};

/// One gateway per server; cheap to clone
#[derive(Clone)]
pub struct CommandGateway {
    guard: CommandGuard,
    config: Config,
}

impl CommandGateway {
    pub fn new(config: Config) -> Result<Self, GatewayError> {
        let guard = CommandGuard::new(&config)?;
        Ok(Self { guard, config })
    }

    pub fn mode(&self) -> ExecMode {
        self.guard.mode()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check `request` against the mode's policy, run it, and wait for it.
    ///
    /// A nonzero exit status is a normal result, not an error.
    pub async fn execute(&self, request: &CommandRequest) -> Result<CommandOutput, GatewayError> {
        let line = request.display_line();

        let program = self.guard.check_command(request).inspect_err(|e| {
            if e.is_rejection() {
                tracing::warn!(mode = %self.mode(), command = %line, "Rejected: {}", e);
            }
        })?;
        let cwd = self.guard.validate_cwd(request.cwd.as_deref())?;

        let mut cmd = Command::new(&program);
        cmd.args(&request.args);

        let timeout_secs = self.config.timeouts.resolve(request.timeout_secs);
        self.run(cmd, line, &program, cwd.as_deref(), timeout_secs).await
    }

    /// Hand `line` to the configured shell with `-c`. Unrestricted mode only.
    pub async fn execute_shell(
        &self,
        line: &str,
        cwd: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> Result<CommandOutput, GatewayError> {
        self.guard.check_shell().inspect_err(|e| {
            tracing::warn!(mode = %self.mode(), command = %line, "Rejected: {}", e);
        })?;
        if line.trim().is_empty() {
            return Err(GatewayError::EmptyCommand);
        }
        let cwd = self.guard.validate_cwd(cwd)?;

        let shell = PathBuf::from(self.guard.shell());
        let mut cmd = Command::new(&shell);
        cmd.arg("-c").arg(line);

        let timeout_secs = self.config.timeouts.resolve(timeout_secs);
        self.run(cmd, line.to_string(), &shell, cwd.as_deref(), timeout_secs)
            .await
    }

    pub fn allowed_commands(&self) -> AllowedCommandsResponse {
        AllowedCommandsResponse {
            mode: self.mode(),
            commands: self.guard.allowed().to_set(),
        }
    }

    async fn run(
        &self,
        mut cmd: Command,
        line: String,
        program: &Path,
        cwd: Option<&Path>,
        timeout_secs: u64,
    ) -> Result<CommandOutput, GatewayError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.config.environment.set {
            cmd.env(key, value);
        }
        for key in &self.config.environment.remove {
            cmd.env_remove(key);
        }

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|source| GatewayError::Spawn {
            command: program.display().to_string(),
            source,
        })?;

        let max = self.config.limits.max_output_bytes;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collect = async {
            let (stdout, stderr) =
                tokio::try_join!(read_capped(stdout, max), read_capped(stderr, max))?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((stdout, stderr, status))
        };

        let result = tokio::time::timeout(Duration::from_secs(timeout_secs), collect).await;

        let (stdout, stderr, status) = match result {
            Ok(Ok(collected)) => collected,
            Ok(Err(source)) => {
                return Err(GatewayError::Wait {
                    command: program.display().to_string(),
                    source,
                })
            }
            Err(_elapsed) => {
                // child is dropped on return, which kill_on_drop terminates
                tracing::warn!(command = %line, timeout_secs, "Command timed out");
                return Err(GatewayError::Timeout(timeout_secs));
            }
        };

        let result = CommandOutput {
            command: line,
            exit_code: status.code(),
            signal: exit_signal(&status),
            stdout: decode_output(&stdout.bytes, stdout.truncated),
            stderr: decode_output(&stderr.bytes, stderr.truncated),
            duration_ms: started.elapsed().as_millis() as u64,
            truncated: stdout.truncated || stderr.truncated,
        };

        tracing::info!(
            mode = %self.mode(),
            command = %result.command,
            exit_code = ?result.exit_code,
            duration_ms = result.duration_ms,
            "Command finished"
        );

        Ok(result)
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Bytes kept from one output stream
struct CapturedStream {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Keep at most `max_bytes` of `reader` and drain the rest into a sink.
///
/// Draining keeps the child from blocking on a full pipe without holding
/// more than `max_bytes` in memory.
async fn read_capped<R>(reader: Option<R>, max_bytes: usize) -> std::io::Result<CapturedStream>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(CapturedStream {
            bytes: Vec::new(),
            truncated: false,
        });
    };

    let mut bytes = Vec::new();
    (&mut reader)
        .take(max_bytes as u64)
        .read_to_end(&mut bytes)
        .await?;
    let discarded = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;

    Ok(CapturedStream {
        bytes,
        truncated: discarded > 0,
    })
}

/// Lossy UTF-8 decode; a cut stream drops a trailing partial character
fn decode_output(bytes: &[u8], truncated: bool) -> String {
    if truncated {
        if let Err(e) = std::str::from_utf8(bytes) {
            if e.error_len().is_none() {
                return String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned();
            }
        }
    }
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(mode: ExecMode, allowed: &[&str]) -> CommandGateway {
        let mut config = Config::default();
        config.mode = mode;
        config.commands.allowed = allowed.iter().map(|s| s.to_string()).collect();
        CommandGateway::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_read_capped_within_limit() {
        let captured = read_capped(Some(&b"hello"[..]), 10).await.unwrap();
        assert_eq!(captured.bytes, b"hello");
        assert!(!captured.truncated);

        let captured = read_capped(Some(&b"hello"[..]), 5).await.unwrap();
        assert!(!captured.truncated);
    }

    #[tokio::test]
    async fn test_read_capped_bounds_memory() {
        // 64 MiB producer, 16 byte cap: the rest is drained, not buffered
        let producer = tokio::io::repeat(b'z').take(64 * 1024 * 1024);
        let captured = read_capped(Some(producer), 16).await.unwrap();
        assert_eq!(captured.bytes, vec![b'z'; 16]);
        assert!(captured.truncated);
        assert!(captured.bytes.capacity() < 1024 * 1024);
    }

    #[tokio::test]
    async fn test_read_capped_missing_pipe() {
        let captured = read_capped(None::<&[u8]>, 16).await.unwrap();
        assert!(captured.bytes.is_empty());
        assert!(!captured.truncated);
    }

    #[test]
    fn test_decode_on_char_boundary() {
        // "é" is two bytes; cutting after 2 bytes lands inside it
        assert_eq!(decode_output(&"aé".as_bytes()[..2], true), "a");
        assert_eq!(decode_output("aé".as_bytes(), false), "aé");
    }

    #[tokio::test]
    async fn test_echo_output_exact() {
        let gw = gateway(ExecMode::Whitelisted, &["echo"]);
        let output = gw
            .execute(&CommandRequest::new("echo").args(["hello"]))
            .await
            .unwrap();
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "");
        assert_eq!(output.exit_code, Some(0));
        assert!(output.success());
        assert_eq!(output.command, "echo hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_a_result() {
        let gw = gateway(ExecMode::Unrestricted, &[]);
        let output = gw
            .execute(&CommandRequest::new("sh").args(["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr, "oops\n");
        assert_eq!(output.stdout, "");
        assert_eq!(output.signal, None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_execution_failure() {
        let gw = gateway(ExecMode::Unrestricted, &[]);
        let err = gw
            .execute(&CommandRequest::new("linux-mcp-no-such-binary"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Spawn { .. }));
        assert!(err.is_execution_failure());
    }

    #[tokio::test]
    async fn test_timeout() {
        let gw = gateway(ExecMode::Unrestricted, &[]);
        let started = Instant::now();
        let err = gw
            .execute(&CommandRequest::new("sleep").args(["5"]).timeout_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(1)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_output_cap() {
        let mut config = Config::default();
        config.mode = ExecMode::Unrestricted;
        config.limits.max_output_bytes = 8;
        let gw = CommandGateway::new(config).unwrap();

        let output = gw
            .execute(&CommandRequest::new("sh").args(["-c", "printf 0123456789abcdef"]))
            .await
            .unwrap();
        assert_eq!(output.stdout, "01234567");
        assert!(output.truncated);
    }

    #[tokio::test]
    async fn test_large_producer_is_capped() {
        let mut config = Config::default();
        config.commands.allowed = vec!["head".to_string()];
        config.limits.max_output_bytes = 1024;
        config.timeouts.default_secs = 60;
        let gw = CommandGateway::new(config).unwrap();

        let output = gw
            .execute(&CommandRequest::new("head").args(["-c", "200000000", "/dev/zero"]))
            .await
            .unwrap();
        assert_eq!(output.stdout.len(), 1024);
        assert!(output.truncated);
        assert_eq!(output.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_killed_by_signal() {
        let gw = gateway(ExecMode::Unrestricted, &[]);
        let output = gw
            .execute(&CommandRequest::new("sh").args(["-c", "kill -9 $$"]))
            .await
            .unwrap();
        assert_eq!(output.exit_code, None);
        assert_eq!(output.signal, Some(9));
        assert!(!output.success());
        assert_eq!(output.to_string(), "TERMINATED BY SIGNAL: 9");
    }

    #[tokio::test]
    async fn test_environment_applied() {
        let mut config = Config::default();
        config.mode = ExecMode::Unrestricted;
        config
            .environment
            .set
            .insert("LINUX_MCP_TEST_VAR".to_string(), "set-by-config".to_string());
        let gw = CommandGateway::new(config).unwrap();

        let output = gw
            .execute(&CommandRequest::new("sh").args(["-c", "printf %s \"$LINUX_MCP_TEST_VAR\""]))
            .await
            .unwrap();
        assert_eq!(output.stdout, "set-by-config");
    }

    #[tokio::test]
    async fn test_cwd_applied() {
        let dir = tempfile::tempdir().unwrap();
        let gw = gateway(ExecMode::Unrestricted, &[]);
        let output = gw
            .execute(&CommandRequest::new("pwd").cwd(dir.path().to_str().unwrap()))
            .await
            .unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(output.stdout.trim_end(), expected.to_str().unwrap());
    }

    #[tokio::test]
    async fn test_shell_pipeline_unrestricted() {
        let gw = gateway(ExecMode::Unrestricted, &[]);
        let output = gw
            .execute_shell("printf 'b\\na\\n' | sort", None, None)
            .await
            .unwrap();
        assert_eq!(output.stdout, "a\nb\n");
        assert_eq!(output.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_shell_rejected_whitelisted() {
        let gw = gateway(ExecMode::Whitelisted, &["sh", "echo"]);
        let err = gw.execute_shell("echo hi", None, None).await.unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_allowed_commands_listing() {
        let gw = gateway(ExecMode::Whitelisted, &["uname", "df"]);
        let listing = gw.allowed_commands();
        assert_eq!(listing.mode, ExecMode::Whitelisted);
        assert_eq!(
            listing.commands.into_iter().collect::<Vec<_>>(),
            vec!["df".to_string(), "uname".to_string()]
        );
    }
}
