//! Linux MCP (unrestricted) - any command runs, and run_shell is enabled.
//!
//! Only expose this to clients you would hand a shell.

use linux_mcp::LinuxMcpServer;

mcp_common::serve_stdio!(LinuxMcpServer, "linux_mcp", unrestricted);
