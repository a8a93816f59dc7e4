//! Linux MCP - command execution server, whitelisted unless config says otherwise

use linux_mcp::LinuxMcpServer;

mcp_common::serve_stdio!(LinuxMcpServer, "linux_mcp");
