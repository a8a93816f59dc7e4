//! Server startup: tracing setup and the `serve_stdio!` entry point macro

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber for a server binary.
///
/// Output goes to stderr because stdout carries the MCP protocol. The crate
/// named by `crate_name` logs at `info` unless `RUST_LOG` says otherwise, and
/// `LOG_FORMAT=json` switches to one JSON object per line.
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let registry = tracing_subscriber::registry().with(filter);

    if json_requested() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

fn json_requested() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Generate `main` for a stdio MCP server.
///
/// The two-argument form builds the server with `<Type>::new()`. The
/// three-argument form names another associated constructor, which is how a
/// second binary can serve the same type in a different configuration:
///
/// ```rust,ignore
/// mcp_common::serve_stdio!(LinuxMcpServer, "linux_mcp");
/// mcp_common::serve_stdio!(LinuxMcpServer, "linux_mcp", unrestricted);
/// ```
///
/// Constructors return `Result<Self, E>` where `E` converts into
/// `anyhow::Error`, so a bad config file stops the process before the
/// transport is opened.
#[macro_export]
macro_rules! serve_stdio {
    ($server_type:ty, $crate_name:expr) => {
        $crate::serve_stdio!($server_type, $crate_name, new);
    };
    ($server_type:ty, $crate_name:expr, $ctor:ident) => {
        #[tokio::main]
        async fn main() -> anyhow::Result<()> {
            use rmcp::ServiceExt;

            $crate::init_tracing($crate_name)?;

            tracing::info!(concat!(
                "Starting ",
                $crate_name,
                " MCP Server (",
                stringify!($ctor),
                ")"
            ));

            let server = <$server_type>::$ctor()?;
            let service = server.serve(rmcp::transport::stdio()).await?;

            tracing::info!("Server running, waiting for requests...");

            service.waiting().await?;

            tracing::info!("Server shutting down");
            Ok(())
        }
    };
}
