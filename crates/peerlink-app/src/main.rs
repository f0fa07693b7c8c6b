//! PeerLink command-line front end.
//!
//! # Usage
//!
//! ```text
//! peerlink [OPTIONS] <COMMAND>
//!
//! Commands:
//!   resolve   Resolve the transport configuration and print it as JSON
//!   demo      Run a host and clients on the in-memory transport
//!
//! Options:
//!   --config <FILE>               TOML settings file
//!   --project <NAME>              Metered project name
//!   --api-key <KEY>               Metered API key
//!   --peer-host <HOST>            Signaling host [default: localhost]
//!   --peer-port <PORT>            Signaling port [default: 9000]
//!   --peer-path <PATH>            Signaling path [default: /]
//!   --credential-base-url <URL>   Credential service base URL override
//! ```
//!
//! # Environment variable overrides
//!
//! Every option can also be set through the environment.  Flags take
//! precedence over variables, and both take precedence over the settings
//! file.
//!
//! | Variable            | Option                  |
//! |---------------------|-------------------------|
//! | `PEERLINK_CONFIG`   | `--config`              |
//! | `METERED_PROJECT`   | `--project`             |
//! | `METERED_API_KEY`   | `--api-key`             |
//! | `PEER_HOST`         | `--peer-host`           |
//! | `PEER_PORT`         | `--peer-port`           |
//! | `PEER_PATH`         | `--peer-path`           |
//! | `METERED_BASE_URL`  | `--credential-base-url` |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use peerlink_app::application::{RunningSession, SessionBootstrap};
use peerlink_app::domain::{ResolverSettings, Route};
use peerlink_app::infrastructure::{ConfigResolver, CredentialFetcher, StaticCredentialFetcher};
use peerlink_core::transport::memory::MemoryTransport;
use peerlink_core::{ConnectionStatus, PeerTransport};
use peerlink_host::SessionStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// How long the demo waits for messages to reach the host.
const DEMO_SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// PeerLink: host/client sessions over peer-to-peer data channels.
#[derive(Debug, Parser)]
#[command(name = "peerlink", version)]
struct Cli {
    /// TOML settings file; flags and environment variables override it.
    #[arg(long, global = true, env = "PEERLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Metered project name (the `{project}.metered.live` subdomain).
    #[arg(long, global = true, env = "METERED_PROJECT")]
    project: Option<String>,

    /// Metered API key.
    #[arg(long, global = true, env = "METERED_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Signaling server host.
    #[arg(long, global = true, env = "PEER_HOST")]
    peer_host: Option<String>,

    /// Signaling server port.
    #[arg(long, global = true, env = "PEER_PORT")]
    peer_port: Option<u16>,

    /// Signaling server path.
    #[arg(long, global = true, env = "PEER_PATH")]
    peer_path: Option<String>,

    /// Base URL replacing `https://{project}.metered.live`.
    #[arg(long, global = true, env = "METERED_BASE_URL")]
    credential_base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve the transport configuration and print it as JSON.
    Resolve,

    /// Run a host and clients on the in-memory transport and print what the
    /// host recorded.
    Demo {
        /// Number of clients to connect.
        #[arg(long, default_value_t = 2)]
        clients: usize,

        /// Message each client sends once connected.
        #[arg(long, default_value = "hi")]
        message: String,

        /// Serve a built-in STUN-only credential response instead of calling
        /// the credential service.  Missing project and API key are filled
        /// with placeholders.
        #[arg(long)]
        offline: bool,
    },
}

impl Cli {
    /// Builds the resolver settings: defaults, then the settings file, then
    /// flags and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `--config` names a file that cannot be read or
    /// parsed.
    fn resolver_settings(&self) -> anyhow::Result<ResolverSettings> {
        let mut settings = match &self.config {
            Some(path) => ResolverSettings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => ResolverSettings::default(),
        };

        if let Some(project) = &self.project {
            settings.project = Some(project.clone());
        }
        if let Some(api_key) = &self.api_key {
            settings.api_key = Some(api_key.clone());
        }
        if let Some(host) = &self.peer_host {
            settings.signaling.host = host.clone();
        }
        if let Some(port) = self.peer_port {
            settings.signaling.port = port;
        }
        if let Some(path) = &self.peer_path {
            settings.signaling.path = path.clone();
        }
        if let Some(base) = &self.credential_base_url {
            settings.credential_base_url = Some(base.clone());
        }
        Ok(settings)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = cli.resolver_settings()?;

    match cli.command {
        Command::Resolve => {
            let resolver = ConfigResolver::from_settings(settings)?;
            let config = resolver.resolve().await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Demo {
            clients,
            message,
            offline,
        } => {
            let demo = async {
                if offline {
                    let settings = with_placeholder_credentials(settings);
                    run_demo(
                        ConfigResolver::new(settings, StaticCredentialFetcher::stun_only()),
                        clients,
                        &message,
                    )
                    .await
                } else {
                    run_demo(ConfigResolver::from_settings(settings)?, clients, &message).await
                }
            };

            tokio::select! {
                result = demo => result?,
                signal = tokio::signal::ctrl_c() => {
                    signal.context("listening for Ctrl+C")?;
                    info!("received Ctrl+C; stopping demo");
                }
            }
        }
    }

    Ok(())
}

fn with_placeholder_credentials(mut settings: ResolverSettings) -> ResolverSettings {
    settings.project.get_or_insert_with(|| "offline".to_string());
    settings.api_key.get_or_insert_with(|| "offline".to_string());
    settings
}

// ── Demo ──────────────────────────────────────────────────────────────────────

/// Starts one host and `clients` clients that each send `message`, then
/// prints the host's view before and after the clients leave.
async fn run_demo<F: CredentialFetcher>(
    resolver: ConfigResolver<F>,
    clients: usize,
    message: &str,
) -> anyhow::Result<()> {
    let transport: Arc<dyn PeerTransport> = Arc::new(MemoryTransport::new());
    let store = SessionStore::new();
    let bootstrap = SessionBootstrap::new(resolver, transport).with_store(store.clone());

    let RunningSession::Host(host) = bootstrap.start(&Route::Host).await? else {
        bail!("host route did not start a host session");
    };
    let join_path = host.join_path();
    println!("host {} is waiting for clients at {join_path}", host.identity());

    let route = Route::parse(&join_path)?;
    let mut sessions = Vec::with_capacity(clients);
    for _ in 0..clients {
        let RunningSession::Client(client) = bootstrap.start(&route).await? else {
            bail!("join route did not start a client session");
        };
        let view = client
            .watch()
            .wait_for(|view| view.status != ConnectionStatus::Pending)
            .await
            .context("client session ended while connecting")?
            .clone();
        if let Some(error) = view.error {
            bail!("client could not connect: {error}");
        }
        client.send(message);
        sessions.push(client);
    }

    wait_for_store(&store, |clients, messages| {
        clients == sessions.len() && messages == sessions.len()
    })
    .await?;
    print_store("connected", &store);

    drop(sessions);
    wait_for_store(&store, |clients, _| clients == 0).await?;
    print_store("after clients left", &store);

    host.shutdown();
    Ok(())
}

/// Waits until `check(client count, message count)` holds.
async fn wait_for_store(
    store: &SessionStore,
    check: impl Fn(usize, usize) -> bool,
) -> anyhow::Result<()> {
    let mut changes = store.subscribe();
    let settled = async {
        loop {
            let state = store.snapshot();
            let messages = state.messages().values().map(Vec::len).sum();
            if check(state.clients().len(), messages) {
                break;
            }
            changes.changed().await.context("host store dropped")?;
        }
        Ok::<(), anyhow::Error>(())
    };

    tokio::time::timeout(DEMO_SETTLE_TIMEOUT, settled)
        .await
        .context("host store did not settle")?
}

fn print_store(label: &str, store: &SessionStore) {
    let clients = store.select_clients();
    println!("clients {label}: {}", clients.len());
    for client in &clients {
        println!("  - {client}");
    }
    println!("messages:");
    for (client, messages) in store.select_messages() {
        println!("  {client}: {messages:?}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_resolve_subcommand_parses() {
        let cli = Cli::parse_from(["peerlink", "resolve"]);
        assert!(matches!(cli.command, Command::Resolve));
    }

    #[test]
    fn test_cli_demo_defaults() {
        // Arrange: no demo options
        let cli = Cli::parse_from(["peerlink", "demo"]);

        // Assert
        match cli.command {
            Command::Demo {
                clients,
                message,
                offline,
            } => {
                assert_eq!(clients, 2);
                assert_eq!(message, "hi");
                assert!(!offline);
            }
            other => panic!("expected demo, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_demo_overrides() {
        let cli = Cli::parse_from(["peerlink", "demo", "--clients", "5", "--message", "yo", "--offline"]);
        match cli.command {
            Command::Demo {
                clients,
                message,
                offline,
            } => {
                assert_eq!(clients, 5);
                assert_eq!(message, "yo");
                assert!(offline);
            }
            other => panic!("expected demo, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_are_accepted_after_subcommand() {
        let cli = Cli::parse_from(["peerlink", "resolve", "--project", "demo", "--peer-port", "9443"]);
        assert_eq!(cli.project.as_deref(), Some("demo"));
        assert_eq!(cli.peer_port, Some(9443));
    }

    #[test]
    fn test_flags_override_signaling_defaults() {
        // Arrange
        let cli = Cli::parse_from([
            "peerlink",
            "--peer-host",
            "peer.example.com",
            "--peer-port",
            "443",
            "--peer-path",
            "/peerjs",
            "resolve",
        ]);

        // Act
        let settings = cli.resolver_settings().unwrap();

        // Assert
        assert_eq!(settings.signaling.host, "peer.example.com");
        assert_eq!(settings.signaling.port, 443);
        assert_eq!(settings.signaling.path, "/peerjs");
    }

    #[test]
    fn test_flags_take_precedence_over_settings_file() {
        // Arrange: settings file with project and signaling port
        let path = std::env::temp_dir().join(format!("peerlink-cli-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "project = \"from-file\"\napi_key = \"file-key\"\n[signaling]\nport = 7000").unwrap();
        drop(file);

        let cli = Cli::parse_from([
            "peerlink",
            "--config",
            path.to_str().unwrap(),
            "--project",
            "from-flag",
            "resolve",
        ]);

        // Act
        let settings = cli.resolver_settings().unwrap();
        std::fs::remove_file(&path).unwrap();

        // Assert
        assert_eq!(settings.project.as_deref(), Some("from-flag"));
        assert_eq!(settings.api_key.as_deref(), Some("file-key"));
        assert_eq!(settings.signaling.port, 7000);
    }

    #[test]
    fn test_unreadable_settings_file_is_an_error() {
        let cli = Cli::parse_from(["peerlink", "--config", "/nonexistent/peerlink.toml", "resolve"]);
        assert!(cli.resolver_settings().is_err());
    }

    #[test]
    fn test_placeholder_credentials_keep_configured_values() {
        let settings = ResolverSettings {
            project: Some("real".to_string()),
            ..ResolverSettings::default()
        };

        let settings = with_placeholder_credentials(settings);

        assert_eq!(settings.project.as_deref(), Some("real"));
        assert_eq!(settings.api_key.as_deref(), Some("offline"));
    }

    #[tokio::test]
    async fn test_offline_demo_runs_to_completion() {
        let resolver = ConfigResolver::new(
            with_placeholder_credentials(ResolverSettings::default()),
            StaticCredentialFetcher::stun_only(),
        );

        let result = run_demo(resolver, 3, "hi").await;

        assert!(result.is_ok(), "demo failed: {result:?}");
    }
}
