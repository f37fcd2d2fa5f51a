mod config;

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use config::{FileConfig, Overrides};
use podviz_k8s::{ClientOptions, KubeClient, probe};
use podviz_sync::{ClusterSync, SyncConfig, fetch_snapshot};
use podviz_tui::{DashboardScreen, DashboardState, Event, EventHandler, KeyBindings, Report, Tui};
use podviz_web::AppState;

/// podviz - Kubernetes pod and deployment readiness at a glance
#[derive(Parser, Debug)]
#[command(name = "podviz")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a kubeconfig file (defaults to ~/.kube/config)
    #[arg(long, global = true, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    context: Option<String>,

    /// Optional TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Default log filter, e.g. "info" or "podviz_sync=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a one-shot readiness report
    Show {
        /// Namespace to show (all namespaces when omitted)
        #[arg(short, long, default_value = "")]
        namespace: String,
    },

    /// Live terminal dashboard
    Watch {
        /// Namespace to show (all namespaces when omitted)
        #[arg(short, long, default_value = "")]
        namespace: String,

        /// Fallback refresh interval in seconds
        #[arg(long)]
        interval: Option<f64>,
    },

    /// Serve the dashboard API and websocket feed
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        bind: Option<IpAddr>,

        /// Fallback refresh interval in seconds
        #[arg(long)]
        interval: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = match &args.command {
        Command::Show { .. } => Overrides::default(),
        Command::Watch { interval, .. } => Overrides {
            tick_interval_secs: *interval,
            ..Default::default()
        },
        Command::Serve {
            port,
            bind,
            interval,
        } => Overrides {
            tick_interval_secs: *interval,
            bind: *bind,
            port: *port,
            ..Default::default()
        },
    };
    let config = FileConfig::load(args.config.as_deref())?.with_overrides(Overrides {
        log_level: args.log_level.clone(),
        ..overrides
    });

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    init_tracing(filter, log_target(&args.command, args.log_file.as_deref()))?;

    let result = run(args, config).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Where log output goes
#[derive(Debug, PartialEq, Eq)]
enum LogTarget {
    Stderr,
    File(PathBuf),
    Discard,
}

/// The live dashboard owns the terminal, so it never logs to stderr
fn log_target(command: &Command, log_file: Option<&Path>) -> LogTarget {
    match (log_file, command) {
        (Some(path), _) => LogTarget::File(path.to_path_buf()),
        (None, Command::Watch { .. }) => LogTarget::Discard,
        (None, _) => LogTarget::Stderr,
    }
}

fn init_tracing(filter: EnvFilter, target: LogTarget) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        LogTarget::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        LogTarget::Discard => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

async fn run(args: Args, config: FileConfig) -> Result<()> {
    let options = ClientOptions {
        kubeconfig: args.kubeconfig,
        context: args.context,
    };
    let client = KubeClient::connect(&options).await?;
    let sync_config = config.sync.to_sync_config().context("Invalid [sync] configuration")?;

    match args.command {
        Command::Show { namespace } => show(&client, &namespace).await,
        Command::Watch { namespace, .. } => watch(client, sync_config, namespace).await,
        Command::Serve { .. } => {
            let addr = SocketAddr::new(config.server.bind, config.server.port);
            serve(client, sync_config, addr).await
        }
    }
}

async fn show(client: &KubeClient, namespace: &str) -> Result<()> {
    let snapshot = fetch_snapshot(client, namespace)
        .await
        .context("Failed to read cluster state")?;
    print!("{}", Report::new(&snapshot));
    Ok(())
}

async fn watch(client: KubeClient, sync_config: SyncConfig, namespace: String) -> Result<()> {
    probe(&client, sync_config.probe_timeout)
        .await
        .context("Cluster is not reachable")?;

    let sync = ClusterSync::start(Arc::new(client), sync_config);
    let mut subscription = sync.hub().register();

    let mut state = DashboardState::new(namespace);
    if let Some(latest) = sync.latest() {
        state.update(latest);
    }

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let keybindings = KeyBindings::new();

    tui.draw(|frame| DashboardScreen::render(frame, &state))?;

    let mut lagged = false;
    while !state.should_quit {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        if let Some(action) = keybindings.get_action(&key) {
                            state.apply(action);
                        }
                    }
                    Event::Tick | Event::Resize(_, _) => {}
                    Event::Error(e) => state.show_error(e),
                }
            }

            update = subscription.recv() => {
                match update {
                    Some(snapshot) => state.update(snapshot),
                    None => lagged = true,
                }
            }
        }

        // Dropped by the hub for falling behind; rejoin
        if lagged {
            lagged = false;
            tracing::warn!(subscriber = %subscription.id(), "dashboard fell behind, resubscribing");
            subscription = sync.hub().register();
            if let Some(latest) = sync.latest() {
                state.update(latest);
            }
        }

        if !state.should_quit {
            tui.draw(|frame| DashboardScreen::render(frame, &state))?;
        }
    }

    events.shutdown();
    tui.restore()?;
    sync.hub().unregister(subscription.id());
    sync.shutdown().await;
    Ok(())
}

async fn serve(client: KubeClient, sync_config: SyncConfig, addr: SocketAddr) -> Result<()> {
    probe(&client, sync_config.probe_timeout)
        .await
        .context("Failed to connect to cluster")?;
    tracing::info!("✅ Successfully connected to Kubernetes cluster");

    let probe_timeout = sync_config.probe_timeout;
    let sync = ClusterSync::start(Arc::new(client), sync_config);

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let state = AppState {
        source: Arc::clone(sync.source()),
        hub: Arc::clone(sync.hub()),
        probe_timeout,
        shutdown,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let served = podviz_web::serve(listener, state).await;

    sync.shutdown().await;
    served.context("Server error")
}

/// Cancel `token` on Ctrl-C or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_for(argv: &[&str]) -> LogTarget {
        let args = Args::try_parse_from(argv).unwrap();
        log_target(&args.command, args.log_file.as_deref())
    }

    #[test]
    fn test_dashboard_never_logs_to_terminal() {
        assert_eq!(target_for(&["podviz", "watch"]), LogTarget::Discard);
        assert_eq!(
            target_for(&["podviz", "watch", "--log-file", "/tmp/podviz.log"]),
            LogTarget::File(PathBuf::from("/tmp/podviz.log"))
        );
    }

    #[test]
    fn test_other_commands_log_to_stderr() {
        assert_eq!(target_for(&["podviz", "show", "-n", "default"]), LogTarget::Stderr);
        assert_eq!(target_for(&["podviz", "serve", "--port", "9000"]), LogTarget::Stderr);
        assert_eq!(
            target_for(&["podviz", "--log-file", "out.log", "serve"]),
            LogTarget::File(PathBuf::from("out.log"))
        );
    }
}
