//! Serve command - Run the monitor service
//!
//! Starts the line-protocol hub, the HTTP query surface and the event feed,
//! all sharing one `Monitor`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use jtail_api::{AppState, RouteOptions, build_router};
use jtail_auth::TokenGate;
use jtail_config::Config;
use jtail_tap::{TapServer, TapServerConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::feed::{self, DEFAULT_DEMO_INTERVAL};
use crate::monitor::{EventSink, Monitor};

/// How long each task gets to stop after the shutdown signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Hub port (overrides [server] tcp_port)
    #[arg(long, value_name = "PORT")]
    pub tcp_port: Option<u16>,

    /// HTTP port (overrides [web] port)
    #[arg(long, value_name = "PORT")]
    pub web_port: Option<u16>,

    /// Shared secret for tokens (random when neither flag nor config sets one)
    #[arg(short, long, env = "JTAIL_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Read JSON-lines events from a file, or `-` for stdin
    #[arg(long, value_name = "PATH")]
    pub feed: Option<String>,

    /// Generate synthetic events
    #[arg(long, conflicts_with = "feed")]
    pub demo: bool,

    /// Number of recent events kept for /jfr/history
    #[arg(long, value_name = "N")]
    pub history: Option<usize>,

    /// Do not start the HTTP surface
    #[arg(long)]
    pub no_web: bool,

    /// Welcome hub connections without a token
    #[arg(long)]
    pub no_auth: bool,
}

impl ServeArgs {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(port) = self.tcp_port {
            config.server.tcp_port = port;
        }
        if let Some(port) = self.web_port {
            config.web.port = port;
        }
        if let Some(secret) = &self.secret {
            config.auth.secret = Some(secret.clone());
        }
        if let Some(history) = self.history {
            config.stats.history_capacity = history;
        }
        if self.no_web {
            config.web.enabled = false;
        }
        if self.no_auth {
            config.server.require_auth = false;
        }

        config.validate().context("invalid configuration")?;
        Ok(())
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "jtail starting"
    );

    if let Err(e) = run_server(args, config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("jtail shutdown complete");
    Ok(())
}

/// Main server run loop
async fn run_server(args: ServeArgs, config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    let gate = build_gate(&config)?;
    let monitor = Arc::new(Monitor::from_config(&config, gate));

    // Hub
    let tap_maintenance = monitor.tap_point().spawn_maintenance(cancel.clone());
    let tap_config = TapServerConfig::default()
        .with_addr(resolve_addr(&config.tcp_addr()).await?)
        .with_auth_timeout(config.server.auth_timeout)
        .with_require_auth(config.server.require_auth);
    let tap_server = TapServer::bind(
        Arc::clone(monitor.tap_point()),
        monitor.gate().clone(),
        tap_config,
    )
    .await
    .context("failed to bind hub")?;
    let tap_addr = tap_server.local_addr()?;
    let tap_server_task = tap_server.spawn(cancel.clone());

    // HTTP surface
    let web_task = if config.web.enabled {
        Some(start_web_server(&config, &monitor, cancel.clone()).await?)
    } else {
        info!("HTTP surface disabled");
        None
    };

    // Feed
    let feed_task = start_feed(&args, &monitor, cancel.clone());

    info!(
        tcp_addr = %tap_addr,
        web_enabled = config.web.enabled,
        require_auth = config.server.require_auth,
        history_capacity = config.stats.history_capacity,
        "jtail running (use `jtail connect` to watch)"
    );

    wait_for_shutdown().await;

    info!("shutdown signal received, stopping monitor...");
    cancel.cancel();

    await_task("feed", feed_task).await;
    await_task("hub", tap_server_task).await;
    if let Some(task) = web_task {
        await_task("HTTP server", task).await;
    }

    let closed = monitor.tap_point().close_all();
    if closed > 0 {
        info!(peers = closed, "closed remaining hub peers");
    }
    tap_maintenance.abort();

    Ok(())
}

/// Token gate from the configured secret, or a random one
fn build_gate(config: &Config) -> Result<TokenGate> {
    match &config.auth.secret {
        Some(secret) => TokenGate::new(secret.clone()).context("invalid secret"),
        None => {
            let gate = TokenGate::ephemeral();
            warn!(
                secret = gate.secret(),
                "no secret configured, generated one for this run"
            );
            Ok(gate)
        }
    }
}

/// Resolve `host:port` to the first socket address
async fn resolve_addr(addr: &str) -> Result<SocketAddr> {
    tokio::net::lookup_host(addr)
        .await
        .with_context(|| format!("failed to resolve {}", addr))?
        .next()
        .with_context(|| format!("no address found for {}", addr))
}

/// Bind and spawn the HTTP query surface
async fn start_web_server(
    config: &Config,
    monitor: &Monitor,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    let routes = RouteOptions {
        stats_enabled: config.web.stats_enabled,
        dashboard_enabled: config.web.dashboard_enabled,
    };
    let state = AppState::new(
        Arc::clone(monitor.stats()),
        Arc::clone(monitor.tap_point()),
        monitor.gate().clone(),
    )
    .with_routes(routes);
    let app = build_router(state);

    let addr = config.web_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .context("failed to bind HTTP server")?;

    info!(
        addr = %addr,
        stats_enabled = routes.stats_enabled,
        dashboard_enabled = routes.dashboard_enabled,
        "HTTP server listening"
    );

    Ok(tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await;

        if let Err(e) = result {
            error!(error = %e, "HTTP server error");
        }
    }))
}

/// Spawn the configured event feed
fn start_feed(args: &ServeArgs, monitor: &Arc<Monitor>, cancel: CancellationToken) -> JoinHandle<()> {
    let sink: Arc<dyn EventSink> = Arc::clone(monitor) as Arc<dyn EventSink>;

    if args.demo {
        return tokio::spawn(async move {
            feed::run_demo(sink, DEFAULT_DEMO_INTERVAL, cancel).await;
        });
    }

    match args.feed.clone() {
        Some(path) => tokio::spawn(async move {
            if let Err(e) = feed::run_jsonl_path(&path, sink, cancel).await {
                error!(error = %e, path = %path, "feed failed");
            }
        }),
        None => {
            info!("no feed configured (use --feed or --demo); serving an idle stream");
            tokio::spawn(async {})
        }
    }
}

/// Wait for a task to stop within the shutdown timeout
async fn await_task<T>(name: &str, task: JoinHandle<T>) {
    let abort = task.abort_handle();
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!(error = %e, task = name, "task panicked during shutdown"),
        Err(_) => {
            warn!(task = name, "task did not finish within timeout, aborting");
            abort.abort();
        }
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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
}
