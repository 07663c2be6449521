//! Circuit breaker management service.
//!
//! ```text
//!     breakers.toml ──▶ config ──▶ lifecycle::bootstrap ──▶ BreakerRegistry
//!          │                                                   ▲     ▲
//!          └── watcher ──▶ apply_config_updates ───────────────┘     │
//!                                                                    │
//!     Operator ──▶ http server ──▶ admin router ─────────────────────┘
//! ```

use arc_swap::ArcSwap;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use breaker_registry::config::{load_config, watcher::ConfigWatcher};
use breaker_registry::http::AdminServer;
use breaker_registry::lifecycle::{apply_config_updates, bootstrap, signals, Shutdown};
use breaker_registry::observability::{init_logging, metrics};

#[derive(Parser)]
#[command(name = "breaker-registry")]
#[command(about = "Keyed circuit breakers with a management API", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "BREAKER_CONFIG", default_value = "config/breakers.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    init_logging(&config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        path = ?args.config,
        bind_address = %config.listener.bind_address,
        breakers = config.breakers.len(),
        "breaker-registry starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = bootstrap(&config)?;
    let shutdown = Shutdown::new();

    if config.observability.metrics_enabled {
        tokio::spawn(metrics::run_state_sampler(
            registry.clone(),
            Duration::from_secs(config.observability.state_sample_secs.max(1)),
            shutdown.subscribe(),
        ));
    }

    let bind_address = config.listener.bind_address.clone();
    let current = Arc::new(ArcSwap::from_pointee(config));

    let (watcher, updates) = ConfigWatcher::new(&args.config);
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };
    let reload = tokio::spawn(apply_config_updates(
        updates,
        current.clone(),
        registry.clone(),
        shutdown.subscribe(),
    ));

    let listener = TcpListener::bind(&bind_address).await?;
    let server = AdminServer::new(current, registry);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::wait_for_termination().await;
    shutdown.trigger();

    server_task.await??;
    let _ = reload.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
