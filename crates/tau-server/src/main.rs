//! tau server entry point.
//!
//! Listens for renderer connections and serves one of the demo applications
//! to each of them.
//!
//! # Usage
//!
//! ```text
//! tau-server [OPTIONS]
//!
//! Options:
//!   --config <PATH>      Config file [default: platform config dir]
//!   --bind <ADDR>        Override `network.bind_address`
//!   --port <PORT>        Override `network.port`
//!   --demo <DEMO>        Override `server.demo` [extended, hotkeys]
//!   --write-config       Write the effective config to the config path and exit
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML file, defaults when missing
//!  └─ run_server()           -- accept loop (infrastructure::network)
//!       └─ serve_connection() per renderer
//!            └─ Session<ExtendedDemo | HotkeyDemo>
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tau_server::application::extended_demo::ExtendedDemo;
use tau_server::application::hotkey_demo::{HotkeyDemo, HotkeyInjector, LoggingHotkeyInjector};
use tau_server::application::DemoKind;
use tau_server::infrastructure::network::run_server;
use tau_server::infrastructure::storage::config::{
    config_file_path, load_config, save_config, ServerConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Serves tau layouts to remote renderers over TCP.
#[derive(Debug, Parser)]
#[command(name = "tau-server", about = "Remote UI layout server", version)]
struct Cli {
    /// Path of the TOML config file.
    ///
    /// Defaults to `config.toml` in the platform config directory.  A missing
    /// file means all defaults.
    #[arg(long, env = "TAU_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to listen on, overriding the config file.
    #[arg(long, env = "TAU_BIND")]
    bind: Option<String>,

    /// TCP port to listen on, overriding the config file.
    #[arg(long, env = "TAU_PORT")]
    port: Option<u16>,

    /// Demo application to serve, overriding the config file.
    #[arg(long, value_enum, env = "TAU_DEMO")]
    demo: Option<DemoKind>,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    /// Resolves the config file location: `--config` first, then the platform
    /// default.
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given"),
        }
    }

    /// Applies command-line overrides on top of the loaded file.
    fn apply_overrides(&self, config: &mut ServerConfig) {
        if let Some(bind) = &self.bind {
            config.network.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(demo) = self.demo {
            config.server.demo = demo;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config_path()?;
    let mut config = load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;

    if cli.write_config {
        save_config(&config, &config_path)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }

    // Initialise structured logging.  `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    info!(
        "tau server starting: demo={}, config={}",
        config.server.demo,
        config_path.display()
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    // ── Main server loop ──────────────────────────────────────────────────────
    match config.server.demo {
        DemoKind::Extended => run_server(&config, running, ExtendedDemo::new).await?,
        DemoKind::Hotkeys => {
            let injector: Arc<dyn HotkeyInjector> = Arc::new(LoggingHotkeyInjector);
            run_server(&config, running, move || {
                HotkeyDemo::new(Arc::clone(&injector))
            })
            .await?
        }
    }

    info!("tau server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
