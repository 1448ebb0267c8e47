//! `dox serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use dox_config::{CliSettings, Config};
use dox_server::run_server;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover dox.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Documentation content directory (overrides config).
    #[arg(short, long)]
    docs_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode (show drafts, bypass caches).
    #[arg(long, env = "DOX_DEV")]
    pub dev: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable live reload (default: enabled).
    #[arg(long)]
    live_reload: Option<bool>,

    /// Disable live reload.
    #[arg(long, conflicts_with = "live_reload")]
    no_live_reload: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        // Resolve flags before moving into CliSettings
        let live_reload_enabled = self.resolve_live_reload_enabled();

        // Build CLI settings from args
        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            docs_dir: self.docs_dir,
            dev: self.dev.then_some(true),
            live_reload_enabled,
        };

        // Load config
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        // Print startup info
        output.info(&format!(
            "{}: starting server on {}:{}",
            config.site.name, config.server.host, config.server.port
        ));
        output.info(&format!(
            "Docs directory: {}",
            config.docs_resolved.dir.display()
        ));

        if config.blog_resolved.enabled {
            output.info(&format!(
                "Blog directory: {}",
                config.blog_resolved.dir.display()
            ));
        } else {
            output.info("Blog: disabled");
        }

        if config.dev {
            output.success("Development mode: drafts visible, caching disabled");
        }

        if config.live_reload.enabled {
            output.info("Live reload: enabled");
        } else {
            output.info("Live reload: disabled");
        }

        run_server(config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }

    /// Resolve `live_reload_enabled` from --live-reload/--no-live-reload flags.
    fn resolve_live_reload_enabled(&self) -> Option<bool> {
        self.no_live_reload.then_some(false).or(self.live_reload)
    }
}
