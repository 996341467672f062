// ABOUTME: Entry point for the stevedore CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Action;
use std::env;
use stevedore::config::{self, Config, MonitorConfig};
use stevedore::error::{Error, Result};
use stevedore::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { deploy_dir, force } => {
            config::init_config(&cwd, deploy_dir.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Serve { listen, deploy_dir } => {
            let mut config = Config::discover(&cwd)?;
            if let Some(listen) = listen {
                config.listen = listen;
            }
            if let Some(dir) = deploy_dir {
                config.deploy_dir = cwd.join(dir);
            }
            commands::serve(config, output).await
        }
        Commands::Deploy {
            artifact,
            path,
            monitor,
        } => {
            let config = Config::discover(&cwd)?;
            commands::deploy(config, Action::Deploy, Some(artifact), path, monitor, output).await
        }
        Commands::Undeploy { path, monitor } => {
            let config = Config::discover(&cwd)?;
            commands::deploy(config, Action::Undeploy, None, Some(path), monitor, output).await
        }
        Commands::Redeploy {
            artifact,
            path,
            monitor,
        } => {
            let config = Config::discover(&cwd)?;
            commands::deploy(config, Action::Redeploy, Some(artifact), path, monitor, output).await
        }
        Commands::Wait {
            url,
            contains,
            timeout,
        } => {
            // Standalone waits work without a project config.
            let settings = match Config::discover(&cwd) {
                Ok(config) => config.monitor,
                Err(Error::ConfigNotFound(_)) => MonitorConfig::default(),
                Err(e) => return Err(e),
            };
            commands::wait(&url, contains, timeout, &settings, output).await
        }
    }
}
