// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "stevedore")]
#[command(about = "Deploy web archives to a running server and wait until they answer")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stevedore.yml configuration file
    Init {
        /// Deployment directory to write into the template
        #[arg(long)]
        deploy_dir: Option<String>,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Run the deployment endpoint
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Deployment directory (overrides config)
        #[arg(long)]
        deploy_dir: Option<PathBuf>,
    },

    /// Deploy an archive or exploded directory
    Deploy {
        /// Archive file or exploded directory
        artifact: PathBuf,

        /// Mount path (default: derived from the artifact name)
        #[arg(short, long)]
        path: Option<String>,

        #[command(flatten)]
        monitor: MonitorArgs,
    },

    /// Undeploy whatever is mounted at a path
    Undeploy {
        /// Mount path to undeploy
        #[arg(short, long)]
        path: String,

        #[command(flatten)]
        monitor: MonitorArgs,
    },

    /// Undeploy then deploy an artifact at the same path
    Redeploy {
        /// Archive file or exploded directory
        artifact: PathBuf,

        /// Mount path (default: derived from the artifact name)
        #[arg(short, long)]
        path: Option<String>,

        #[command(flatten)]
        monitor: MonitorArgs,
    },

    /// Poll a URL until it answers or the timeout elapses
    Wait {
        /// URL to probe
        url: String,

        /// Substring the response body must contain
        #[arg(long)]
        contains: Option<String>,

        /// How long to wait (e.g. 20s, 500ms)
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,
    },
}

/// Optional confirmation by polling the deployed application.
#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    /// URL to probe after the action completes
    #[arg(long)]
    pub ping_url: Option<String>,

    /// Substring the probed response body must contain
    #[arg(long, requires = "ping_url")]
    pub contains: Option<String>,

    /// How long to wait for the probe to agree (e.g. 20s, 500ms)
    #[arg(long, value_parser = parse_duration, requires = "ping_url")]
    pub timeout: Option<Duration>,
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(s).map_err(|e| e.to_string())
}
