//! CLI for openthermal — watch a thermal sensor stream live in your terminal.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "openthermal")]
#[command(about = "openthermal — live thermal-camera stream viewer")]
#[command(version = openthermal_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a stream as a live thermal view (TUI)
    Watch {
        /// Stream service endpoint (or OPENTHERMAL_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,

        /// Stream name to tail (or OPENTHERMAL_STREAM)
        #[arg(long)]
        stream: Option<String>,

        /// Bearer credential (or OPENTHERMAL_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Seconds between idle redraws; new frames always repaint immediately
        #[arg(long, default_value = "1.0")]
        refresh: f64,
    },

    /// Print decoded frames to stdout as they arrive
    Tail {
        /// Stream service endpoint (or OPENTHERMAL_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,

        /// Stream name to tail (or OPENTHERMAL_STREAM)
        #[arg(long)]
        stream: Option<String>,

        /// Bearer credential (or OPENTHERMAL_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Output format: text lines, JSON lines, or raw undecoded record bodies
        #[arg(long, default_value = "text", value_parser = ["text", "json", "raw"])]
        format: String,

        /// Stop after this many frames (0 = unlimited)
        #[arg(long, default_value = "0")]
        limit: u64,
    },

    /// Resolve the stream tail and report connectivity
    Check {
        /// Stream service endpoint (or OPENTHERMAL_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,

        /// Stream name to check (or OPENTHERMAL_STREAM)
        #[arg(long)]
        stream: Option<String>,

        /// Bearer credential (or OPENTHERMAL_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Machine-readable JSON output
        #[arg(long)]
        json: bool,
    },

    /// Run a local stream service with a synthetic thermal camera
    Simulate {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8833")]
        port: u16,

        /// Stream name to serve
        #[arg(long, default_value = "amg8833")]
        stream: String,

        /// Frame cadence in milliseconds
        #[arg(long, default_value = "100")]
        interval_ms: u64,

        /// Require this bearer token on every request
        #[arg(long)]
        token: Option<String>,

        /// Idle keepalive cadence in milliseconds
        #[arg(long, default_value = "10000")]
        keepalive_ms: u64,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            endpoint,
            stream,
            token,
            refresh,
        } => commands::watch::run(endpoint, stream, token, refresh),
        Commands::Tail {
            endpoint,
            stream,
            token,
            format,
            limit,
        } => commands::tail::run(endpoint, stream, token, &format, limit),
        Commands::Check {
            endpoint,
            stream,
            token,
            json,
        } => commands::check::run(endpoint, stream, token, json),
        Commands::Simulate {
            host,
            port,
            stream,
            interval_ms,
            token,
            keepalive_ms,
        } => commands::simulate::run(&host, port, stream, interval_ms, token, keepalive_ms),
    }
}
