use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "passkey-pay")]
#[command(about = "Passkey wallet transfer client for Solana devnet")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the SOL balance of an address (defaults to the configured wallet)
    Balance {
        address: Option<String>,

        /// Bypass the refresh debounce window
        #[arg(short, long)]
        force: bool,
    },

    /// Send SOL to a recipient, chunking amounts above the per-call limit
    Send {
        recipient: String,

        /// Amount in SOL
        amount: f64,

        /// Override the configured per-chunk ceiling (SOL)
        #[arg(long)]
        max_chunk: Option<f64>,

        /// Pay the network fee from the wallet instead of the sponsor
        #[arg(long)]
        no_sponsor: bool,
    },

    /// Sign an arbitrary text message with the configured wallet
    Sign { message: String },

    /// Stream balance changes for an address over websocket
    Watch { address: Option<String> },

    /// Run the HTTP API server
    Serve {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
