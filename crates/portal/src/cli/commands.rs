use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Run one reconciliation pass against the primary network
    Sync,

    /// Derive the address owned by a public key
    Derive {
        /// Public key as 64 hexadecimal characters
        public_key: String,
    },

    /// Write a default configuration file
    GenConfig {
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
