//! # Pillar Portal
//!
//! Binary entrypoint: parses the CLI and dispatches to the portal
//! library. Logging is initialized per-command once the configuration
//! is known.

use anyhow::Result;

use portal::cli::{Args, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();
    let cli = Cli::new();

    cli.run(args).await
}
