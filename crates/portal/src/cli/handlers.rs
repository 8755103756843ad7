//! Command dispatch

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::config::{ConfigValidation, LoggingConfig};
use zenon::{
    Address, FrontierLookup, LocalSignatureAuthority, PillarSource, RemoteSignatureAuthority,
    SignatureAuthority, ZenonHubClient, PUBLIC_KEY_LENGTH,
};

use crate::api::{ApiHandler, ApiState};
use crate::config::{PortalConfig, SignatureVerifier};
use crate::persistence::PillarStore;
use crate::reconciliation::ReconciliationJob;
use crate::registration::RegistrationWorkflow;

use super::Command;

pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, command: Command, config_path: Option<PathBuf>) -> Result<()> {
        match command {
            Command::Serve => self.serve(config_path).await,
            Command::Sync => self.sync(config_path).await,
            Command::Derive { public_key } => self.derive(&public_key),
            Command::GenConfig { output } => self.gen_config(&output),
        }
    }

    async fn serve(&self, config_path: Option<PathBuf>) -> Result<()> {
        let config = load_config(config_path)?;
        init_logging(&config.logging);
        log_warnings(&config);

        let store = Arc::new(PillarStore::new(&config.database).await?);
        let hub = Arc::new(ZenonHubClient::new(
            config.zenon.api_base_url.clone(),
            config.zenon.request_timeout,
        ));

        let authority: Arc<dyn SignatureAuthority> = match config.signature.verifier {
            SignatureVerifier::Remote => Arc::new(RemoteSignatureAuthority::new(
                config.zenon.verify_endpoint.clone(),
                config.zenon.request_timeout,
            )),
            SignatureVerifier::Local => Arc::new(LocalSignatureAuthority),
        };

        let frontier: Option<Arc<dyn FrontierLookup>> = config
            .zenon
            .frontier_lookup
            .then(|| hub.clone() as Arc<dyn FrontierLookup>);
        let reconciliation = Arc::new(ReconciliationJob::new(
            store.clone(),
            hub as Arc<dyn PillarSource>,
            frontier,
        ));

        let workflow = Arc::new(RegistrationWorkflow::new(
            store.clone(),
            authority,
            config.signature.message_suffix.clone(),
        ));

        let state = ApiState {
            store,
            workflow,
            reconciliation,
            sync: config.sync.clone(),
        };

        ApiHandler::new(state)
            .start(&config.server.listen_address())
            .await
    }

    async fn sync(&self, config_path: Option<PathBuf>) -> Result<()> {
        let config = load_config(config_path)?;
        init_logging(&config.logging);
        log_warnings(&config);

        let store = Arc::new(PillarStore::new(&config.database).await?);
        let hub = Arc::new(ZenonHubClient::new(
            config.zenon.api_base_url.clone(),
            config.zenon.request_timeout,
        ));
        let frontier: Option<Arc<dyn FrontierLookup>> = config
            .zenon
            .frontier_lookup
            .then(|| hub.clone() as Arc<dyn FrontierLookup>);

        let job = ReconciliationJob::new(store, hub as Arc<dyn PillarSource>, frontier);
        let outcome = job.run().await?;

        info!(
            created = outcome.created,
            updated = outcome.updated,
            skipped = outcome.skipped,
            "Manual reconciliation pass finished"
        );
        Ok(())
    }

    fn derive(&self, public_key: &str) -> Result<()> {
        let bytes = hex::decode(public_key).context("public key is not valid hexadecimal")?;
        let key: [u8; PUBLIC_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("public key must be {PUBLIC_KEY_LENGTH} bytes"))?;

        println!("{}", Address::from_public_key(&key));
        Ok(())
    }

    fn gen_config(&self, output: &Path) -> Result<()> {
        let config = PortalConfig::default();
        let rendered =
            toml::to_string_pretty(&config).context("failed to render default configuration")?;
        std::fs::write(output, rendered)
            .with_context(|| format!("failed to write {}", output.display()))?;

        println!("Wrote default configuration to {}", output.display());
        Ok(())
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn load_config(config_path: Option<PathBuf>) -> Result<PortalConfig> {
    let config = match config_path {
        Some(path) => PortalConfig::load_from_file(&path)?,
        None => PortalConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

fn log_warnings(config: &PortalConfig) {
    for warning in config.warnings() {
        warn!("{warning}");
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.format.as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.init(),
    }
}
