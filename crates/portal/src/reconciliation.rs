//! Snapshot reconciliation
//!
//! Merges the authoritative primary-network pillar list into the store:
//! unknown names become `Pending` records, known names get a weight
//! refresh, and proof-gated fields are never touched. One malformed
//! tuple never aborts the rest of the batch.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use zenon::{FrontierLookup, PillarSnapshot, PillarSource};

use crate::persistence::{PillarStore, UpsertOutcome};

/// Counts from one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Reconciles the external pillar snapshot into the store.
///
/// The frontier lookup is an optional, explicitly configured extension:
/// when present it resolves public keys for pillars that do not have one
/// yet, and never overwrites a stored key.
pub struct ReconciliationJob {
    store: Arc<PillarStore>,
    source: Arc<dyn PillarSource>,
    frontier: Option<Arc<dyn FrontierLookup>>,
}

impl ReconciliationJob {
    pub fn new(
        store: Arc<PillarStore>,
        source: Arc<dyn PillarSource>,
        frontier: Option<Arc<dyn FrontierLookup>>,
    ) -> Self {
        Self {
            store,
            source,
            frontier,
        }
    }

    /// Fetch the snapshot and upsert every tuple, sequentially.
    ///
    /// Idempotent per tuple: a second run with the same input changes
    /// nothing beyond `updated_at`. Per-item failures are logged and
    /// skipped. The completion time is recorded in system state for the
    /// external trigger's rate limiting.
    pub async fn run(&self) -> Result<ReconciliationOutcome> {
        let snapshots = self
            .source
            .fetch_all()
            .await
            .context("failed to fetch the pillar snapshot")?;

        let mut outcome = ReconciliationOutcome::default();
        for snapshot in &snapshots {
            match self.apply(snapshot).await {
                Ok(UpsertOutcome::Created) => outcome.created += 1,
                Ok(UpsertOutcome::Updated) => outcome.updated += 1,
                Err(e) => {
                    warn!(pillar = %snapshot.name, error = %e, "Skipping snapshot entry");
                    outcome.skipped += 1;
                }
            }
        }

        self.store
            .record_reconciliation(Utc::now())
            .await
            .context("failed to record the reconciliation run")?;

        info!(
            created = outcome.created,
            updated = outcome.updated,
            skipped = outcome.skipped,
            "Reconciliation completed"
        );
        Ok(outcome)
    }

    async fn apply(&self, snapshot: &PillarSnapshot) -> Result<UpsertOutcome> {
        let weight: u128 = snapshot
            .weight
            .parse()
            .context("weight is not a non-negative integer")?;

        let outcome = self
            .store
            .upsert_snapshot(&snapshot.name, &snapshot.owner_address, weight)
            .await?;

        if let Some(frontier) = &self.frontier {
            self.fill_public_key(frontier.as_ref(), snapshot).await;
        }

        Ok(outcome)
    }

    /// Best-effort public key resolution; a lookup failure must not
    /// undo the weight refresh that already happened.
    async fn fill_public_key(&self, frontier: &dyn FrontierLookup, snapshot: &PillarSnapshot) {
        let known = match self.store.find_by_name(&snapshot.name).await {
            Ok(Some(pillar)) => pillar.public_key.is_some(),
            _ => true,
        };
        if known {
            return;
        }

        match frontier.public_key_for(&snapshot.owner_address).await {
            Ok(Some(public_key)) => {
                if let Err(e) = self
                    .store
                    .set_public_key_if_absent(&snapshot.name, &public_key)
                    .await
                {
                    warn!(pillar = %snapshot.name, error = %e, "Failed to store resolved public key");
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(pillar = %snapshot.name, error = %e, "Frontier lookup failed");
            }
        }
    }
}
