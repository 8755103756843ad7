//! Orchestration of a single registration attempt

use std::sync::Arc;
use tracing::{info, warn};

use zenon::{canonical_message, verify_public_key, SignatureAuthority, SignatureCheck};

use crate::persistence::{PillarStore, RegistrationUpdate};

use super::{validation, RegistrationData, RegistrationError};

/// Validates, proves, and persists one pillar update.
///
/// The sequence is fail-fast with no partial writes: lookup, structural
/// validation, ownership proof, signature proof, then a single persist
/// step. Re-running against an already `Registered` pillar is allowed
/// and overwrites the proof-gated fields idempotently.
pub struct RegistrationWorkflow {
    store: Arc<PillarStore>,
    authority: Arc<dyn SignatureAuthority>,
    message_suffix: String,
}

impl RegistrationWorkflow {
    pub fn new(
        store: Arc<PillarStore>,
        authority: Arc<dyn SignatureAuthority>,
        message_suffix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            authority,
            message_suffix: message_suffix.into(),
        }
    }

    /// Run the workflow for `pillar_name`.
    ///
    /// Returns the pillar name on success so callers can echo it.
    pub async fn register(
        &self,
        pillar_name: &str,
        data: &RegistrationData,
    ) -> Result<String, RegistrationError> {
        let pillar = self
            .store
            .find_by_name(pillar_name)
            .await?
            .ok_or_else(|| RegistrationError::NotFound(pillar_name.to_string()))?;

        validation::validate(data)?;

        // Ownership: the submitted key must derive to the stored address
        let public_key = hex::decode(&data.public_key).map_err(|_| {
            RegistrationError::validation("publicKey", "must be valid hexadecimal")
        })?;
        if !verify_public_key(&pillar.address, &public_key) {
            warn!(
                pillar = %pillar.name,
                "Registration rejected: public key does not derive to the pillar's address"
            );
            return Err(RegistrationError::OwnershipMismatch);
        }

        // Authorization: the authority must accept the signed canonical
        // message. A rejection and an unreachable authority read the same.
        let message = canonical_message(
            &pillar.name,
            &data.secondary_name,
            &data.secondary_owner_address,
            &data.secondary_withdraw_address,
            &data.secondary_producer_address,
            data.secondary_identity_key.as_deref(),
            &self.message_suffix,
        );
        let check = SignatureCheck {
            message,
            signature: data.signature.clone(),
            public_key: data.public_key.clone(),
            address: pillar.address.clone(),
        };
        let accepted = match self.authority.verify(&check).await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(pillar = %pillar.name, error = %e, "Signature authority unreachable");
                false
            }
        };
        if !accepted {
            return Err(RegistrationError::SignatureRejected);
        }

        let update = RegistrationUpdate {
            public_key: &data.public_key,
            signature: &data.signature,
            secondary_name: &data.secondary_name,
            secondary_owner_address: &data.secondary_owner_address,
            secondary_withdraw_address: &data.secondary_withdraw_address,
            secondary_producer_address: &data.secondary_producer_address,
            secondary_identity_key: data.secondary_identity_key.as_deref(),
        };
        self.store.apply_registration(&pillar.name, &update).await?;

        info!(pillar = %pillar.name, "Registration proof accepted and persisted");
        Ok(pillar.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::config::DatabaseConfig;
    use common::error::NetworkError;
    use std::sync::Mutex;
    use zenon::Address;

    use crate::persistence::PillarStatus;

    /// Authority double that records the check and answers as told.
    struct ScriptedAuthority {
        accept: bool,
        fail: bool,
        seen: Mutex<Vec<SignatureCheck>>,
    }

    impl ScriptedAuthority {
        fn accepting() -> Arc<Self> {
            Arc::new(Self {
                accept: true,
                fail: false,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn rejecting() -> Arc<Self> {
            Arc::new(Self {
                accept: false,
                fail: false,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                accept: false,
                fail: true,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SignatureAuthority for ScriptedAuthority {
        async fn verify(&self, check: &SignatureCheck) -> Result<bool, NetworkError> {
            self.seen.lock().unwrap().push(check.clone());
            if self.fail {
                return Err(NetworkError::Timeout { timeout_secs: 1 });
            }
            Ok(self.accept)
        }
    }

    const OWNER_KEY: [u8; 32] = [0x11; 32];

    async fn store_with_pillar() -> Arc<PillarStore> {
        let store = Arc::new(PillarStore::new(&DatabaseConfig::default()).await.unwrap());
        let address = Address::from_public_key(&OWNER_KEY);
        store
            .upsert_snapshot("pillar-p", address.as_str(), 500)
            .await
            .unwrap();
        store
    }

    fn matching_data() -> RegistrationData {
        let secondary = Address::from_public_key(&[0x44; 32]).as_str().to_string();
        RegistrationData {
            public_key: hex::encode(OWNER_KEY),
            secondary_name: "hq-pillar".to_string(),
            secondary_owner_address: secondary.clone(),
            secondary_withdraw_address: secondary.clone(),
            secondary_producer_address: secondary,
            secondary_identity_key: None,
            signature: "ab".repeat(64),
        }
    }

    fn workflow(
        store: Arc<PillarStore>,
        authority: Arc<ScriptedAuthority>,
    ) -> RegistrationWorkflow {
        RegistrationWorkflow::new(store, authority, "NETWORK LAUNCH")
    }

    #[tokio::test]
    async fn test_successful_registration() {
        let store = store_with_pillar().await;
        let authority = ScriptedAuthority::accepting();
        let flow = workflow(store.clone(), authority.clone());

        let echoed = flow.register("pillar-p", &matching_data()).await.unwrap();
        assert_eq!(echoed, "pillar-p");

        let pillar = store.find_by_name("pillar-p").await.unwrap().unwrap();
        assert_eq!(pillar.status, PillarStatus::Registered);
        assert!(pillar.verified_at.is_some());
        assert_eq!(pillar.public_key.as_deref(), Some(hex::encode(OWNER_KEY).as_str()));
        assert_eq!(pillar.secondary_name.as_deref(), Some("hq-pillar"));
        // Reconciliation-owned fields untouched
        assert_eq!(pillar.weight, 500);
    }

    #[tokio::test]
    async fn test_canonical_message_reaches_authority() {
        let store = store_with_pillar().await;
        let authority = ScriptedAuthority::accepting();
        let flow = workflow(store, authority.clone());
        let data = matching_data();

        flow.register("pillar-p", &data).await.unwrap();

        let seen = authority.seen.lock().unwrap();
        let check = &seen[0];
        let expected = format!(
            "pillar-p {} {} {} {} NETWORK LAUNCH",
            data.secondary_name,
            data.secondary_owner_address,
            data.secondary_withdraw_address,
            data.secondary_producer_address,
        );
        assert_eq!(check.message, expected);
        assert_eq!(check.public_key, data.public_key);
        assert_eq!(check.signature, data.signature);
    }

    #[tokio::test]
    async fn test_unknown_pillar() {
        let store = store_with_pillar().await;
        let flow = workflow(store, ScriptedAuthority::accepting());

        let result = flow.register("ghost", &matching_data()).await;
        assert!(matches!(result, Err(RegistrationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_ownership_mismatch_leaves_store_unchanged() {
        let store = store_with_pillar().await;
        let authority = ScriptedAuthority::accepting();
        let flow = workflow(store.clone(), authority.clone());

        let mut data = matching_data();
        data.public_key = hex::encode([0x22; 32]);

        let result = flow.register("pillar-p", &data).await;
        assert!(matches!(result, Err(RegistrationError::OwnershipMismatch)));

        // The authority was never consulted and nothing was written
        assert!(authority.seen.lock().unwrap().is_empty());
        let pillar = store.find_by_name("pillar-p").await.unwrap().unwrap();
        assert_eq!(pillar.status, PillarStatus::Pending);
        assert!(pillar.public_key.is_none());
        assert!(pillar.secondary_name.is_none());
    }

    #[tokio::test]
    async fn test_rejected_signature_leaves_store_unchanged() {
        let store = store_with_pillar().await;
        let flow = workflow(store.clone(), ScriptedAuthority::rejecting());

        let result = flow.register("pillar-p", &matching_data()).await;
        assert!(matches!(result, Err(RegistrationError::SignatureRejected)));

        let pillar = store.find_by_name("pillar-p").await.unwrap().unwrap();
        assert_eq!(pillar.status, PillarStatus::Pending);
    }

    #[tokio::test]
    async fn test_unreachable_authority_reads_as_rejection() {
        let store = store_with_pillar().await;
        let flow = workflow(store.clone(), ScriptedAuthority::unreachable());

        let result = flow.register("pillar-p", &matching_data()).await;
        assert!(matches!(result, Err(RegistrationError::SignatureRejected)));
    }

    #[tokio::test]
    async fn test_validation_precedes_proofs() {
        let store = store_with_pillar().await;
        let authority = ScriptedAuthority::accepting();
        let flow = workflow(store, authority.clone());

        let mut data = matching_data();
        data.secondary_name = "-bad-".to_string();

        let result = flow.register("pillar-p", &data).await;
        assert!(matches!(
            result,
            Err(RegistrationError::Validation {
                field: "secondaryName",
                ..
            })
        ));
        assert!(authority.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reproof_is_idempotent() {
        let store = store_with_pillar().await;
        let flow = workflow(store.clone(), ScriptedAuthority::accepting());
        let data = matching_data();

        flow.register("pillar-p", &data).await.unwrap();
        let first = store.find_by_name("pillar-p").await.unwrap().unwrap();

        // A second proof for a Registered pillar is allowed and
        // overwrites the same values
        flow.register("pillar-p", &data).await.unwrap();
        let second = store.find_by_name("pillar-p").await.unwrap().unwrap();

        assert_eq!(second.status, PillarStatus::Registered);
        assert_eq!(second.secondary_name, first.secondary_name);
        assert_eq!(second.public_key, first.public_key);
    }

    #[tokio::test]
    async fn test_identity_key_included_in_message() {
        let store = store_with_pillar().await;
        let authority = ScriptedAuthority::accepting();
        let flow = workflow(store, authority.clone());

        let mut data = matching_data();
        let npub = zenon::bech32::encode("npub", &[0x05; 32]).unwrap();
        data.secondary_identity_key = Some(npub.clone());

        flow.register("pillar-p", &data).await.unwrap();

        let seen = authority.seen.lock().unwrap();
        assert!(seen[0]
            .message
            .contains(&format!("{npub} NETWORK LAUNCH")));
    }
}
