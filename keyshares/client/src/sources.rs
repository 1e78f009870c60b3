//! Collaborators that supply the data a verification is checked against.
//!
//! The verifier itself never fetches anything. Owner nonces come from a [`NonceSource`] and
//! registered bundles from a [`RegistrationSource`]. The implementations here are backed by
//! operator supplied values and exported indexer responses, networked ones can be dropped in
//! behind the same traits.

use decoder::{decode_events, DecodeError, ValidatorAddedEvent};
use serde::Deserialize;
use ssv_types::{Address, ShareBundle};
use std::fmt::Display;
use std::future::Future;
use std::str::FromStr;
use tracing::debug;

/// Height at which an owner nonce is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceQuery {
    Latest,
    AtBlock(u64),
}

impl Display for NonceQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest block"),
            Self::AtBlock(block) => write!(f, "block {block}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source has no data for the request
    NotFound,
    /// Registration data was found but could not be decoded
    Decode(DecodeError),
    /// The source could not be read or returned inconsistent data
    Failed(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Not found"),
            Self::Decode(e) => write!(f, "{e}"),
            Self::Failed(e) => write!(f, "{e}"),
        }
    }
}

/// Bundles registered by a single transaction
#[derive(Debug, Clone)]
pub struct Registration {
    pub bundles: Vec<ShareBundle>,
    pub block_number: u64,
    pub owner: Address,
}

/// Supplies the authoritative registration nonce of an owner
pub trait NonceSource {
    /// A missing nonce is [`SourceError::NotFound`], never zero
    fn nonce(
        &self,
        owner: Address,
        query: NonceQuery,
    ) -> impl Future<Output = Result<u64, SourceError>> + Send;
}

/// Supplies the bundles a transaction registered
pub trait RegistrationSource {
    fn registration(
        &self,
        tx_hash: &str,
    ) -> impl Future<Output = Result<Registration, SourceError>> + Send;
}

/// A nonce supplied directly by the operator, valid for any owner and height
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedNonceSource {
    nonce: Option<u64>,
}

impl FixedNonceSource {
    pub fn new(nonce: u64) -> Self {
        Self { nonce: Some(nonce) }
    }

    /// A source that never has a nonce
    pub fn unavailable() -> Self {
        Self { nonce: None }
    }
}

impl NonceSource for FixedNonceSource {
    fn nonce(
        &self,
        _owner: Address,
        _query: NonceQuery,
    ) -> impl Future<Output = Result<u64, SourceError>> + Send {
        let nonce = self.nonce.ok_or(SourceError::NotFound);
        async move { nonce }
    }
}

#[derive(Deserialize)]
struct RawNonceHistory {
    owner: String,
    current: Option<u64>,
    #[serde(default)]
    history: Vec<NonceCheckpoint>,
}

/// The owner nonce as of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NonceCheckpoint {
    pub block: u64,
    pub nonce: u64,
}

/// Snapshot of an owner's nonce over time, as exported from an indexer.
///
/// ```json
/// { "owner": "0x…", "current": 7, "history": [ { "block": 100, "nonce": 5 } ] }
/// ```
#[derive(Debug, Clone)]
pub struct NonceHistory {
    owner: Address,
    current: Option<u64>,
    // sorted by block
    history: Vec<NonceCheckpoint>,
}

impl NonceHistory {
    pub fn new(owner: Address, current: Option<u64>, mut history: Vec<NonceCheckpoint>) -> Self {
        history.sort_by_key(|checkpoint| checkpoint.block);
        Self {
            owner,
            current,
            history,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let raw: RawNonceHistory = serde_json::from_str(json)
            .map_err(|e| SourceError::Failed(format!("Invalid nonce history: {e}")))?;
        let owner = Address::from_str(raw.owner.trim()).map_err(|_| {
            SourceError::Failed(format!("Invalid owner in nonce history: {}", raw.owner))
        })?;
        Ok(Self::new(owner, raw.current, raw.history))
    }

    fn lookup(&self, owner: &Address, query: NonceQuery) -> Option<u64> {
        if owner != &self.owner {
            return None;
        }
        match query {
            NonceQuery::Latest => self.current,
            NonceQuery::AtBlock(height) => self
                .history
                .iter()
                .rev()
                .find(|checkpoint| checkpoint.block <= height)
                .map(|checkpoint| checkpoint.nonce),
        }
    }
}

impl NonceSource for NonceHistory {
    fn nonce(
        &self,
        owner: Address,
        query: NonceQuery,
    ) -> impl Future<Output = Result<u64, SourceError>> + Send {
        let nonce = self.lookup(&owner, query);
        debug!(%owner, %query, ?nonce, "Nonce lookup");
        async move { nonce.ok_or(SourceError::NotFound) }
    }
}

#[derive(Deserialize)]
struct RawExport {
    data: Option<RawExportData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExportData {
    #[serde(default)]
    validator_addeds: Vec<ValidatorAddedEvent>,
}

/// `ValidatorAdded` events exported from an indexer:
/// `{ "data": { "validatorAddeds": [ ... ] } }`
#[derive(Debug, Clone, Default)]
pub struct RegistrationExport {
    events: Vec<ValidatorAddedEvent>,
}

impl RegistrationExport {
    pub fn new(events: Vec<ValidatorAddedEvent>) -> Self {
        Self { events }
    }

    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let raw: RawExport = serde_json::from_str(json)
            .map_err(|e| SourceError::Failed(format!("Invalid registration export: {e}")))?;
        let events = raw
            .data
            .map(|data| data.validator_addeds)
            .unwrap_or_default();
        Ok(Self { events })
    }

    /// Events emitted by `tx_hash`, in export order
    fn events_for(&self, tx_hash: &str) -> Vec<ValidatorAddedEvent> {
        let tx_hash = tx_hash.trim();
        self.events
            .iter()
            .filter(|event| {
                event
                    .transaction_hash
                    .as_deref()
                    .is_some_and(|hash| hash.trim().eq_ignore_ascii_case(tx_hash))
            })
            .cloned()
            .collect()
    }

    fn lookup(&self, tx_hash: &str) -> Result<Registration, SourceError> {
        let events = self.events_for(tx_hash);
        if events.is_empty() {
            return Err(SourceError::NotFound);
        }

        let bundles = decode_events(&events).map_err(SourceError::Decode)?;

        // One transaction registers for one owner within one block
        let owner = bundles[0].owner;
        if bundles.iter().any(|bundle| bundle.owner != owner) {
            return Err(SourceError::Failed(format!(
                "Transaction {tx_hash} registered validators for more than one owner"
            )));
        }
        let block_number = events[0].block_number().ok_or_else(|| {
            SourceError::Failed(format!("Registration in {tx_hash} has no block number"))
        })?;
        if events
            .iter()
            .any(|event| event.block_number() != Some(block_number))
        {
            return Err(SourceError::Failed(format!(
                "Registrations in {tx_hash} disagree on the block number"
            )));
        }

        debug!(
            tx_hash,
            block_number,
            %owner,
            bundles = bundles.len(),
            "Found registration"
        );
        Ok(Registration {
            bundles,
            block_number,
            owner,
        })
    }
}

impl RegistrationSource for RegistrationExport {
    fn registration(
        &self,
        tx_hash: &str,
    ) -> impl Future<Output = Result<Registration, SourceError>> + Send {
        let registration = self.lookup(tx_hash);
        async move { registration }
    }
}

#[cfg(test)]
mod sources_tests {
    use super::*;
    use serde_json::json;
    use verifier::test_utils::{generators, json as fixtures};

    const OWNER: &str = "0x382f6ff5b9a29fcf1dd2bf8b86c3234dc7ed2df6";
    const TX: &str = "0x5c1ba6bca0b3ddb6b4d2d7c3b2f1a0e9d8c7b6a5f4e3d2c1b0a9f8e7d6c5b4a3";

    fn owner() -> Address {
        Address::from_str(OWNER).unwrap()
    }

    #[tokio::test]
    async fn test_fixed_nonce_source() {
        let source = FixedNonceSource::new(4);
        assert_eq!(source.nonce(owner(), NonceQuery::Latest).await, Ok(4));
        assert_eq!(source.nonce(owner(), NonceQuery::AtBlock(1)).await, Ok(4));
        assert_eq!(
            FixedNonceSource::unavailable()
                .nonce(owner(), NonceQuery::Latest)
                .await,
            Err(SourceError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_nonce_history_lookup() {
        let history = NonceHistory::from_json(
            &json!({
                "owner": OWNER,
                "current": 7,
                "history": [
                    { "block": 300, "nonce": 6 },
                    { "block": 100, "nonce": 5 }
                ]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(history.nonce(owner(), NonceQuery::Latest).await, Ok(7));
        assert_eq!(history.nonce(owner(), NonceQuery::AtBlock(100)).await, Ok(5));
        assert_eq!(history.nonce(owner(), NonceQuery::AtBlock(299)).await, Ok(5));
        assert_eq!(history.nonce(owner(), NonceQuery::AtBlock(5000)).await, Ok(6));
        // before the first known checkpoint there is nothing to report, not zero
        assert_eq!(
            history.nonce(owner(), NonceQuery::AtBlock(99)).await,
            Err(SourceError::NotFound)
        );
        assert_eq!(
            history.nonce(Address::ZERO, NonceQuery::Latest).await,
            Err(SourceError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_nonce_history_without_current() {
        let history =
            NonceHistory::from_json(&json!({ "owner": OWNER, "history": [] }).to_string())
                .unwrap();
        assert_eq!(
            history.nonce(owner(), NonceQuery::Latest).await,
            Err(SourceError::NotFound)
        );
        assert!(matches!(
            NonceHistory::from_json(&json!({ "owner": "nope" }).to_string()),
            Err(SourceError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn test_registration_export_filters_by_transaction() {
        let bundles: Vec<ShareBundle> = (0..2)
            .map(|_| generators::bundle(owner(), 3, &[1, 2, 3, 4]))
            .collect();
        let other = generators::bundle(owner(), 3, &[5, 6, 7, 8]);

        let mut export = fixtures::registration_export(&TX.to_uppercase(), 1200, &bundles);
        let unrelated = fixtures::registration_export("0xdead", 1100, &[other]);
        let events = export["data"]["validatorAddeds"].as_array_mut().unwrap();
        events.insert(1, unrelated["data"]["validatorAddeds"][0].clone());

        let source = RegistrationExport::from_json(&export.to_string()).unwrap();
        let registration = source.registration(TX).await.unwrap();
        assert_eq!(registration.block_number, 1200);
        assert_eq!(registration.owner, owner());
        let keys: Vec<_> = registration
            .bundles
            .iter()
            .map(|bundle| bundle.validator_pubkey)
            .collect();
        assert_eq!(
            keys,
            vec![bundles[0].validator_pubkey, bundles[1].validator_pubkey]
        );

        assert_eq!(
            source.registration("0xbeef").await.unwrap_err(),
            SourceError::NotFound
        );
    }

    #[tokio::test]
    async fn test_registration_export_inconsistent_events() {
        let first = generators::bundle(owner(), 3, &[1, 2, 3, 4]);
        let second = generators::bundle(Address::ZERO, 3, &[1, 2, 3, 4]);
        let mut export = fixtures::registration_export(TX, 1200, &[first.clone()]);
        let other_owner = fixtures::registration_export(TX, 1200, &[second]);
        export["data"]["validatorAddeds"]
            .as_array_mut()
            .unwrap()
            .push(other_owner["data"]["validatorAddeds"][0].clone());
        let source = RegistrationExport::from_json(&export.to_string()).unwrap();
        assert!(matches!(
            source.registration(TX).await,
            Err(SourceError::Failed(_))
        ));

        let mut export = fixtures::registration_export(TX, 1200, &[first.clone(), first]);
        export["data"]["validatorAddeds"][1]["blockNumber"] = json!("1201");
        let source = RegistrationExport::from_json(&export.to_string()).unwrap();
        assert!(matches!(
            source.registration(TX).await,
            Err(SourceError::Failed(_))
        ));

        let mut export = fixtures::registration_export(TX, 1200, &[generators::bundle(
            owner(),
            3,
            &[1, 2, 3, 4],
        )]);
        export["data"]["validatorAddeds"][0]["shares"] = json!("0x1234");
        let source = RegistrationExport::from_json(&export.to_string()).unwrap();
        assert!(matches!(
            source.registration(TX).await,
            Err(SourceError::Decode(DecodeError::InvalidLength { .. }))
        ));
    }
}
