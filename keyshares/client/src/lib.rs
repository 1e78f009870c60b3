//! Verification of keyshares before and after registration.
//!
//! Ties the collaborators together: decode the bundles, resolve the owner nonce at the right
//! height, and hand everything to the verifier.

mod cli;
pub mod config;
mod error;
pub mod output;
pub mod sources;

pub use cli::{Command, Keyshares, NonceArgs, OutputFormat, Schedule};
pub use config::{BundleInput, Config, NonceInput};
pub use error::VerifyError;
pub use sources::{
    FixedNonceSource, NonceCheckpoint, NonceHistory, NonceQuery, NonceSource, Registration,
    RegistrationExport, RegistrationSource, SourceError,
};

use decoder::decode_keyshares_file;
use ssv_types::{Address, ShareBundle};
use std::path::Path;
use tracing::{debug, info, warn};
use verifier::{verify_bundles, NonceSchedule, Verdict};

/// Block height the authoritative nonce is read at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonceHeight {
    /// The most recent nonce
    #[default]
    Latest,
    /// The block the bundles were registered in. Only meaningful after registration, a keyshares
    /// file falls back to the latest nonce.
    RegistrationBlock,
    Block(u64),
}

/// What to verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationRequest {
    /// A keyshares file that has not been registered yet. The nonce it claims must be the owner's
    /// nonce at `nonce_height`.
    PreRegistration {
        keyshares_json: String,
        nonce_height: NonceHeight,
    },
    /// The bundles registered by a transaction
    PostRegistration {
        tx_hash: String,
        nonce_height: NonceHeight,
    },
}

impl VerificationRequest {
    pub fn pre_registration(keyshares_json: impl Into<String>) -> Self {
        Self::PreRegistration {
            keyshares_json: keyshares_json.into(),
            nonce_height: NonceHeight::Latest,
        }
    }

    pub fn post_registration(tx_hash: impl Into<String>) -> Self {
        Self::PostRegistration {
            tx_hash: tx_hash.into(),
            nonce_height: NonceHeight::RegistrationBlock,
        }
    }

    pub fn with_nonce_height(mut self, height: NonceHeight) -> Self {
        match &mut self {
            Self::PreRegistration { nonce_height, .. }
            | Self::PostRegistration { nonce_height, .. } => *nonce_height = height,
        }
        self
    }
}

/// Verify a batch of keyshares.
///
/// Fails without a verdict when the input cannot be decoded, the nonce cannot be resolved, or any
/// bundle of a keyshares file claims a nonce other than the one it would be checked against.
/// Otherwise every bundle gets a verdict entry, in input order.
pub async fn verify<N, R>(
    request: &VerificationRequest,
    nonce_source: &N,
    registration_source: &R,
    config: &verifier::Config,
) -> Result<Verdict, VerifyError>
where
    N: NonceSource,
    R: RegistrationSource,
{
    let (bundles, owner, nonce) = match request {
        VerificationRequest::PreRegistration {
            keyshares_json,
            nonce_height,
        } => {
            let file = decode_keyshares_file(keyshares_json)?;
            let owner = file.owner();
            let query = match nonce_height {
                NonceHeight::Latest | NonceHeight::RegistrationBlock => NonceQuery::Latest,
                NonceHeight::Block(height) => NonceQuery::AtBlock(*height),
            };
            let nonce = fetch_nonce(nonce_source, owner, query).await?;

            // Every claim in the file is checked before any cryptography
            check_nonce_claims(&file.bundles, nonce, config.schedule)?;
            (file.bundles, owner, nonce)
        }
        VerificationRequest::PostRegistration {
            tx_hash,
            nonce_height,
        } => {
            let registration = registration_source
                .registration(tx_hash)
                .await
                .map_err(|e| match e {
                    SourceError::NotFound => VerifyError::RegistrationNotFound {
                        tx_hash: tx_hash.clone(),
                    },
                    SourceError::Decode(e) => VerifyError::Decode(e),
                    SourceError::Failed(e) => VerifyError::Source(e),
                })?;
            let query = match nonce_height {
                NonceHeight::Latest => NonceQuery::Latest,
                NonceHeight::RegistrationBlock => NonceQuery::AtBlock(registration.block_number),
                NonceHeight::Block(height) => NonceQuery::AtBlock(*height),
            };
            let nonce = fetch_nonce(nonce_source, registration.owner, query).await?;
            (registration.bundles, registration.owner, nonce)
        }
    };

    if bundles.is_empty() {
        return Err(VerifyError::EmptyBatch);
    }
    info!(bundles = bundles.len(), %owner, nonce, "Verifying keyshares");
    verify_batch(bundles, nonce, owner, config.clone()).await
}

// Each bundle must claim the nonce it is about to be verified against
fn check_nonce_claims(
    bundles: &[ShareBundle],
    nonce: u64,
    schedule: NonceSchedule,
) -> Result<(), VerifyError> {
    for (index, bundle) in bundles.iter().enumerate() {
        let authoritative = schedule.nonce_for(nonce, index);
        match bundle.owner_nonce {
            Some(claimed) if claimed != authoritative => {
                warn!(index, claimed, authoritative, "Keyshares created for a stale nonce");
                return Err(VerifyError::NonceMismatch {
                    index,
                    claimed,
                    authoritative,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

async fn fetch_nonce<N: NonceSource>(
    nonce_source: &N,
    owner: Address,
    query: NonceQuery,
) -> Result<u64, VerifyError> {
    match nonce_source.nonce(owner, query).await {
        Ok(nonce) => {
            debug!(%owner, %query, nonce, "Resolved owner nonce");
            Ok(nonce)
        }
        Err(SourceError::NotFound) => {
            warn!(%owner, %query, "No nonce known for owner");
            Err(VerifyError::NonceUnavailable { owner, query })
        }
        Err(e) => {
            warn!(%owner, %query, error = %e, "Unable to resolve owner nonce");
            Err(VerifyError::Source(format!("Nonce source failed: {e}")))
        }
    }
}

// The checks are CPU bound, keep them off the async workers
async fn verify_batch(
    bundles: Vec<ShareBundle>,
    nonce: u64,
    owner: Address,
    config: verifier::Config,
) -> Result<Verdict, VerifyError> {
    tokio::task::spawn_blocking(move || verify_bundles(&bundles, nonce, &owner, &config))
        .await
        .map_err(|e| VerifyError::Source(format!("Verification task failed: {e}")))
}

/// Read the configured inputs and verify them
pub async fn run(config: &Config) -> Result<Verdict, VerifyError> {
    let nonce_source = match &config.nonce {
        NonceInput::Fixed(nonce) => Nonces::Fixed(FixedNonceSource::new(*nonce)),
        NonceInput::History(path) => {
            Nonces::History(NonceHistory::from_json(&read_file(path)?).map_err(source_error)?)
        }
    };

    let (request, registrations) = match &config.input {
        BundleInput::KeysharesFile(path) => (
            VerificationRequest::PreRegistration {
                keyshares_json: read_file(path)?,
                nonce_height: config.nonce_height,
            },
            RegistrationExport::default(),
        ),
        BundleInput::Registration { tx_hash, events } => (
            VerificationRequest::PostRegistration {
                tx_hash: tx_hash.clone(),
                nonce_height: config.nonce_height,
            },
            RegistrationExport::from_json(&read_file(events)?).map_err(source_error)?,
        ),
    };

    verify(&request, &nonce_source, &registrations, &config.verifier).await
}

fn read_file(path: &Path) -> Result<String, VerifyError> {
    std::fs::read_to_string(path)
        .map_err(|e| VerifyError::Source(format!("Unable to read {}: {e}", path.display())))
}

fn source_error(e: SourceError) -> VerifyError {
    match e {
        SourceError::Decode(e) => VerifyError::Decode(e),
        e => VerifyError::Source(e.to_string()),
    }
}

// Nonce source selected on the command line
enum Nonces {
    Fixed(FixedNonceSource),
    History(NonceHistory),
}

impl NonceSource for Nonces {
    async fn nonce(&self, owner: Address, query: NonceQuery) -> Result<u64, SourceError> {
        match self {
            Self::Fixed(source) => source.nonce(owner, query).await,
            Self::History(source) => source.nonce(owner, query).await,
        }
    }
}
