use crate::sources::NonceQuery;
use decoder::DecodeError;
use ssv_types::Address;
use std::fmt::Display;

/// Errors that abort a verification before any verdict is produced.
///
/// A single bad bundle is never one of these, it is reported as `false` in the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The input could not be decoded into share bundles
    Decode(DecodeError),
    /// The nonce source had no nonce for the owner at the requested height
    NonceUnavailable { owner: Address, query: NonceQuery },
    /// A bundle in the keyshares file claims a nonce other than the one it is checked against
    NonceMismatch {
        index: usize,
        claimed: u64,
        authoritative: u64,
    },
    /// The transaction emitted no registration events
    RegistrationNotFound { tx_hash: String },
    /// A collaborator failed or returned inconsistent data
    Source(String),
    /// There were no bundles to verify
    EmptyBatch,
}

impl Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "Unable to decode keyshares: {e}"),
            Self::NonceUnavailable { owner, query } => {
                write!(f, "No nonce available for owner {owner} at {query}")
            }
            Self::NonceMismatch {
                index,
                claimed,
                authoritative,
            } => write!(
                f,
                "Keyshare {index} was created for nonce {claimed} but the owner nonce is \
                 {authoritative}"
            ),
            Self::RegistrationNotFound { tx_hash } => {
                write!(f, "No validator registrations found for transaction {tx_hash}")
            }
            Self::Source(e) => write!(f, "{e}"),
            Self::EmptyBatch => write!(f, "No keyshares to verify"),
        }
    }
}

impl std::error::Error for VerifyError {}

impl From<DecodeError> for VerifyError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}
