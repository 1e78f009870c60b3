use serde::{Serialize, Serializer};
use ssv_types::OperatorId;
use std::fmt::Display;
use strum::IntoStaticStr;

/// Why a bundle was judged invalid. Only the first failing check is reported.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum InvalidReason {
    /// The bundle belongs to a different owner
    OwnerMismatch,
    NoOperators,
    TooManyOperators(usize),
    /// The operator count cannot form a 3f+1 quorum
    InvalidClusterSize(usize),
    DuplicateOperatorIds,
    /// Operator id 0 cannot hold a share, it is the evaluation point of the validator key
    ZeroOperatorId,
    /// The encrypted share is not a ciphertext under the listed operator key
    PayloadLengthMismatch {
        operator_id: OperatorId,
        expected: usize,
        actual: usize,
    },
    MalformedPublicKey,
    MalformedShareKey(OperatorId),
    MalformedSignature,
    /// The signature does not cover this owner and nonce under the key the shares combine to
    SignatureMismatch,
    /// The shares combine to a key other than the declared validator key
    PublicKeyMismatch,
}

impl InvalidReason {
    /// Stable snake_case name of the failure class
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

impl Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnerMismatch => write!(f, "Bundle is owned by a different address"),
            Self::NoOperators => write!(f, "Validator has no operators"),
            Self::TooManyOperators(n) => write!(f, "Validator has too many operators: {n}"),
            Self::InvalidClusterSize(n) => {
                write!(f, "Given {n} operators. Cannot build a 3f+1 quorum")
            }
            Self::DuplicateOperatorIds => write!(f, "Operator IDs contain duplicates"),
            Self::ZeroOperatorId => write!(f, "Operator ID 0 is not a valid share holder"),
            Self::PayloadLengthMismatch {
                operator_id,
                expected,
                actual,
            } => write!(
                f,
                "Encrypted share for operator {operator_id} has length {actual}, expected {expected}"
            ),
            Self::MalformedPublicKey => write!(f, "Validator public key is not a valid G1 point"),
            Self::MalformedShareKey(id) => {
                write!(f, "Share public key of operator {id} is not a valid G1 point")
            }
            Self::MalformedSignature => write!(f, "Signature is not a valid G2 point"),
            Self::SignatureMismatch => write!(f, "Signature verification failed"),
            Self::PublicKeyMismatch => {
                write!(f, "Shares do not combine to the validator public key")
            }
        }
    }
}

fn serialize_reason<S: Serializer>(
    reason: &Option<InvalidReason>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match reason {
        Some(reason) => serializer.serialize_some(reason.kind()),
        None => serializer.serialize_none(),
    }
}

/// Outcome for a single validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictEntry {
    /// `0x` prefixed hex of the validator public key
    pub public_key: String,
    pub valid: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_reason"
    )]
    pub reason: Option<InvalidReason>,
}

/// Validity of every bundle of a batch, in the order the bundles were given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Verdict {
    entries: Vec<VerdictEntry>,
}

impl Verdict {
    pub(crate) fn new(entries: Vec<VerdictEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[VerdictEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all_valid(&self) -> bool {
        self.entries.iter().all(|entry| entry.valid)
    }

    pub fn invalid_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.valid).count()
    }

    /// `(public key, is valid)` pairs in input order
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries
            .iter()
            .map(|entry| (entry.public_key.as_str(), entry.valid))
    }

    /// Just the validity flags, in input order
    pub fn flags(&self) -> Vec<bool> {
        self.entries.iter().map(|entry| entry.valid).collect()
    }
}

impl IntoIterator for Verdict {
    type Item = VerdictEntry;
    type IntoIter = std::vec::IntoIter<VerdictEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
