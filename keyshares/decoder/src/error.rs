use ssv_types::OperatorId;
use std::fmt::Display;

/// Malformed keyshare input. Any of these makes the whole batch unverifiable.
///
/// `index` is the position of the offending bundle within its batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input is not valid JSON or does not have the expected shape
    Json(String),
    /// The keyshares file has no `shares` array
    MissingShares,
    /// The `shares` array is empty
    EmptyShares,
    MissingField {
        index: usize,
        field: &'static str,
    },
    InvalidHex {
        index: usize,
        field: &'static str,
        reason: String,
    },
    InvalidLength {
        index: usize,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    InvalidNonce {
        index: usize,
        value: String,
    },
    InvalidOperatorId {
        index: usize,
        value: String,
    },
    InvalidAddress {
        index: usize,
        value: String,
    },
    /// The operator list and the share list have different lengths
    CountMismatch {
        index: usize,
        operators: usize,
        shares: usize,
    },
    /// The descriptive and payload sections name different validator keys
    PublicKeyMismatch {
        index: usize,
    },
    /// The descriptive and payload sections name different operators
    OperatorMismatch {
        index: usize,
    },
    InvalidOperatorKey {
        index: usize,
        operator_id: OperatorId,
        reason: String,
    },
}

impl std::error::Error for DecodeError {}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "Failed to parse keyshares: {e}"),
            Self::MissingShares => write!(f, "Keyshares file has no shares array"),
            Self::EmptyShares => write!(f, "Keyshares file contains no shares"),
            Self::MissingField { index, field } => {
                write!(f, "Share {index}: missing field {field}")
            }
            Self::InvalidHex {
                index,
                field,
                reason,
            } => write!(f, "Share {index}: {field} is not valid hex: {reason}"),
            Self::InvalidLength {
                index,
                field,
                expected,
                actual,
            } => write!(
                f,
                "Share {index}: {field} has invalid length: expected {expected}, got {actual}"
            ),
            Self::InvalidNonce { index, value } => {
                write!(f, "Share {index}: owner nonce {value} is not a valid number")
            }
            Self::InvalidOperatorId { index, value } => {
                write!(f, "Share {index}: operator id {value} is not a valid number")
            }
            Self::InvalidAddress { index, value } => {
                write!(f, "Share {index}: {value} is not a valid owner address")
            }
            Self::CountMismatch {
                index,
                operators,
                shares,
            } => write!(
                f,
                "Share {index}: {operators} operators listed but {shares} shares provided"
            ),
            Self::PublicKeyMismatch { index } => write!(
                f,
                "Share {index}: data and payload disagree on the validator public key"
            ),
            Self::OperatorMismatch { index } => write!(
                f,
                "Share {index}: data and payload disagree on the operator set"
            ),
            Self::InvalidOperatorKey {
                index,
                operator_id,
                reason,
            } => write!(
                f,
                "Share {index}: operator {operator_id} has an invalid key: {reason}"
            ),
        }
    }
}
