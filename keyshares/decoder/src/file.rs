use crate::util::{decode_hex, decode_public_key, parse_operator_ids, parse_shares, value_as_u64};
use crate::DecodeError;
use serde::Deserialize;
use serde_json::Value;
use ssv_types::{Address, Operator, OperatorId, ShareBundle};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::debug;

// Raw keyshares file as written by the key generation tooling. Everything is optional here so
// that a missing field surfaces as a DecodeError naming it rather than an opaque serde message.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawKeysharesFile {
    version: Option<String>,
    created_at: Option<String>,
    shares: Option<Vec<RawShareEntry>>,
}

#[derive(Deserialize)]
struct RawShareEntry {
    data: Option<RawShareData>,
    payload: Option<RawSharePayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShareData {
    owner_nonce: Option<Value>,
    owner_address: Option<String>,
    public_key: Option<String>,
    #[serde(default)]
    operators: Vec<RawOperator>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperator {
    id: Value,
    operator_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSharePayload {
    public_key: Option<String>,
    operator_ids: Option<Vec<Value>>,
    shares_data: Option<String>,
}

/// A decoded keyshares file.
#[derive(Debug, Clone)]
pub struct KeysharesFile {
    /// Format version declared by the file, if any
    pub version: Option<String>,
    /// Creation timestamp declared by the file, if any
    pub created_at: Option<String>,
    /// One bundle per validator, in file order. Never empty.
    pub bundles: Vec<ShareBundle>,
}

impl KeysharesFile {
    /// The owner named by the first share, which the whole file is checked against
    pub fn owner(&self) -> Address {
        self.bundles[0].owner
    }

    /// The nonce the first share claims to be signed against. This is the batch's claim that gets
    /// cross-checked against the chain before the shares are trusted.
    pub fn claimed_nonce(&self) -> Option<u64> {
        self.bundles[0].owner_nonce
    }
}

/// Decode the contents of a keyshares file.
pub fn decode_keyshares_file(json: &str) -> Result<KeysharesFile, DecodeError> {
    let raw: RawKeysharesFile =
        serde_json::from_str(json).map_err(|e| DecodeError::Json(e.to_string()))?;

    let entries = raw.shares.ok_or(DecodeError::MissingShares)?;
    if entries.is_empty() {
        return Err(DecodeError::EmptyShares);
    }

    let bundles = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| decode_entry(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        version = ?raw.version,
        bundles = bundles.len(),
        "Decoded keyshares file"
    );

    Ok(KeysharesFile {
        version: raw.version,
        created_at: raw.created_at,
        bundles,
    })
}

fn decode_entry(index: usize, entry: &RawShareEntry) -> Result<ShareBundle, DecodeError> {
    let data = entry.data.as_ref().ok_or(DecodeError::MissingField {
        index,
        field: "data",
    })?;
    let payload = entry.payload.as_ref().ok_or(DecodeError::MissingField {
        index,
        field: "payload",
    })?;

    // Owner and the nonce it claims to have signed with
    let owner_str = data.owner_address.as_deref().ok_or(DecodeError::MissingField {
        index,
        field: "data.ownerAddress",
    })?;
    let owner = Address::from_str(owner_str.trim()).map_err(|_| DecodeError::InvalidAddress {
        index,
        value: owner_str.to_string(),
    })?;
    let nonce_value = data.owner_nonce.as_ref().ok_or(DecodeError::MissingField {
        index,
        field: "data.ownerNonce",
    })?;
    let owner_nonce = value_as_u64(nonce_value).ok_or_else(|| DecodeError::InvalidNonce {
        index,
        value: nonce_value.to_string(),
    })?;

    // The payload is what actually gets registered, the data section has to agree with it
    let payload_key = payload.public_key.as_deref().ok_or(DecodeError::MissingField {
        index,
        field: "payload.publicKey",
    })?;
    let validator_pubkey = decode_public_key(index, "payload.publicKey", payload_key)?;
    if let Some(data_key) = data.public_key.as_deref() {
        if decode_public_key(index, "data.publicKey", data_key)? != validator_pubkey {
            return Err(DecodeError::PublicKeyMismatch { index });
        }
    }

    let operator_ids = payload
        .operator_ids
        .as_deref()
        .ok_or(DecodeError::MissingField {
            index,
            field: "payload.operatorIds",
        })?;
    let operator_ids = parse_operator_ids(index, operator_ids)?;
    let operators = decode_operators(index, &data.operators, &operator_ids)?;

    let shares_data = payload
        .shares_data
        .as_deref()
        .ok_or(DecodeError::MissingField {
            index,
            field: "payload.sharesData",
        })?;
    let shares_data = decode_hex(index, "payload.sharesData", shares_data)?;
    let (signature, shares) = parse_shares(index, &shares_data, &operator_ids)?;

    Ok(ShareBundle {
        validator_pubkey,
        owner,
        owner_nonce: Some(owner_nonce),
        shares,
        signature,
        operators,
    })
}

// Parse the operator keys listed in the data section. Listing operators is optional, but if they
// are listed they must be exactly the operators the payload is split across.
fn decode_operators(
    index: usize,
    raw: &[RawOperator],
    operator_ids: &[OperatorId],
) -> Result<Vec<Operator>, DecodeError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw.len() != operator_ids.len() {
        return Err(DecodeError::CountMismatch {
            index,
            operators: raw.len(),
            shares: operator_ids.len(),
        });
    }

    let listed = raw
        .iter()
        .map(|op| {
            value_as_u64(&op.id)
                .map(OperatorId)
                .ok_or_else(|| DecodeError::InvalidOperatorId {
                    index,
                    value: op.id.to_string(),
                })
        })
        .collect::<Result<HashSet<_>, _>>()?;
    let payload: HashSet<_> = operator_ids.iter().copied().collect();
    if listed != payload {
        return Err(DecodeError::OperatorMismatch { index });
    }

    raw.iter()
        .filter_map(|op| {
            let key = op.operator_key.as_deref().filter(|k| !k.is_empty())?;
            let id = value_as_u64(&op.id).map(OperatorId)?;
            Some(
                Operator::new(key, id).map_err(|reason| DecodeError::InvalidOperatorKey {
                    index,
                    operator_id: id,
                    reason,
                }),
            )
        })
        .collect()
}
