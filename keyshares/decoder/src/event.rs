use crate::util::{decode_hex, decode_public_key, parse_operator_ids, parse_shares, value_as_u64};
use crate::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ssv_types::{Address, ShareBundle};
use std::str::FromStr;
use tracing::debug;

/// A `ValidatorAdded` event as reported by a registration indexer.
///
/// Integers may arrive as JSON numbers or decimal strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorAddedEvent {
    pub public_key: Option<String>,
    pub shares: Option<String>,
    pub owner: Option<String>,
    pub operator_ids: Option<Vec<Value>>,
    pub block_number: Option<Value>,
    pub transaction_hash: Option<String>,
}

impl ValidatorAddedEvent {
    /// Block the event was emitted in, if the indexer reported a usable one
    pub fn block_number(&self) -> Option<u64> {
        self.block_number.as_ref().and_then(value_as_u64)
    }

    pub fn owner_address(&self) -> Option<Address> {
        self.owner
            .as_deref()
            .and_then(|owner| Address::from_str(owner.trim()).ok())
    }
}

/// Decode a single registration event. The resulting bundle carries no nonce claim.
pub fn decode_event(index: usize, event: &ValidatorAddedEvent) -> Result<ShareBundle, DecodeError> {
    let public_key = event.public_key.as_deref().ok_or(DecodeError::MissingField {
        index,
        field: "publicKey",
    })?;
    let validator_pubkey = decode_public_key(index, "publicKey", public_key)?;

    let owner_str = event.owner.as_deref().ok_or(DecodeError::MissingField {
        index,
        field: "owner",
    })?;
    let owner = Address::from_str(owner_str.trim()).map_err(|_| DecodeError::InvalidAddress {
        index,
        value: owner_str.to_string(),
    })?;

    let operator_ids = event
        .operator_ids
        .as_deref()
        .ok_or(DecodeError::MissingField {
            index,
            field: "operatorIds",
        })?;
    let operator_ids = parse_operator_ids(index, operator_ids)?;

    let shares = event.shares.as_deref().ok_or(DecodeError::MissingField {
        index,
        field: "shares",
    })?;
    let shares = decode_hex(index, "shares", shares)?;
    let (signature, shares) = parse_shares(index, &shares, &operator_ids)?;

    debug!(index, validator_pubkey = %validator_pubkey, "Found pubkey");

    Ok(ShareBundle {
        validator_pubkey,
        owner,
        owner_nonce: None,
        shares,
        signature,
        operators: Vec::new(),
    })
}

/// Decode every event of a registration, preserving order. The first failure aborts the batch.
pub fn decode_events(events: &[ValidatorAddedEvent]) -> Result<Vec<ShareBundle>, DecodeError> {
    events
        .iter()
        .enumerate()
        .map(|(index, event)| decode_event(index, event))
        .collect()
}
