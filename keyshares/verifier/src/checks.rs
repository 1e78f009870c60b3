use crate::crypto::{
    decompress_public_key, decompress_signature, owner_nonce_message, reconstruct_public_key,
    verify_signature,
};
use crate::InvalidReason;
use alloy::primitives::Address;
use ssv_types::{OperatorId, ShareBundle, ENCRYPTED_KEY_LENGTH};
use std::collections::HashSet;

/// Largest cluster an owner can register a validator with
pub const MAX_OPERATORS: usize = 13;

/// Run every check against one bundle, stopping at the first failure.
pub fn check_bundle(bundle: &ShareBundle, nonce: u64, owner: &Address) -> Result<(), InvalidReason> {
    check_ownership(bundle, owner)?;
    check_structure(bundle)?;

    // Assemble the threshold key material
    let validator_key =
        decompress_public_key(&bundle.validator_pubkey).ok_or(InvalidReason::MalformedPublicKey)?;
    let share_keys = bundle
        .shares
        .iter()
        .map(|share| {
            decompress_public_key(&share.share_pubkey)
                .map(|key| (share.operator_id, key))
                .ok_or(InvalidReason::MalformedShareKey(share.operator_id))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let signature = decompress_signature(&bundle.signature).ok_or(InvalidReason::MalformedSignature)?;
    // ids are already known to be distinct and non-zero
    let combined_key =
        reconstruct_public_key(&share_keys).ok_or(InvalidReason::DuplicateOperatorIds)?;

    // The signature has to cover exactly this owner and nonce, shares made for an earlier nonce
    // must not verify
    let message = owner_nonce_message(owner, nonce);
    if !verify_signature(&combined_key, &signature, message.as_slice()) {
        return Err(InvalidReason::SignatureMismatch);
    }

    if combined_key != validator_key {
        return Err(InvalidReason::PublicKeyMismatch);
    }

    Ok(())
}

fn check_ownership(bundle: &ShareBundle, owner: &Address) -> Result<(), InvalidReason> {
    if bundle.owner != *owner {
        return Err(InvalidReason::OwnerMismatch);
    }
    Ok(())
}

fn check_structure(bundle: &ShareBundle) -> Result<(), InvalidReason> {
    validate_operators(&bundle.operator_ids())?;

    for share in &bundle.shares {
        let expected = bundle
            .operator(share.operator_id)
            .map(|op| op.ciphertext_length())
            .unwrap_or(ENCRYPTED_KEY_LENGTH);
        if share.encrypted_private_key.len() != expected {
            return Err(InvalidReason::PayloadLengthMismatch {
                operator_id: share.operator_id,
                expected,
                actual: share.encrypted_private_key.len(),
            });
        }
    }
    Ok(())
}

// Perform basic verification on the operator set
pub fn validate_operators(operator_ids: &[OperatorId]) -> Result<(), InvalidReason> {
    let num_operators = operator_ids.len();

    // make sure there is a valid number of operators
    if num_operators > MAX_OPERATORS {
        return Err(InvalidReason::TooManyOperators(num_operators));
    }
    if num_operators == 0 {
        return Err(InvalidReason::NoOperators);
    }

    // make sure count is valid
    let f = (num_operators - 1) / 3;
    if (num_operators - 1) % 3 != 0 || !(1..=4).contains(&f) {
        return Err(InvalidReason::InvalidClusterSize(num_operators));
    }

    // make sure there are no duplicates
    let mut seen = HashSet::new();
    if !operator_ids.iter().all(|id| seen.insert(id)) {
        return Err(InvalidReason::DuplicateOperatorIds);
    }

    if operator_ids.iter().any(|id| id.0 == 0) {
        return Err(InvalidReason::ZeroOperatorId);
    }

    Ok(())
}
