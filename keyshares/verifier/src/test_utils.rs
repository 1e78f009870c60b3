//! Fixtures for tests that need cryptographically meaningful share bundles.

pub mod generators {
    use crate::crypto::{hash_to_g2, owner_nonce_message};
    use alloy::primitives::Address;
    use bls12_381::{G1Affine, Scalar};
    use ff::Field;
    use group::Curve;
    use rand::rngs::OsRng;
    use rand::RngCore;
    use ssv_types::{
        OperatorId, OperatorShare, PublicKeyBytes, ShareBundle, SignatureBytes,
        ENCRYPTED_KEY_LENGTH,
    };

    /// Split a fresh validator key across `ids` and sign for `owner` and `nonce`, the way a key
    /// generation ceremony does. The polynomial degree leaves exactly `n - f` shares needed.
    pub fn bundle(owner: Address, nonce: u64, ids: &[u64]) -> ShareBundle {
        let faulty = ids.len().saturating_sub(1) / 3;
        let threshold = ids.len().saturating_sub(faulty).max(1);
        let coefficients: Vec<Scalar> = (0..threshold)
            .map(|_| Scalar::random(&mut OsRng))
            .collect();
        let secret = coefficients[0];

        let evaluate = |x: u64| {
            let x = Scalar::from(x);
            coefficients
                .iter()
                .rev()
                .fold(Scalar::zero(), |acc, c| acc * x + c)
        };

        let shares = ids
            .iter()
            .map(|id| {
                let mut encrypted_private_key = vec![0u8; ENCRYPTED_KEY_LENGTH];
                OsRng.fill_bytes(&mut encrypted_private_key);
                OperatorShare {
                    operator_id: OperatorId(*id),
                    share_pubkey: public_key(evaluate(*id)),
                    encrypted_private_key,
                }
            })
            .collect();

        let message = owner_nonce_message(&owner, nonce);
        let signature = (hash_to_g2(message.as_slice()) * secret)
            .to_affine()
            .to_compressed();

        ShareBundle {
            validator_pubkey: public_key(secret),
            owner,
            owner_nonce: Some(nonce),
            shares,
            signature: SignatureBytes::new(signature),
            operators: Vec::new(),
        }
    }

    pub fn public_key(secret: Scalar) -> PublicKeyBytes {
        PublicKeyBytes::new((G1Affine::generator() * secret).to_affine().to_compressed())
    }
}

pub mod tamper {
    use bls12_381::{G1Affine, G1Projective};
    use group::Curve;
    use ssv_types::{PublicKeyBytes, ShareBundle};

    /// Move the share key at `position` to a different, still valid, curve point
    pub fn share_pubkey(bundle: &mut ShareBundle, position: usize) {
        let share = &mut bundle.shares[position];
        let point = G1Affine::from_compressed(share.share_pubkey.as_bytes())
            .expect("fixture share keys are valid points");
        let moved = (G1Projective::from(point) + G1Affine::generator()).to_affine();
        share.share_pubkey = PublicKeyBytes::new(moved.to_compressed());
    }

    /// Give the share at `target` the operator id of the share at `source`
    pub fn duplicate_operator(bundle: &mut ShareBundle, target: usize, source: usize) {
        bundle.shares[target].operator_id = bundle.shares[source].operator_id;
    }
}

pub mod json {
    use decoder::encode_shares_data;
    use serde_json::{json, Value};
    use ssv_types::ShareBundle;

    fn shares_hex(bundle: &ShareBundle) -> String {
        format!(
            "0x{}",
            hex::encode(encode_shares_data(&bundle.signature, &bundle.shares))
        )
    }

    fn operator_ids(bundle: &ShareBundle) -> Vec<u64> {
        bundle.operator_ids().iter().map(|id| id.0).collect()
    }

    /// A keyshares file holding `bundles`, each claiming its own nonce
    pub fn keyshares_file(bundles: &[ShareBundle]) -> Value {
        let shares: Vec<Value> = bundles
            .iter()
            .map(|bundle| {
                json!({
                    "data": {
                        "ownerNonce": bundle.owner_nonce.unwrap_or_default(),
                        "ownerAddress": bundle.owner.to_string(),
                        "publicKey": bundle.validator_pubkey.to_hex(),
                        "operators": operator_ids(bundle)
                            .iter()
                            .map(|id| json!({ "id": id, "operatorKey": "" }))
                            .collect::<Vec<_>>()
                    },
                    "payload": {
                        "publicKey": bundle.validator_pubkey.to_hex(),
                        "operatorIds": operator_ids(bundle),
                        "sharesData": shares_hex(bundle)
                    }
                })
            })
            .collect();
        json!({
            "version": "v4",
            "createdAt": "2024-10-21T10:00:00.000Z",
            "shares": shares
        })
    }

    /// An indexer export in which all `bundles` were registered by `tx_hash` in `block`
    pub fn registration_export(tx_hash: &str, block: u64, bundles: &[ShareBundle]) -> Value {
        let events: Vec<Value> = bundles
            .iter()
            .map(|bundle| {
                json!({
                    "publicKey": bundle.validator_pubkey.to_hex(),
                    "shares": shares_hex(bundle),
                    "owner": bundle.owner.to_string(),
                    "operatorIds": operator_ids(bundle),
                    "blockNumber": block.to_string(),
                    "transactionHash": tx_hash
                })
            })
            .collect();
        json!({ "data": { "validatorAddeds": events } })
    }
}
