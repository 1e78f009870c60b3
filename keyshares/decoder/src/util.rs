use crate::DecodeError;
use serde_json::Value;
use ssv_types::{
    strip_hex_prefix, OperatorId, OperatorShare, PublicKeyBytes, SignatureBytes,
    ENCRYPTED_KEY_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
};

/// Expected length of a shares blob for the given number of operators
pub fn shares_data_length(operator_count: usize) -> usize {
    SIGNATURE_LENGTH + (PUBLIC_KEY_LENGTH + ENCRYPTED_KEY_LENGTH) * operator_count
}

// Parses shares from a ValidatorAdded event or a keyshares file payload.
// The data is a byte stream of the form
// [signature | public keys | encrypted keys].
pub fn parse_shares(
    index: usize,
    shares: &[u8],
    operator_ids: &[OperatorId],
) -> Result<(SignatureBytes, Vec<OperatorShare>), DecodeError> {
    let operator_count = operator_ids.len();

    // Calculate offsets for different components within the shares
    let signature_offset = SIGNATURE_LENGTH;
    let pub_keys_offset = PUBLIC_KEY_LENGTH * operator_count + signature_offset;
    let shares_expected_length = shares_data_length(operator_count);

    if shares_expected_length != shares.len() {
        return Err(DecodeError::InvalidLength {
            index,
            field: "sharesData",
            expected: shares_expected_length,
            actual: shares.len(),
        });
    }

    let signature = SignatureBytes::try_from(&shares[..signature_offset]).map_err(|_| {
        DecodeError::InvalidLength {
            index,
            field: "signature",
            expected: SIGNATURE_LENGTH,
            actual: signature_offset,
        }
    })?;

    let share_public_keys = shares[signature_offset..pub_keys_offset].chunks(PUBLIC_KEY_LENGTH);
    let encrypted_keys = shares[pub_keys_offset..].chunks(ENCRYPTED_KEY_LENGTH);

    // Pair up the share public keys and the encrypted private keys in operator order
    let shares = share_public_keys
        .zip(encrypted_keys)
        .zip(operator_ids)
        .map(|((public, encrypted), operator_id)| {
            let share_pubkey =
                PublicKeyBytes::try_from(public).map_err(|_| DecodeError::InvalidLength {
                    index,
                    field: "share public key",
                    expected: PUBLIC_KEY_LENGTH,
                    actual: public.len(),
                })?;
            Ok(OperatorShare {
                operator_id: *operator_id,
                share_pubkey,
                encrypted_private_key: encrypted.to_vec(),
            })
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    Ok((signature, shares))
}

/// Inverse of [`parse_shares`]. Shares are written in the order given.
pub fn encode_shares_data(signature: &SignatureBytes, shares: &[OperatorShare]) -> Vec<u8> {
    let mut data = Vec::with_capacity(shares_data_length(shares.len()));
    data.extend_from_slice(signature.as_slice());
    for share in shares {
        data.extend_from_slice(share.share_pubkey.as_slice());
    }
    for share in shares {
        data.extend_from_slice(&share.encrypted_private_key);
    }
    data
}

pub(crate) fn decode_hex(index: usize, field: &'static str, s: &str) -> Result<Vec<u8>, DecodeError> {
    hex::decode(strip_hex_prefix(s.trim())).map_err(|e| DecodeError::InvalidHex {
        index,
        field,
        reason: e.to_string(),
    })
}

pub(crate) fn decode_public_key(
    index: usize,
    field: &'static str,
    s: &str,
) -> Result<PublicKeyBytes, DecodeError> {
    let bytes = decode_hex(index, field, s)?;
    PublicKeyBytes::try_from(bytes.as_slice()).map_err(|_| DecodeError::InvalidLength {
        index,
        field,
        expected: PUBLIC_KEY_LENGTH,
        actual: bytes.len(),
    })
}

// Indexers and ceremony tools disagree on whether integers are JSON numbers or decimal strings, so
// accept both
pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

pub(crate) fn parse_operator_ids(index: usize, ids: &[Value]) -> Result<Vec<OperatorId>, DecodeError> {
    ids.iter()
        .map(|id| {
            value_as_u64(id)
                .map(OperatorId)
                .ok_or_else(|| DecodeError::InvalidOperatorId {
                    index,
                    value: id.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod decoder_util_tests {
    use super::*;
    use serde_json::json;

    // Registration share data taken from chain, signed for four operators
    const ONCHAIN_SHARE_DATA: &str = "ab6c91297d2a604d2fc301ad161f99a16baa53e549fd1822acf0f6834450103555b03281d23d0ab7ee944d564f794e040ecd60ad9894747cc6b55ef017876079c1d6aa48595a1791cefc73aa6781c5e26bc644d515e9e9c5bbc8d2b5b173569ba547ba1edf393778d17ad13f2bc8c9b5c2e17b563998a2307b6dddda4d7c6ed3a7f261137fd9c2a81bb1ad1fea6896a8b9719027f01c9b496cf7ade5972e96c94e523e2671662bcfc80d5b6672877de39803d10251d7ecb76794252dea94aa348143c62887bcd62cfb680326c786e22b6a558895f037854e0a70019360c129a788fafe48c18374382cd97a4ea5797bcf982526e76eb89d132e5547f43e9ae9fdf64e061d2f5fcb5bd5ff1de8e7722b53730c6c6a1cc31791fceaabe2e5d79944a7c0d4459ec10153075996e9ef62e4fa9da730873652820c32476c1ddfd10a7b322e67e78759ed9cdec042a09069efc363778f620b3e5ffe01cb1a45bb278768f44342c45736b3a5ccdfbf10b0a10ed26a36af787363398dd776aea98d131738a881739b7e0ee4aa5e280355e2d2254f444ade07c239f5f6870fac2143de480e6ff5e3954d6e441fd16132296960b523bd23fa7b52e357ed03f8201ed4c9b4ed486a66c818e319418c8e34d844b3812f75a74a1607c9bb0eda11c89dbd67858730076e17ed3f6d021c2e57e94e9c3d53e1f6a9c7c2d8373fd5e3340e3a14951e97b7baa5fc1825ba59bb3990f1c607d22756fd178f1a0674d47ee476633f27e961ec3a79b236fb20f863814b47fb9eee75fdbdab99b6901087c41dd31d5320ac3e3c772a8982c64b1c138cbfb968e8a6e59f027bcc53adf2f4f171cbdc6f576dbf313b11485400356865f1f2b0b0533e576d7e3487d5d7d85e8d57aeab4314ec1e49f7647b3eea9a7f1fb805cb944b175c39a2668f96d4cd97afd3dc1258cbaccde6dc5e4b48d4bfd783396505e6f083c5cb3af9e24e90f1eac03f8e8cbc2664b9e6dc81543a1a68973bb03e84f50338ed6c1247447d3a3acef69879900fa9596492cce31130668621f038f365b8b4b1946c95e41e652d868421e574850f5b0b6befb481c93be55c3f9a90f613823942fbd71354ad8202b0121885a0da475d551a86da0c7a983b4d7b403d91adf275b3348fd09b797ccb6be7ebb96efe024588d2f8105e3b7ec5e6cbefd3bb287c82f717597244ea36df07753f0dcc4ce64570fff04447a96cb9f80c6359306c5e45a42e8bbaeb3de9e2ba37aeeed85bcaeb6c61f77c9d26dd4ca853ca09ea8e2e61c675b250c7c6c6c29d7829b3534e0749b9e69b67de569b21f6f0f9a46698b30aad615800aa26ae3629f4b91dfbc3d12cf6b61ed47846b0c0522db60ac41bfc3c4e233bd098180d0257310d58099592d0a5a87e4c6704b64683ee1c746f2a659a01939fbc2b72d196f94452a2b32fa945d1be80a76ba64061bdb73aa23fb83b9e96af949a13e3407a3b37529e79a79814eb172afe4ff56af68417a4191ede4c5c8521ca36c41c0f9e45a960bd32c8a14cb54442e27abf8cf96089736e14340eb017cadf640dbd30014f1802ba6c686e9039f6e5509384a5bfb3f82bef56a4db9778add48a7384d6e25357842a3c591c611908083d420c6e77699793dbf0f1cc597137b48933246c7f5693098a3218312c4ae030dd74b4291e3e1f95702c7f66c22dba7a8ac634e200534c1b6b9c6397c415ab1c448c4eb6481d35250dd83c599cdc05b6e222a4543147e289cf611755dbb1f0968a61c3741a7347db1599b9c4b71e39d4921c7b3bbe018a6a766c7c26fd31e77eb9b727a6a9ca1d72a44317a54e43004f4f42dd5731ed3e83248bc2d5ccef";

    #[test]
    // Ensure that we can properly parse share data into a set of shares
    fn test_parse_shares() {
        let share_data = hex::decode(ONCHAIN_SHARE_DATA).expect("Failed to decode hex string");
        let operator_ids = vec![OperatorId(1), OperatorId(2), OperatorId(3), OperatorId(4)];

        let (signature, shares) =
            parse_shares(0, &share_data, &operator_ids).expect("Failed to parse shares");
        assert_eq!(shares.len(), 4);
        assert_eq!(signature.as_slice(), &share_data[..SIGNATURE_LENGTH]);
        assert!(shares
            .iter()
            .all(|share| share.encrypted_private_key.len() == ENCRYPTED_KEY_LENGTH));
        assert_eq!(
            shares.iter().map(|s| s.operator_id).collect::<Vec<_>>(),
            operator_ids
        );

        // the blob re-encodes to exactly what was on chain
        assert_eq!(encode_shares_data(&signature, &shares), share_data);
    }

    #[test]
    // The operator count determines the layout, so a wrong count must not parse
    fn test_parse_shares_wrong_operator_count() {
        let share_data = hex::decode(ONCHAIN_SHARE_DATA).expect("Failed to decode hex string");
        let operator_ids = vec![OperatorId(1), OperatorId(2), OperatorId(3)];

        let err = parse_shares(2, &share_data, &operator_ids).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidLength {
                index: 2,
                field: "sharesData",
                expected: shares_data_length(3),
                actual: share_data.len(),
            }
        );
    }

    #[test]
    fn test_value_as_u64() {
        assert_eq!(value_as_u64(&json!(5)), Some(5));
        assert_eq!(value_as_u64(&json!("17")), Some(17));
        assert_eq!(value_as_u64(&json!(-1)), None);
        assert_eq!(value_as_u64(&json!(1.5)), None);
        assert_eq!(value_as_u64(&json!("five")), None);
        assert_eq!(value_as_u64(&json!(null)), None);
    }
}
