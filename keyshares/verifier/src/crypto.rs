//! BLS12-381 primitives used by the keyshare checks.
//!
//! Public keys live in G1 and signatures in G2, following the Ethereum proof-of-possession
//! ciphersuite.

use alloy::primitives::{keccak256, Address, B256};
use bls12_381::hash_to_curve::{ExpandMsgXmd, HashToCurve};
use bls12_381::{pairing, G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use group::Curve;
use sha2::Sha256;
use ssv_types::{OperatorId, PublicKeyBytes, SignatureBytes};

/// Domain separation tag of the Ethereum BLS signature scheme
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// The message a bundle's signature is computed over. Shares are only ever valid for the owner
/// and nonce they were created for, so both go into the message.
pub fn owner_nonce_message(owner: &Address, nonce: u64) -> B256 {
    // Address displays with its EIP-55 checksum, which is what gets signed
    let data = format!("{}:{}", owner, nonce);
    keccak256(data)
}

pub fn hash_to_g2(message: &[u8]) -> G2Projective {
    <G2Projective as HashToCurve<ExpandMsgXmd<Sha256>>>::hash_to_curve(message, DST)
}

/// Decompress a public key. The point at infinity is rejected, it would accept any signature made
/// by the identity.
pub fn decompress_public_key(bytes: &PublicKeyBytes) -> Option<G1Affine> {
    let point: Option<G1Affine> = G1Affine::from_compressed(bytes.as_bytes()).into();
    point.filter(|p| !bool::from(p.is_identity()))
}

pub fn decompress_signature(bytes: &SignatureBytes) -> Option<G2Affine> {
    G2Affine::from_compressed(bytes.as_bytes()).into()
}

// e(pk, H(m)) == e(g1, sig)
pub fn verify_signature(public_key: &G1Affine, signature: &G2Affine, message: &[u8]) -> bool {
    let hashed = G2Affine::from(hash_to_g2(message));
    pairing(public_key, &hashed) == pairing(&G1Affine::generator(), signature)
}

/// Recover the key at `x = 0` from shares evaluated at `x = operator id`.
///
/// Every supplied point takes part, so a single altered share changes the result. Returns `None`
/// for an empty set, a zero id or repeated ids, none of which define an interpolation.
pub fn reconstruct_public_key(points: &[(OperatorId, G1Affine)]) -> Option<G1Affine> {
    if points.is_empty() {
        return None;
    }

    let xs: Vec<Scalar> = points.iter().map(|(id, _)| Scalar::from(**id)).collect();
    if xs.iter().any(|x| *x == Scalar::zero()) {
        return None;
    }

    let mut sum = G1Projective::identity();
    for (i, (_, point)) in points.iter().enumerate() {
        let coefficient = lagrange_coefficient_at_zero(&xs, i)?;
        sum += G1Projective::from(point) * coefficient;
    }
    Some(sum.to_affine())
}

// prod_{j != i} x_j / (x_j - x_i)
fn lagrange_coefficient_at_zero(xs: &[Scalar], i: usize) -> Option<Scalar> {
    let mut numerator = Scalar::one();
    let mut denominator = Scalar::one();
    for (j, x_j) in xs.iter().enumerate() {
        if j == i {
            continue;
        }
        numerator *= x_j;
        denominator *= x_j - xs[i];
    }
    // zero denominator means a repeated x
    let inverse: Option<Scalar> = denominator.invert().into();
    inverse.map(|inv| numerator * inv)
}
