use crate::util::parse_rsa;
use derive_more::{Deref, Display, From};
use openssl::pkey::Public;
use openssl::rsa::Rsa;
use std::fmt::Debug;

/// Unique identifier for an Operator.
///
/// Doubles as the evaluation point of the operator's share in the threshold split.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Ord, PartialOrd, Hash, From, Deref)]
pub struct OperatorId(pub u64);

/// An operator that holds one share of a validator key, as listed in a keyshares file.
#[derive(Debug, Clone)]
pub struct Operator {
    /// ID to uniquely identify this operator
    pub id: OperatorId,
    /// RSA public key the operator's share is encrypted to
    pub rsa_pubkey: Rsa<Public>,
}

impl Operator {
    /// Creates a new operator from its OperatorId and base64 PEM-encoded public key string
    pub fn new(pem_data: &str, operator_id: OperatorId) -> Result<Self, String> {
        let rsa_pubkey = parse_rsa(pem_data)?;
        Ok(Self::new_with_pubkey(rsa_pubkey, operator_id))
    }

    // Creates a new operator from an existing RSA public key and OperatorId
    pub fn new_with_pubkey(rsa_pubkey: Rsa<Public>, id: OperatorId) -> Self {
        Self { id, rsa_pubkey }
    }

    /// Length in bytes of a ciphertext produced under this operator's key
    pub fn ciphertext_length(&self) -> usize {
        self.rsa_pubkey.size() as usize
    }
}
