use crate::{Address, Operator, OperatorId, PublicKeyBytes, SignatureBytes};

// Length of an encrypted key
pub const ENCRYPTED_KEY_LENGTH: usize = 256;

/// One of N shares of a split validator key.
#[derive(Debug, Clone)]
pub struct OperatorShare {
    /// The operator holding this share
    pub operator_id: OperatorId,
    /// The public key of this Share
    pub share_pubkey: PublicKeyBytes,
    /// The encrypted private key of the share
    pub encrypted_private_key: Vec<u8>,
}

/// The output of a key generation ceremony for a single validator: the validator key split
/// across a set of operators, together with the owner signature binding it to a nonce.
#[derive(Debug, Clone)]
pub struct ShareBundle {
    /// Aggregate public key of the validator
    pub validator_pubkey: PublicKeyBytes,
    /// Account that owns the validator registration
    pub owner: Address,
    /// Nonce the bundle claims to be signed against. Only keyshare files carry this, registration
    /// events leave it to be resolved separately.
    pub owner_nonce: Option<u64>,
    /// Shares in the order the operators are listed
    pub shares: Vec<OperatorShare>,
    /// Signature by the validator key over the owner and nonce
    pub signature: SignatureBytes,
    /// Operator keys, if the source listed them. Indexed independently of `shares`.
    pub operators: Vec<Operator>,
}

impl ShareBundle {
    pub fn operator_ids(&self) -> Vec<OperatorId> {
        self.shares.iter().map(|share| share.operator_id).collect()
    }

    /// Look up the listed key for an operator
    pub fn operator(&self, id: OperatorId) -> Option<&Operator> {
        self.operators.iter().find(|op| op.id == id)
    }
}
