pub use bls::{PublicKeyBytes, SignatureBytes, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
pub use operator::{Operator, OperatorId};
pub use share::{OperatorShare, ShareBundle, ENCRYPTED_KEY_LENGTH};
pub use util::{parse_rsa, strip_hex_prefix};

/// Ethereum address of a validator owner.
pub use alloy::primitives::Address;

mod bls;
mod operator;
mod share;
mod util;
