use derive_more::{Deref, From};
use std::fmt;
use std::str::FromStr;

use crate::util::strip_hex_prefix;

// phase0.PublicKeyLength
pub const PUBLIC_KEY_LENGTH: usize = 48;
// phase0.SignatureLength
pub const SIGNATURE_LENGTH: usize = 96;

// Fixed length byte containers for compressed BLS12-381 points. These do not check that the bytes
// are a valid curve point, that is left to whoever performs the cryptography.
macro_rules! define_bytes_type {
    ($name:ident, $len:ident, $what:literal) => {
        #[doc = concat!("Compressed BLS12-381 ", $what, " as it appears on chain.")]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Deref, From)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex with a `0x` prefix
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = String;
            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                let array: [u8; $len] = bytes.try_into().map_err(|_| {
                    format!(
                        "{} has invalid length: expected {}, got {}",
                        $what,
                        $len,
                        bytes.len()
                    )
                })?;
                Ok(Self(array))
            }
        }

        impl FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(strip_hex_prefix(s))
                    .map_err(|e| format!("Failed to decode {} from hex: {}", $what, e))?;
                Self::try_from(bytes.as_slice())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

define_bytes_type!(PublicKeyBytes, PUBLIC_KEY_LENGTH, "public key");
define_bytes_type!(SignatureBytes, SIGNATURE_LENGTH, "signature");
