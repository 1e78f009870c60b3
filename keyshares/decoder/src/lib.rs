//! Decoding of keyshare bundles into [`ShareBundle`](ssv_types::ShareBundle)s.
//!
//! Bundles reach us in one of two shapes. A keyshares file produced by a key generation ceremony
//! embeds the owner, the nonce the shares were signed against and the operator keys. A
//! `ValidatorAdded` registration event carries the same shares blob but no nonce, which has to be
//! resolved separately. Both end up as the same `ShareBundle`.

pub use error::DecodeError;
pub use event::{decode_event, decode_events, ValidatorAddedEvent};
pub use file::{decode_keyshares_file, KeysharesFile};
pub use util::{encode_shares_data, parse_shares, shares_data_length};

mod error;
mod event;
mod file;
mod util;
