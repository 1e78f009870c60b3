//! Keyshare validity verification.
//!
//! Given decoded [`ShareBundle`]s, the owner they are registered for and the owner's
//! authoritative nonce, decide for every bundle whether its shares are a valid split of the
//! validator key and were created for exactly this owner and nonce. A bundle is valid only if:
//!
//! 1. it belongs to the owner,
//! 2. its operator set forms a 3f+1 cluster without repeated or zero ids,
//! 3. its signature verifies over `keccak256("<owner>:<nonce>")` under the key its shares
//!    interpolate to, and
//! 4. that key is the declared validator key.
//!
//! Invalid bundles never abort the batch, they show up as `false` in the [`Verdict`]. Bundles are
//! independent, so they are checked in parallel and written back by index.

mod checks;
mod config;
pub mod crypto;
mod verdict;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use checks::{check_bundle, validate_operators, MAX_OPERATORS};
pub use config::{Config, NonceSchedule};
pub use verdict::{InvalidReason, Verdict, VerdictEntry};

use alloy::primitives::Address;
use ssv_types::ShareBundle;
use std::thread;
use tracing::{debug, info, instrument};

/// Verify a batch of bundles against the owner's authoritative nonce.
///
/// The nonce is trusted as given. Picking the block height it was read at is the caller's job.
#[instrument(skip_all, fields(bundles = bundles.len(), nonce = nonce, owner = %owner))]
pub fn verify_bundles(
    bundles: &[ShareBundle],
    nonce: u64,
    owner: &Address,
    config: &Config,
) -> Verdict {
    let schedule = config.schedule;
    let check = |index: usize, bundle: &ShareBundle| {
        let result = check_bundle(bundle, schedule.nonce_for(nonce, index), owner);
        if let Err(reason) = &result {
            debug!(
                index,
                validator_pubkey = %bundle.validator_pubkey,
                reason = %reason,
                "Bundle failed verification"
            );
        }
        result
    };

    let workers = config.max_workers.clamp(1, bundles.len().max(1));
    let outcomes: Vec<Result<(), InvalidReason>> = if workers == 1 {
        bundles
            .iter()
            .enumerate()
            .map(|(index, bundle)| check(index, bundle))
            .collect()
    } else {
        let chunk_size = bundles.len().div_ceil(workers);
        let mut outcomes = vec![Ok(()); bundles.len()];
        thread::scope(|scope| {
            for (chunk_index, (bundle_chunk, outcome_chunk)) in bundles
                .chunks(chunk_size)
                .zip(outcomes.chunks_mut(chunk_size))
                .enumerate()
            {
                let check = &check;
                scope.spawn(move || {
                    let offset = chunk_index * chunk_size;
                    for (i, (bundle, outcome)) in
                        bundle_chunk.iter().zip(outcome_chunk.iter_mut()).enumerate()
                    {
                        *outcome = check(offset + i, bundle);
                    }
                });
            }
        });
        outcomes
    };

    let entries: Vec<VerdictEntry> = bundles
        .iter()
        .zip(outcomes)
        .map(|(bundle, outcome)| VerdictEntry {
            public_key: bundle.validator_pubkey.to_hex(),
            valid: outcome.is_ok(),
            reason: outcome.err(),
        })
        .collect();
    let verdict = Verdict::new(entries);

    info!(
        valid = verdict.len() - verdict.invalid_count(),
        invalid = verdict.invalid_count(),
        "Verified keyshares"
    );
    verdict
}

#[cfg(test)]
mod verifier_tests {
    use super::*;
    use crate::test_utils::{generators, tamper};
    use alloy::primitives::address;

    const OWNER: Address = address!("382f6ff5b9a29fcf1dd2bf8b86c3234dc7ed2df6");

    fn config(max_workers: usize) -> Config {
        Config {
            max_workers,
            schedule: NonceSchedule::Shared,
        }
    }

    #[test]
    // Batch of three where the middle bundle had a share altered
    fn test_one_tampered_bundle_in_batch() {
        let mut bundles: Vec<ShareBundle> = (0..3)
            .map(|_| generators::bundle(OWNER, 5, &[1, 2, 3, 4]))
            .collect();
        tamper::share_pubkey(&mut bundles[1], 1);

        for workers in [1, 2, 8] {
            let verdict = verify_bundles(&bundles, 5, &OWNER, &config(workers));
            assert_eq!(verdict.flags(), vec![true, false, true]);
            assert_eq!(
                verdict.entries()[1].reason,
                Some(InvalidReason::SignatureMismatch)
            );
        }
    }

    #[test]
    // Output order has to follow input order no matter how the work is split
    fn test_verdict_preserves_order() {
        let mut bundles: Vec<ShareBundle> = (0..7)
            .map(|i| generators::bundle(OWNER, if i % 3 == 0 { 9 } else { 2 }, &[1, 2, 3, 4]))
            .collect();
        bundles.reverse();
        bundles.swap(1, 5);

        for workers in [1, 3, 4, 16] {
            let verdict = verify_bundles(&bundles, 9, &OWNER, &config(workers));
            let keys: Vec<String> = bundles.iter().map(|b| b.validator_pubkey.to_hex()).collect();
            let verdict_keys: Vec<String> = verdict.iter().map(|(k, _)| k.to_string()).collect();
            assert_eq!(keys, verdict_keys);

            let expected: Vec<bool> = bundles
                .iter()
                .map(|b| b.owner_nonce == Some(9))
                .collect();
            assert_eq!(verdict.flags(), expected);
        }
    }

    #[test]
    fn test_sequential_schedule() {
        let bundles: Vec<ShareBundle> = (0..3)
            .map(|i| generators::bundle(OWNER, 10 + i, &[1, 2, 3, 4]))
            .collect();

        let sequential = Config {
            max_workers: 2,
            schedule: NonceSchedule::Sequential,
        };
        assert!(verify_bundles(&bundles, 10, &OWNER, &sequential).all_valid());

        // the same batch checked against a single shared nonce only accepts the first bundle
        let verdict = verify_bundles(&bundles, 10, &OWNER, &config(2));
        assert_eq!(verdict.flags(), vec![true, false, false]);
    }

    #[test]
    fn test_empty_batch() {
        let verdict = verify_bundles(&[], 0, &OWNER, &Config::default());
        assert!(verdict.is_empty());
    }
}
