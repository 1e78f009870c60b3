/// How the nonce each bundle is checked against is derived from the authoritative nonce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NonceSchedule {
    /// Every bundle is checked against the authoritative nonce
    #[default]
    Shared,
    /// Bundle `i` is checked against `nonce + i`. Registering several validators in one
    /// transaction advances the owner nonce once per validator, so batches are signed this way.
    Sequential,
}

impl NonceSchedule {
    /// Nonce the bundle at `index` must have been signed with
    pub fn nonce_for(&self, authoritative: u64, index: usize) -> u64 {
        match self {
            Self::Shared => authoritative,
            Self::Sequential => authoritative.saturating_add(index as u64),
        }
    }
}

#[derive(Clone, Debug)]
/// Configuration for a batch verification. Provided to [`crate::verify_bundles`].
pub struct Config {
    /// The maximum number of bundles verified concurrently. By default, this is the number of
    /// logical CPUs.
    pub max_workers: usize,
    pub schedule: NonceSchedule,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
            schedule: NonceSchedule::default(),
        }
    }
}
