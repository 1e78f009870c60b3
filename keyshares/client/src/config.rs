use crate::cli::{Command, Keyshares, NonceArgs, OutputFormat, Schedule};
use crate::NonceHeight;
use std::path::PathBuf;
use verifier::NonceSchedule;

/// Where the authoritative owner nonce is read from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NonceInput {
    Fixed(u64),
    History(PathBuf),
}

/// Where the bundles to verify are read from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundleInput {
    KeysharesFile(PathBuf),
    Registration { tx_hash: String, events: PathBuf },
}

/// Everything a single run of the verifier needs
#[derive(Clone, Debug)]
pub struct Config {
    pub input: BundleInput,
    pub nonce: NonceInput,
    pub nonce_height: NonceHeight,
    pub verifier: verifier::Config,
    pub output: OutputFormat,
}

impl Config {
    /// Build a config from parsed command line arguments
    pub fn from_cli(cli: &Keyshares) -> Result<Config, String> {
        let mut verifier = verifier::Config::default();
        if let Some(workers) = cli.workers {
            if workers == 0 {
                return Err("--workers must be at least 1".to_string());
            }
            verifier.max_workers = workers;
        }
        verifier.schedule = match cli.schedule {
            Schedule::Shared => NonceSchedule::Shared,
            Schedule::Sequential => NonceSchedule::Sequential,
        };

        let (input, nonce, nonce_height) = match &cli.command {
            Command::PreRegistration { file, nonce } => (
                BundleInput::KeysharesFile(file.clone()),
                nonce_input(nonce)?,
                NonceHeight::Latest,
            ),
            Command::PostRegistration {
                tx_hash,
                events,
                nonce,
                nonce_block,
            } => (
                BundleInput::Registration {
                    tx_hash: tx_hash.clone(),
                    events: events.clone(),
                },
                nonce_input(nonce)?,
                nonce_block.map_or(NonceHeight::RegistrationBlock, NonceHeight::Block),
            ),
        };

        Ok(Config {
            input,
            nonce,
            nonce_height,
            verifier,
            output: cli.output,
        })
    }
}

fn nonce_input(args: &NonceArgs) -> Result<NonceInput, String> {
    match (args.nonce, &args.nonce_history) {
        (Some(nonce), None) => Ok(NonceInput::Fixed(nonce)),
        (None, Some(path)) => Ok(NonceInput::History(path.clone())),
        _ => Err("Exactly one of --nonce or --nonce-history is required".to_string()),
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_pre_registration_defaults() {
        let cli = Keyshares::parse_from([
            "keyshares",
            "pre-registration",
            "--file",
            "keyshares.json",
            "--nonce",
            "5",
        ]);
        let config = Config::from_cli(&cli).unwrap();
        assert_eq!(
            config.input,
            BundleInput::KeysharesFile(PathBuf::from("keyshares.json"))
        );
        assert_eq!(config.nonce, NonceInput::Fixed(5));
        assert_eq!(config.nonce_height, NonceHeight::Latest);
        assert_eq!(config.verifier.schedule, NonceSchedule::Shared);
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn test_post_registration_args() {
        let cli = Keyshares::parse_from([
            "keyshares",
            "--workers",
            "2",
            "--schedule",
            "sequential",
            "--output",
            "json",
            "post-registration",
            "--tx-hash",
            "0xabc",
            "--events",
            "events.json",
            "--nonce-history",
            "nonces.json",
        ]);
        let config = Config::from_cli(&cli).unwrap();
        assert_eq!(config.nonce_height, NonceHeight::RegistrationBlock);
        assert_eq!(config.nonce, NonceInput::History(PathBuf::from("nonces.json")));
        assert_eq!(config.verifier.max_workers, 2);
        assert_eq!(config.verifier.schedule, NonceSchedule::Sequential);
        assert_eq!(config.output, OutputFormat::Json);

        let cli = Keyshares::parse_from([
            "keyshares",
            "post-registration",
            "--tx-hash",
            "0xabc",
            "--events",
            "events.json",
            "--nonce",
            "1",
            "--nonce-block",
            "900",
        ]);
        let config = Config::from_cli(&cli).unwrap();
        assert_eq!(config.nonce_height, NonceHeight::Block(900));
    }

    #[test]
    fn test_nonce_arguments_are_exclusive() {
        assert!(Keyshares::try_parse_from([
            "keyshares",
            "pre-registration",
            "--file",
            "f.json",
            "--nonce",
            "1",
            "--nonce-history",
            "h.json",
        ])
        .is_err());
        assert!(Keyshares::try_parse_from(["keyshares", "pre-registration", "--file", "f.json"])
            .is_err());

        let cli = Keyshares::parse_from([
            "keyshares",
            "--workers",
            "0",
            "pre-registration",
            "--file",
            "f.json",
            "--nonce",
            "1",
        ]);
        assert!(Config::from_cli(&cli).is_err());
    }
}
