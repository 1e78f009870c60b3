use clap::builder::styling::*;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

fn get_color_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Green.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser, Clone, Debug)]
#[clap(
    name = "keyshares",
    about = "Checks that validator keyshares are a valid split of the validator key and were \
             created for the owner's current registration nonce.",
    styles = get_color_style(),
    next_line_help = true,
    term_width = 80,
    disable_help_subcommand = true,
    version
)]
pub struct Keyshares {
    #[clap(
        long,
        global = true,
        value_name = "LEVEL",
        help = "Specifies the verbosity level used when emitting logs to the terminal. \
                RUST_LOG takes precedence when set.",
        default_value = "info",
        display_order = 0
    )]
    pub debug_level: String,

    #[clap(
        long,
        global = true,
        value_name = "N",
        help = "Maximum number of bundles verified concurrently. Defaults to the number of \
                logical CPUs.",
        display_order = 0
    )]
    pub workers: Option<usize>,

    #[clap(
        long,
        global = true,
        value_enum,
        default_value_t = Schedule::Shared,
        help = "How each bundle's nonce is derived from the owner nonce. `sequential` checks the \
                i-th bundle against nonce + i.",
        display_order = 0
    )]
    pub schedule: Schedule,

    #[clap(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Format of the verdict written to stdout.",
        display_order = 0
    )]
    pub output: OutputFormat,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Verify a keyshares file before its validators are registered
    PreRegistration {
        #[clap(long, value_name = "PATH", help = "Keyshares file to verify.")]
        file: PathBuf,

        #[clap(flatten)]
        nonce: NonceArgs,
    },
    /// Verify the keyshares a transaction registered
    PostRegistration {
        #[clap(long, value_name = "HASH", help = "Hash of the registration transaction.")]
        tx_hash: String,

        #[clap(
            long,
            value_name = "PATH",
            help = "Exported indexer response holding the ValidatorAdded events."
        )]
        events: PathBuf,

        #[clap(flatten)]
        nonce: NonceArgs,

        #[clap(
            long,
            value_name = "HEIGHT",
            help = "Read the owner nonce at this block instead of the registration block."
        )]
        nonce_block: Option<u64>,
    },
}

#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct NonceArgs {
    #[clap(long, value_name = "NONCE", help = "The owner nonce to verify against.")]
    pub nonce: Option<u64>,

    #[clap(
        long,
        value_name = "PATH",
        help = "Exported nonce history of the owner to read the nonce from."
    )]
    pub nonce_history: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    Shared,
    Sequential,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
