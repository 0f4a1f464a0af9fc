use std::path::PathBuf;

use clap::Parser;

/// Replays balance operations from a CSV file and prints the final balances.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "accounter")]
#[command(version)]
pub struct Config {
    /// CSV file with `type, account, key, amount` rows
    pub input: PathBuf,
}
