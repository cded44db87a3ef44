//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Shared expense ledger: who owes whom after a trip, a dinner, a shared flat
#[derive(Parser, Debug)]
#[command(name = "groupsplit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Session file (TOML); falls back to `session_file` in the config
    #[arg(short, long, global = true, env = "GROUPSPLIT_SESSION", value_hint = ValueHint::FilePath)]
    pub session: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show paid total and net balance of every member
    Balances,

    /// Propose transfers that settle all balances
    Settle,

    /// List members matching the filters
    Members(MemberArgs),

    /// List expenses matching the filters
    Expenses(ExpenseArgs),

    /// Show session metadata
    Info,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct MemberArgs {
    /// Member name (repeatable)
    #[arg(long = "name")]
    pub names: Vec<String>,

    /// Member id (repeatable)
    #[arg(long = "id")]
    pub ids: Vec<u32>,

    /// Exact weight (repeatable)
    #[arg(long = "weight")]
    pub weights: Vec<f64>,

    /// Only members with balance above this amount
    #[arg(long, allow_negative_numbers = true)]
    pub above: Option<f64>,

    /// Only members with balance below this amount
    #[arg(long, allow_negative_numbers = true)]
    pub below: Option<f64>,

    /// Include soft-deleted members
    #[arg(short, long)]
    pub all: bool,
}

#[derive(clap::Args, Debug, Default)]
pub struct ExpenseArgs {
    /// Expense name (repeatable)
    #[arg(long = "name")]
    pub names: Vec<String>,

    /// Expense id (repeatable)
    #[arg(long = "id")]
    pub ids: Vec<u32>,

    /// Payer name (repeatable)
    #[arg(long = "payer")]
    pub payers: Vec<String>,

    /// Participant name (repeatable, matches any)
    #[arg(long = "participant")]
    pub participants: Vec<String>,

    /// Only expenses worth more than this
    #[arg(long)]
    pub min: Option<f64>,

    /// Only expenses worth less than this
    #[arg(long)]
    pub max: Option<f64>,

    /// Include soft-deleted expenses
    #[arg(short, long)]
    pub all: bool,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a commented config template
    Template,
}
