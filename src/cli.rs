//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for domru-check.

use clap::{Parser, Subcommand};

/// domru-check - Dom.ru customer record lookup
///
/// Queries the public Dom.ru profile API to discover which regional
/// branches hold customer records for a phone number, email, agreement
/// number or address.
#[derive(Parser, Debug)]
#[command(name = "domru-check")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check identifiers against the Dom.ru API
    Check {
        /// Identifiers to check (phone, email, agreement number or address)
        #[arg(value_name = "IDENTIFIER")]
        targets: Vec<String>,

        /// Read identifiers from a file, one per line
        #[arg(short, long)]
        file: Option<String>,

        /// Restrict the check to specific regional branch codes (repeatable)
        #[arg(short, long)]
        domain: Vec<String>,

        /// Path to configuration file
        #[arg(short, long, env = "DOMRU_CONFIG")]
        config: Option<String>,

        /// Maximum lookups in flight at once
        #[arg(short, long)]
        tasks: Option<usize>,

        /// Disable the live progress counter
        #[arg(long)]
        no_progress: bool,

        /// Proxy URL, e.g. socks5://127.0.0.1:9050
        #[arg(long, env = "DOMRU_PROXY")]
        proxy: Option<String>,

        /// Per-lookup timeout in seconds (0 = no timeout)
        #[arg(long)]
        timeout: Option<u64>,

        /// Write results to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Output format: plain, json, csv
        #[arg(long)]
        format: Option<String>,
    },

    /// List active regional branch codes from the Dom.ru API
    Domains {
        /// Path to configuration file
        #[arg(short, long, env = "DOMRU_CONFIG")]
        config: Option<String>,

        /// Proxy URL, e.g. socks5://127.0.0.1:9050
        #[arg(long, env = "DOMRU_PROXY")]
        proxy: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}
