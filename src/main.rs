//! domru-check - Dom.ru customer record lookup
//!
//! Queries the public Dom.ru profile API across all regional branches to
//! discover which ones hold customer records for a given phone number,
//! email, agreement number or address.

mod cli;
mod client;
mod config;
mod error;
mod executor;
mod input;
mod logging;
mod report;
mod types;
mod version;

use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Commands, ConfigSubcommand};
use crate::client::DomruClient;
use crate::config::CheckConfig;
use crate::error::{Error, Result};
use crate::executor::{executor_for, task_fn, ExecutorConfig, TaskFn};
use crate::report::{OutputFormat, ReportEntry};
use crate::types::{ContactReport, Target};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            version::print_version();
            Ok(())
        }

        Commands::Config { subcommand } => {
            // Config commands use minimal logging
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand)
        }

        Commands::Check {
            targets,
            file,
            domain,
            config,
            tasks,
            no_progress,
            proxy,
            timeout,
            output,
            format,
        } => {
            let mut config = CheckConfig::load(config.as_deref())?;

            // CLI arguments override file and environment settings
            if let Some(tasks) = tasks {
                config.lookup.concurrency = tasks;
            }
            if no_progress {
                config.lookup.progress = false;
            }
            if let Some(proxy) = proxy {
                config.http.proxy = Some(proxy);
            }
            if let Some(timeout) = timeout {
                config.lookup.task_timeout_secs = timeout;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            config.validate()?;

            // The guards must be kept alive for the lifetime of the program
            let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

            let build = version::build_info();
            info!(
                version = %build.full_version(),
                profile = %build.profile,
                "Starting domru-check"
            );

            build_runtime()?.block_on(run_check(config, targets, file, domain, output))
        }

        Commands::Domains { config, proxy } => {
            let mut config = CheckConfig::load(config.as_deref())?;
            if let Some(proxy) = proxy {
                config.http.proxy = Some(proxy);
            }
            config.validate()?;

            let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

            build_runtime()?.block_on(run_domains(config))
        }
    }
}

/// Build the tokio runtime for network commands
fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(num_cpus::get().min(8))
        .thread_name("domru-check")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))
}

/// Run a lookup batch: cross every identifier with every branch and
/// drain the batch through the executor.
async fn run_check(
    config: CheckConfig,
    targets: Vec<String>,
    file: Option<String>,
    domain_filter: Vec<String>,
    output_path: Option<String>,
) -> Result<()> {
    let identifiers = input::load_targets(&targets, file.as_deref())?;
    if identifiers.is_empty() {
        return Err(Error::Config(
            "No identifiers given. Pass them as arguments or via --file.".to_string(),
        ));
    }

    let client = DomruClient::new(&config.http)?;

    let domains = if domain_filter.is_empty() {
        client.fetch_domains().await?
    } else {
        let mut domains = domain_filter;
        domains.sort_unstable();
        domains.dedup();
        domains
    };
    if domains.is_empty() {
        return Err(Error::Config("Branch list is empty".to_string()));
    }

    // One lookup per (identifier, branch) pair, identifier-major
    let pairs: Vec<Target> = identifiers
        .iter()
        .flat_map(|value| {
            domains
                .iter()
                .map(move |domain| Target::new(value.clone(), domain.clone()))
        })
        .collect();

    info!(
        identifiers = identifiers.len(),
        branches = domains.len(),
        lookups = pairs.len(),
        concurrency = config.lookup.concurrency,
        "Starting lookup batch"
    );

    let lookup_tasks: Vec<TaskFn<ContactReport>> = pairs
        .iter()
        .map(|target| {
            let client = client.clone();
            let target = target.clone();
            task_fn(move || async move { client.lookup(&target).await })
        })
        .collect();

    let executor_config = ExecutorConfig {
        concurrency: config.lookup.concurrency,
        progress: config.lookup.progress,
        task_timeout: match config.lookup.task_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        },
    };
    let executor = executor_for::<ContactReport>(executor_config);
    let outcomes = executor.run(lookup_tasks).await?;

    let entries: Vec<ReportEntry> = pairs
        .into_iter()
        .zip(outcomes)
        .map(|(target, outcome)| ReportEntry { target, outcome })
        .collect();

    let found = entries.iter().filter(|e| e.outcome.is_success()).count();
    let failed = entries.iter().filter(|e| e.outcome.is_failed()).count();
    info!(
        total = entries.len(),
        found, failed, "Lookup batch complete"
    );

    let format: OutputFormat = config.output.format.parse()?;
    let rendered = report::render(&entries, format);
    report::write_output(&rendered, output_path.as_deref())?;

    Ok(())
}

/// Print the list of active regional branch codes.
async fn run_domains(config: CheckConfig) -> Result<()> {
    let client = DomruClient::new(&config.http)?;
    let domains = client.fetch_domains().await?;

    for domain in &domains {
        println!("{}", domain);
    }
    info!(count = domains.len(), "Branch list fetched");

    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = CheckConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            config::init_config(path.as_deref(), force)?;
        }
        ConfigSubcommand::Validate { config } => {
            let path = config.as_deref();
            match CheckConfig::load(path) {
                Ok(_) => {
                    println!("Configuration is valid.");
                }
                Err(e) => {
                    eprint!("{}", e.format_for_terminal());
                    std::process::exit(e.exit_code());
                }
            }
        }
    }

    Ok(())
}
