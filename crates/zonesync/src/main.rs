// # zonesync - Route 53 zone push/pull
//
// The zonesync binary is a THIN integration layer. All parsing, diffing and
// validation lives in zonesync-core; this file only:
// 1. Parses command-line arguments
// 2. Reads configuration from environment variables
// 3. Registers providers and builds the Reconciler
// 4. Prints documents and asks for confirmation
//
// ## Usage
//
// ```bash
// zonesync --zone example.com --pull > example.com.xml
// zonesync --zone example.com --push example.com.xml
// zonesync --zone example.com --push - < example.com.xml   # implies --confirm
// ```
//
// ## Configuration
//
// ### Credentials
// Resolved by the standard AWS chain: `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`
// (with `AWS_SESSION_TOKEN`), `AWS_PROFILE` and `~/.aws/credentials`, web
// identity, then container or instance roles.
//
// ### Provider
// - `ZONESYNC_ROUTE53_ENDPOINT`: endpoint override (optional)
// - `ZONESYNC_API_VERSION`: API version (default 2013-04-01)
// - `ZONESYNC_MODE`: `dry-run` to skip submissions
//
// ### Limits
// - `ZONESYNC_MAX_CHANGES`, `ZONESYNC_MAX_VALUES`, `ZONESYNC_MAX_VALUE_CHARS`
//
// ### Audit
// - `ZONESYNC_AUDIT_LOG`: `memory` or a JSON file path (disabled when unset)
//
// ### Logging
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error (overrides `--verbose`)

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::env;
use std::io::{self, BufRead, Read, Write};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::{
    AuditLogConfig, ChangeBatchLimits, ProviderConfig, ProviderRegistry, Reconciler, RecordSet,
    SyncConfig, ZoneProvider, normalize,
};

/// Exit codes for the possible outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// Done, or nothing to do
    Success = 0,
    /// Usage or configuration error
    ConfigError = 1,
    /// Provider, parse or I/O failure
    RuntimeError = 2,
    /// The change batch exceeds provider limits
    InvalidChangeset = 3,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Push/pull Amazon Route 53 hosted-zone configurations
#[derive(Debug, Parser)]
#[command(name = "zonesync", version, about)]
#[command(group(ArgGroup::new("mode").required(true).args(["pull", "push"])))]
struct Cli {
    /// Zone to push or pull (e.g. example.com)
    #[arg(long, value_name = "NAME")]
    zone: String,

    /// Dump the current remote record sets to stdout
    #[arg(long)]
    pull: bool,

    /// Push the record sets in this file (`-` for stdin)
    #[arg(long, value_name = "FILE")]
    push: Option<String>,

    /// Do not prompt before pushing
    #[arg(long)]
    confirm: bool,

    /// Debug logging
    #[arg(long)]
    verbose: bool,

    /// Change batch comment (default names user, host and time)
    #[arg(long, value_name = "TEXT")]
    comment: Option<String>,
}

impl Cli {
    /// Whether to push without prompting
    ///
    /// Reading the document from stdin leaves no stdin for the prompt.
    fn confirmed(&self) -> bool {
        self.confirm || self.push.as_deref() == Some("-")
    }
}

/// Build the configuration from a variable lookup
fn sync_config(lookup: impl Fn(&str) -> Option<String>) -> Result<SyncConfig> {
    // Credentials are left to the AWS chain
    let provider = ProviderConfig::Route53 {
        access_key_id: None,
        secret_access_key: None,
        session_token: None,
        endpoint: lookup("ZONESYNC_ROUTE53_ENDPOINT").filter(|v| !v.is_empty()),
    };

    let mut config = SyncConfig::new(provider);

    if let Some(version) = lookup("ZONESYNC_API_VERSION").filter(|v| !v.is_empty()) {
        config.api_version = version;
    }

    let defaults = ChangeBatchLimits::default();
    config.limits = ChangeBatchLimits {
        max_changes: parse_var(&lookup, "ZONESYNC_MAX_CHANGES", defaults.max_changes)?,
        max_values: parse_var(&lookup, "ZONESYNC_MAX_VALUES", defaults.max_values)?,
        max_value_chars: parse_var(&lookup, "ZONESYNC_MAX_VALUE_CHARS", defaults.max_value_chars)?,
    };

    config.audit_log = match lookup("ZONESYNC_AUDIT_LOG").as_deref() {
        None | Some("") => AuditLogConfig::Disabled,
        Some("memory") => AuditLogConfig::Memory,
        Some(path) => AuditLogConfig::File {
            path: path.to_string(),
        },
    };

    config.validate()?;
    Ok(config)
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{} '{}' is not valid: {}", name, raw, e)),
        None => Ok(default),
    }
}

fn log_level(verbose: bool, override_level: Option<&str>) -> Result<Level> {
    match override_level.map(str::to_lowercase).as_deref() {
        None | Some("") => Ok(if verbose { Level::DEBUG } else { Level::INFO }),
        Some("trace") => Ok(Level::TRACE),
        Some("debug") => Ok(Level::DEBUG),
        Some("info") => Ok(Level::INFO),
        Some("warn") => Ok(Level::WARN),
        Some("error") => Ok(Level::ERROR),
        Some(other) => anyhow::bail!(
            "ZONESYNC_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            other
        ),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ZonesyncExitCode::ConfigError
            } else {
                ZonesyncExitCode::Success
            }
            .into();
        }
    };

    // Initialize tracing
    let level = match log_level(cli.verbose, env::var("ZONESYNC_LOG_LEVEL").ok().as_deref()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let config = match sync_config(|name| env::var(name).ok()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let registry = ProviderRegistry::new();
    #[cfg(feature = "route53")]
    zonesync_provider_route53::register(&registry, &config.api_version);

    let provider = match registry.create_provider(&config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to create provider: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(cli, config, provider).await {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                exit_code_for(&e)
            }
        }
    })
    .into()
}

/// Exit code for a failed run
fn exit_code_for(error: &anyhow::Error) -> ZonesyncExitCode {
    match error.downcast_ref::<zonesync_core::Error>() {
        Some(zonesync_core::Error::ChangesetInvalid(_)) => ZonesyncExitCode::InvalidChangeset,
        Some(zonesync_core::Error::Config(_)) => ZonesyncExitCode::ConfigError,
        _ => ZonesyncExitCode::RuntimeError,
    }
}

async fn run(
    cli: Cli,
    config: SyncConfig,
    provider: Box<dyn ZoneProvider>,
) -> Result<ZonesyncExitCode> {
    let audit_log = zonesync_core::audit::from_config(&config.audit_log).await?;
    let (reconciler, events) = Reconciler::new(provider, audit_log, &config)?;
    // Progress is logged by the reconciler itself
    drop(events);

    info!("Looking up zone for {}", cli.zone);
    let zone_id = reconciler.resolve_zone(&cli.zone).await?;
    info!("Fetching live config for zone {}", zone_id);
    let mut remote = reconciler.fetch_remote(&zone_id).await?;

    let Some(source) = cli.push.as_deref() else {
        normalize(&mut remote);
        println!("{}", remote.to_xml(reconciler.api_version(), true)?);
        return Ok(ZonesyncExitCode::Success);
    };

    let desired = RecordSet::from_versioned_xml(&read_document(source)?, reconciler.api_version())
        .with_context(|| format!("Reading desired record sets from {}", source))?;

    let Some(plan) = reconciler.plan(remote, desired, cli.comment.clone())? else {
        println!("No changes found; exiting");
        return Ok(ZonesyncExitCode::Success);
    };

    println!("==CHANGESET==");
    println!("{}", plan.batch.to_xml(reconciler.api_version(), true)?);

    if !plan.is_valid() {
        println!("changeset invalid. errors:");
        for violation in &plan.violations {
            println!("{}", violation);
        }
        println!("exiting");
        return Ok(ZonesyncExitCode::InvalidChangeset);
    }

    if !cli.confirmed() && !prompt_confirmation()? {
        println!("Confirmation failed; exiting");
        return Ok(ZonesyncExitCode::Success);
    }

    let change = reconciler.submit(&zone_id, &cli.zone, &plan).await?;
    reconciler.flush().await?;
    println!("Change {} is {}", change.short_id(), change.status);

    Ok(ZonesyncExitCode::Success)
}

/// Read the desired document from a file or stdin (`-`)
fn read_document(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Reading stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Reading {}", source))
    }
}

fn prompt_confirmation() -> Result<bool> {
    print!("Push y/N? ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}
