//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use tenant_sweep::core::config::Config;
use tenant_sweep::core::errors::TswError;
use tenant_sweep::prelude::{
    ExclusionSet, ReportStyle, ScanCoordinator, ScanOptions, Scope, load_tenants,
};

/// tenant_sweep: network-wide substring sweep for multi-tenant installs.
#[derive(Debug, Parser)]
#[command(
    name = "tsw",
    author,
    version,
    about = "tenant_sweep - network-wide content search diagnostic",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors and summary only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Sweep every tenant for a literal substring.
    Sweep(SweepArgs),
    /// List the tenant registry.
    Tenants(TenantsArgs),
    /// View and validate configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
#[command(group(
    ArgGroup::new("scope")
        .required(false)
        .multiple(false)
        .args(["posts_only", "meta_only", "options_only"])
))]
struct SweepArgs {
    /// Literal substring to search for (not a regex, not a query).
    #[arg(value_name = "TERM")]
    term: String,
    /// Database path (overrides config).
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Shared table-name prefix (overrides config).
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,
    /// Search content tables only.
    #[arg(long)]
    posts_only: bool,
    /// Search metadata tables only.
    #[arg(long)]
    meta_only: bool,
    /// Search configuration tables only.
    #[arg(long)]
    options_only: bool,
    /// Match case-sensitively.
    #[arg(long)]
    case_sensitive: bool,
    /// Restrict content matches to published items.
    #[arg(long)]
    published_only: bool,
    /// Skip revision rows in content tables.
    #[arg(long)]
    exclude_revisions: bool,
    /// Additional exclusion pattern (repeatable; `*` and `?` wildcards).
    #[arg(long = "exclude", value_name = "PATTERN")]
    excludes: Vec<String>,
    /// One line per matching tenant, no per-match detail.
    #[arg(long)]
    summary: bool,
}

#[derive(Debug, Clone, Args)]
struct TenantsArgs {
    /// Database path (overrides config).
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Shared table-name prefix (overrides config).
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure (connectivity, missing files).
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<TswError> for CliError {
    fn from(err: TswError) -> Self {
        match err {
            TswError::InvalidConfig { .. }
            | TswError::MissingConfig { .. }
            | TswError::ConfigParse { .. }
            | TswError::InvalidPattern { .. } => Self::User(err.to_string()),
            TswError::Connection { .. } | TswError::TableProbe { .. } => Self::Runtime(format!(
                "{err}\n  hint: check the database path and that the schema is reachable"
            )),
            TswError::Serialization { .. } => Self::Internal(err.to_string()),
            _ => Self::Runtime(err.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Sweep(args) => run_sweep(cli, args),
        Command::Tenants(args) => run_tenants(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

/// Open the shared schema read-only. This tool never writes.
fn open_connection(path: &std::path::Path) -> Result<rusqlite::Connection, CliError> {
    rusqlite::Connection::open_with_flags(
        path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| {
        CliError::from(TswError::Connection {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    })
}

fn run_sweep(cli: &Cli, args: &SweepArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let db_path = args.db.clone().unwrap_or(config.database.path.clone());
    let prefix = args
        .prefix
        .clone()
        .unwrap_or_else(|| config.database.table_prefix.clone());

    let scope = Scope::from_flags(args.posts_only, args.meta_only, args.options_only)?;
    let exclusions = ExclusionSet::defaults()
        .with_user_patterns(&config.sweep.extra_exclusions)?
        .with_user_patterns(&args.excludes)?;
    let options = ScanOptions::new(
        args.term.clone(),
        scope,
        args.case_sensitive,
        args.published_only,
        args.exclude_revisions,
        exclusions,
    )?;

    let conn = open_connection(&db_path)?;
    let tenants = load_tenants(&conn, &prefix)?;

    let style = if output_mode(cli) == OutputMode::Json {
        ReportStyle::Json
    } else if args.summary {
        ReportStyle::Summary
    } else {
        ReportStyle::Detail
    };
    let progress_interval = if cli.quiet {
        0
    } else {
        config.sweep.progress_interval
    };

    if cli.verbose && style != ReportStyle::Json {
        eprintln!(
            "[TSW-SWEEP] scanning {} tenants in {} (prefix `{prefix}`)",
            tenants.len(),
            db_path.display()
        );
    }
    if style == ReportStyle::Detail && !cli.quiet {
        println!(
            "{}",
            format!("Sweeping {} tenants for \"{}\"...", tenants.len(), args.term).bold()
        );
        println!();
    }

    let coordinator = ScanCoordinator::new(&conn, &prefix, &options, style, progress_interval);
    let mut stdout = io::stdout().lock();
    coordinator.run(&tenants, &mut stdout)?;
    // Zero matches is still a successful run.
    Ok(())
}

fn run_tenants(cli: &Cli, args: &TenantsArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let db_path = args.db.clone().unwrap_or(config.database.path.clone());
    let prefix = args
        .prefix
        .clone()
        .unwrap_or_else(|| config.database.table_prefix.clone());

    let conn = open_connection(&db_path)?;
    let tenants = load_tenants(&conn, &prefix)?;

    match output_mode(cli) {
        OutputMode::Human => {
            println!("{}", format!("{} live tenants:", tenants.len()).bold());
            for tenant in &tenants {
                println!("  {:>6}  {}", tenant.id, tenant.label());
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "tenants",
                "count": tenants.len(),
                "tenants": tenants,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    let command = args.command.clone().unwrap_or(ConfigCommand::Show);
    match command {
        ConfigCommand::Path => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(Config::default_path);
            match output_mode(cli) {
                OutputMode::Human => println!("{}", path.display()),
                OutputMode::Json => write_json_line(&json!({
                    "command": "config path",
                    "path": path.to_string_lossy(),
                }))?,
            }
            Ok(())
        }
        ConfigCommand::Show => {
            let config = Config::load(cli.config.as_deref())?;
            match output_mode(cli) {
                OutputMode::Human => {
                    let rendered = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(e.to_string()))?;
                    print!("{rendered}");
                }
                OutputMode::Json => {
                    let payload = serde_json::to_value(&config)?;
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        ConfigCommand::Validate => {
            let config = Config::load(cli.config.as_deref())?;
            config.validate()?;
            match output_mode(cli) {
                OutputMode::Human => println!("configuration OK"),
                OutputMode::Json => write_json_line(&json!({
                    "command": "config validate",
                    "ok": true,
                }))?,
            }
            Ok(())
        }
    }
}
