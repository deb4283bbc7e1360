//! bak: an S3-compatible bucket as a pseudo-filesystem
//!
//! Commands:
//!   upload <local> [<remote>] [--encrypt]  - store a file, optionally sealed client-side
//!   download <remote> [<local>]            - fetch a file, opening envelopes transparently
//!   delete <remote> [--force]              - remove an object (asks first unless forced)
//!   ls [<prefix>] [--long]                 - list objects under a prefix
//!   config set | config show               - manage ~/.bak/config.toml

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bak_core::config::{default_config_path, BakConfig};
use bak_storage::{Gateway, ProgressFn};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "bak",
    version,
    about = "Secure cloud storage from the command line",
    long_about = "bak lets you use an S3-compatible bucket like a filesystem, \
                  with optional client-side encryption of file contents"
)]
struct Cli {
    /// Path to the configuration file (default: ~/.bak/config.toml)
    #[arg(long, short = 'c', env = "BAK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "BAK_LOG", default_value = "warn", global = true)]
    log: String,

    /// Log format
    #[arg(long, env = "BAK_LOG_FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a local file, optionally encrypting it first
    Upload {
        /// Local file to upload
        local: PathBuf,
        /// Remote object key (default: the local file name)
        remote: Option<String>,
        /// Encrypt the file before uploading
        #[arg(long, short = 'e')]
        encrypt: bool,
    },

    /// Download a file, decrypting it if it was uploaded encrypted
    Download {
        /// Remote object key
        remote: String,
        /// Local destination (default: last segment of the key)
        local: Option<PathBuf>,
    },

    /// Delete a file from storage
    Delete {
        /// Remote object key
        remote: String,
        /// Delete without asking for confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// List files under a prefix
    Ls {
        /// Key prefix (default: whole bucket)
        path: Option<String>,
        /// Show size and last-modified time
        #[arg(long, short = 'l')]
        long: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Interactively set endpoint, credentials and bucket
    Set,
    /// Print the effective configuration (secrets redacted)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log, &cli.log_format);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = BakConfig::load(&config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;
    tracing::debug!(
        config = %config_path.display(),
        endpoint = %config.storage.endpoint,
        bucket = %config.storage.bucket,
        "config loaded"
    );

    match cli.command {
        Commands::Upload {
            local,
            remote,
            encrypt,
        } => cmd_upload(&config, &local, remote.as_deref(), encrypt).await,
        Commands::Download { remote, local } => {
            cmd_download(&config, &remote, local.as_deref()).await
        }
        Commands::Delete { remote, force } => cmd_delete(&config, &remote, force).await,
        Commands::Ls { path, long } => cmd_ls(&config, path.as_deref().unwrap_or(""), long).await,
        Commands::Config {
            action: ConfigAction::Set,
        } => cmd_config_set(&config_path),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stderr only: stdout carries command output (ls, config show)
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Gateway from config ───────────────────────────────────────────────────────

/// Validate config and build the gateway. No remote call happens here.
fn open_gateway(config: &BakConfig) -> Result<Gateway> {
    let op = bak_storage::build_from_core_config(&config.storage)
        .context("building storage operator")?;
    Ok(Gateway::new(op))
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{prefix:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=>-");
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn progress_observer(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Box::new(move |done, total, msg| {
        pb.set_length(total);
        pb.set_position(done);
        pb.set_message(msg.to_string());
    })
}

// ── `bak upload` ──────────────────────────────────────────────────────────────

async fn cmd_upload(
    config: &BakConfig,
    local: &Path,
    remote: Option<&str>,
    encrypt: bool,
) -> Result<()> {
    let gateway = open_gateway(config)?;

    if !local.is_file() {
        anyhow::bail!("not a file: {}", local.display());
    }
    let remote_path = match remote {
        Some(r) => r.to_string(),
        None => bak_transfer::default_remote_key(local)
            .with_context(|| format!("cannot derive a remote key from {}", local.display()))?,
    };

    let secret = if encrypt {
        println!("Encrypting {}...", local.display());
        Some(
            config
                .storage
                .secret_material()
                .context("encryption requested but no secret key is configured")?,
        )
    } else {
        None
    };

    let pb = make_progress_bar("upload");
    let progress = progress_observer(&pb);
    let result = bak_transfer::store_file(
        &gateway,
        local,
        &remote_path,
        secret.as_ref(),
        Some(&progress),
    )
    .await;
    pb.finish_and_clear();

    let result = result.with_context(|| format!("uploading {}", local.display()))?;

    println!(
        "Successfully uploaded {} to {} ({}{})",
        local.display(),
        result.remote_path,
        fmt_bytes(result.bytes_read),
        if result.encrypted { ", encrypted" } else { "" }
    );
    Ok(())
}

// ── `bak download` ────────────────────────────────────────────────────────────

async fn cmd_download(config: &BakConfig, remote: &str, local: Option<&Path>) -> Result<()> {
    let gateway = open_gateway(config)?;
    let local_path = local
        .map(Path::to_path_buf)
        .unwrap_or_else(|| bak_transfer::default_local_path(remote));
    let secret = config.storage.secret_material();

    let pb = make_progress_bar("download");
    let progress = progress_observer(&pb);
    let result = bak_transfer::retrieve_file(
        &gateway,
        remote,
        &local_path,
        secret.as_ref(),
        Some(&progress),
    )
    .await;
    pb.finish_and_clear();

    let result = result.with_context(|| format!("downloading {remote}"))?;

    if result.decrypted {
        println!("Decrypted {remote}");
    }
    println!(
        "Successfully downloaded {} to {} ({})",
        remote,
        result.local_path.display(),
        fmt_bytes(result.bytes)
    );
    Ok(())
}

// ── `bak delete` ──────────────────────────────────────────────────────────────

async fn cmd_delete(config: &BakConfig, remote: &str, force: bool) -> Result<()> {
    let gateway = open_gateway(config)?;

    if !force {
        let answer = prompt(&format!("Are you sure you want to delete {remote}? [y/N]: "))?;
        if !confirmed(&answer) {
            println!("Operation cancelled");
            return Ok(());
        }
    }

    bak_transfer::delete_object(&gateway, remote)
        .await
        .with_context(|| format!("deleting {remote}"))?;

    println!("Successfully deleted {remote}");
    Ok(())
}

fn confirmed(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y")
}

// ── `bak ls` ──────────────────────────────────────────────────────────────────

async fn cmd_ls(config: &BakConfig, prefix: &str, long: bool) -> Result<()> {
    let gateway = open_gateway(config)?;

    let objects = bak_transfer::list_objects(&gateway, prefix)
        .await
        .with_context(|| format!("listing '{prefix}'"))?;

    for obj in &objects {
        if long {
            println!(
                "{:>10} {:<30} {}",
                obj.size,
                obj.last_modified.as_deref().unwrap_or("-"),
                obj.key
            );
        } else {
            println!("{}", obj.key);
        }
    }
    Ok(())
}

// ── `bak config` ──────────────────────────────────────────────────────────────

fn cmd_config_set(config_path: &Path) -> Result<()> {
    // Start from the file only, so environment overrides are not persisted
    let mut config = BakConfig::load_file(config_path)
        .with_context(|| format!("reading config: {}", config_path.display()))?;
    let storage = &mut config.storage;

    storage.endpoint = prompt_default("Enter S3 endpoint URL", &storage.endpoint)?;
    storage.access_key = prompt_default("Enter access key", &storage.access_key)?;

    let secret =
        rpassword::prompt_password("Enter secret key (input hidden, empty keeps current): ")
            .context("reading secret key")?;
    if !secret.is_empty() {
        storage.secret_key = secret;
    }

    storage.bucket = prompt_default("Enter default bucket", &storage.bucket)?;

    config
        .save(config_path)
        .with_context(|| format!("writing config: {}", config_path.display()))?;

    println!("Configuration saved to {}", config_path.display());
    Ok(())
}

fn cmd_config_show(config: &BakConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!(
            "# Configuration: defaults (no file at {})",
            config_path.display()
        );
    }
    println!();

    let mut shown = config.clone();
    if !shown.storage.secret_key.is_empty() {
        shown.storage.secret_key = "[REDACTED]".into();
    }
    let rendered = toml::to_string_pretty(&shown).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    std::io::stdout().flush().context("flushing stdout")?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("reading from stdin")?;
    Ok(line.trim().to_string())
}

/// Prompt with the current value shown; an empty answer keeps it.
fn prompt_default(label: &str, current: &str) -> Result<String> {
    let answer = if current.is_empty() {
        prompt(&format!("{label}: "))?
    } else {
        prompt(&format!("{label} [{current}]: "))?
    };
    Ok(if answer.is_empty() {
        current.to_string()
    } else {
        answer
    })
}

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
