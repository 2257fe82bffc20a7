//! reshelf CLI: drive the classify, execute, verify, and report phases.
//!
//! Phases communicate only through the persisted manifest, so each
//! subcommand is independent: `analyze` writes the manifest, the other
//! three read it (from a local path or, with a cloud feature enabled, a
//! remote URI).

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reshelf_core::config::ReshelfConfig;
use reshelf_core::Manifest;
use reshelf_engine::{classify, execute, report, verify};
use reshelf_io::{read_manifest_file, write_manifest_file};
use reshelf_store::{build_store_from_config, source_identity, BlobStore};

#[derive(Parser)]
#[command(name = "reshelf")]
#[command(about = "Manifest-driven reorganizer for blob-store prefixes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Store connection overrides shared by every phase that touches the store.
/// Values not given here fall back to `RESHELF_*` environment variables.
#[derive(Args, Debug, Clone)]
struct StoreArgs {
    /// Store URI (e.g. s3://bucket, file:///data); overrides RESHELF_STORE_URI
    #[arg(long)]
    store_uri: Option<String>,

    /// AWS region for S3 stores
    #[arg(long)]
    aws_region: Option<String>,

    /// AWS access key id
    #[arg(long)]
    aws_access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(long)]
    aws_secret_access_key: Option<String>,

    /// AWS session token
    #[arg(long)]
    aws_session_token: Option<String>,

    /// Path to GCS service account JSON
    #[arg(long)]
    gcs_service_account: Option<String>,

    /// Azure storage access key
    #[arg(long)]
    azure_access_key: Option<String>,

    /// Override per-call retry max attempts
    #[arg(long)]
    retry_max: Option<usize>,

    /// Override per-call retry initial backoff (ms)
    #[arg(long)]
    retry_initial_ms: Option<u64>,

    /// Override per-call retry max backoff (ms)
    #[arg(long)]
    retry_max_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a source prefix and write the action manifest
    Analyze {
        /// Source to scan (e.g. s3://bucket/prefix, file:///data/inbox)
        #[arg(short, long)]
        source: String,

        /// Where to write the manifest (local path)
        #[arg(long)]
        manifest_out: PathBuf,

        /// Classification pool width (overrides config)
        #[arg(long)]
        workers: Option<usize>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Replay the manifest's MOVE records against the store
    Execute {
        /// Manifest location (local path or remote URI)
        #[arg(short, long)]
        manifest: String,

        /// Execution pool width (overrides config)
        #[arg(long)]
        workers: Option<usize>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Audit the live store against the manifest
    Verify {
        /// Manifest location (local path or remote URI)
        #[arg(short, long)]
        manifest: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Derive duplicate and collision reports from the manifest alone
    Report {
        /// Manifest location (local path or remote URI)
        #[arg(short, long)]
        manifest: String,

        /// Directory for report files
        #[arg(long)]
        report_dir: PathBuf,

        #[command(flatten)]
        store: StoreArgs,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            source,
            manifest_out,
            workers,
            store,
        } => {
            if let Err(e) = run_analyze(&source, &manifest_out, workers, &store) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Execute {
            manifest,
            workers,
            store,
        } => {
            if let Err(e) = run_execute(&manifest, workers, &store) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Verify { manifest, store } => match run_verify(&manifest, &store) {
            Ok(true) => println!("Verification PASSED"),
            Ok(false) => {
                println!("Verification FAILED");
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Report {
            manifest,
            report_dir,
            store,
        } => {
            if let Err(e) = run_report(&manifest, &report_dir, &store) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn config_with_overrides(store: &StoreArgs) -> ReshelfConfig {
    let mut cfg = ReshelfConfig::from_env();
    if let Some(uri) = &store.store_uri {
        cfg.store_uri = Some(uri.clone());
    }
    if let Some(region) = &store.aws_region {
        cfg.aws_region = Some(region.clone());
    }
    if let Some(access_key) = &store.aws_access_key_id {
        cfg.aws_access_key_id = Some(access_key.clone());
    }
    if let Some(secret_key) = &store.aws_secret_access_key {
        cfg.aws_secret_access_key = Some(secret_key.clone());
    }
    if let Some(token) = &store.aws_session_token {
        cfg.aws_session_token = Some(token.clone());
    }
    if let Some(sa_path) = &store.gcs_service_account {
        cfg.gcs_service_account_path = Some(sa_path.clone());
    }
    if let Some(azure_key) = &store.azure_access_key {
        cfg.azure_access_key = Some(azure_key.clone());
    }
    if let Some(max) = store.retry_max {
        cfg.retry_max_retries = max;
    }
    if let Some(initial) = store.retry_initial_ms {
        cfg.retry_initial_backoff_ms = initial;
    }
    if let Some(max_backoff) = store.retry_max_ms {
        cfg.retry_max_backoff_ms = max_backoff;
    }
    cfg
}

fn open_store(cfg: &ReshelfConfig) -> Result<Box<dyn BlobStore>, reshelf_store::Error> {
    if cfg.store_uri.is_none() {
        return Err(reshelf_store::Error::Config(
            "store URI required (--store-uri or RESHELF_STORE_URI)".into(),
        ));
    }
    build_store_from_config(&cfg.store_config())
}

/// Load a manifest from a local path or, when the location carries a
/// non-file scheme, from the configured remote store.
fn load_manifest(location: &str, base_cfg: &ReshelfConfig) -> Result<Manifest, Box<dyn std::error::Error>> {
    match location.split_once("://") {
        Some(("file", rest)) => {
            let path = if rest.starts_with('/') {
                rest.to_string()
            } else {
                format!("/{rest}")
            };
            Ok(read_manifest_file(Path::new(&path))?)
        }
        Some(_) => {
            let mut cfg = base_cfg.clone();
            cfg.store_uri = Some(location.to_string());
            let store_cfg = cfg.store_config();
            let store = build_store_from_config(&store_cfg)?;
            let id = source_identity(&store_cfg)?;
            let key = id.prefix;
            let meta = store
                .head(&key)?
                .ok_or_else(|| reshelf_store::Error::NotFound(key.clone()))?;
            let bytes = store.read_range(&key, 0, meta.size as usize)?;
            tracing::info!(location, bytes = bytes.len(), "fetched remote manifest");
            Ok(reshelf_io::decode_manifest(bytes)?)
        }
        None => Ok(read_manifest_file(Path::new(location))?),
    }
}

fn run_analyze(
    source: &str,
    manifest_out: &Path,
    workers: Option<usize>,
    store_args: &StoreArgs,
) -> CliResult {
    let mut cfg = config_with_overrides(store_args);
    cfg.store_uri = Some(source.to_string());
    if let Some(workers) = workers {
        cfg.classify_workers = workers;
    }

    let store_cfg = cfg.store_config();
    let store = build_store_from_config(&store_cfg)?;
    let id = source_identity(&store_cfg)?;

    match classify(store.as_ref(), &id.container, &id.prefix, &cfg)? {
        Some(manifest) => {
            write_manifest_file(&manifest, manifest_out)?;
            let errors = manifest.len() - manifest.moves().count();
            println!("✓ Wrote manifest: {}", manifest_out.display());
            println!("  Records: {} ({} errors)", manifest.len(), errors);
            Ok(())
        }
        None => {
            println!("No objects found under '{source}'; no manifest written");
            Ok(())
        }
    }
}

fn run_execute(manifest_loc: &str, workers: Option<usize>, store_args: &StoreArgs) -> CliResult {
    let mut cfg = config_with_overrides(store_args);
    if let Some(workers) = workers {
        cfg.execute_workers = workers;
    }

    let manifest = load_manifest(manifest_loc, &cfg)?;
    let store = open_store(&cfg)?;

    let outcomes = execute(store.as_ref(), &manifest, cfg.execute_workers);
    let mut success = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;
    for outcome in &outcomes {
        println!("{outcome}");
        if outcome.starts_with("SUCCESS") {
            success += 1;
        } else if outcome.starts_with("SKIPPED") {
            skipped += 1;
        } else {
            failed += 1;
        }
    }
    println!(
        "✓ Execution finished: {} moved, {} failed, {} skipped",
        success, failed, skipped
    );
    Ok(())
}

fn run_verify(manifest_loc: &str, store_args: &StoreArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let cfg = config_with_overrides(store_args);
    let manifest = load_manifest(manifest_loc, &cfg)?;
    let store = open_store(&cfg)?;

    let summary = verify(store.as_ref(), &manifest);
    if summary.is_empty() {
        println!("Nothing to verify");
        return Ok(true);
    }
    for line in &summary.lines {
        println!("{line}");
    }
    println!("{} ok, {} failed", summary.ok_count, summary.failed_count);
    Ok(summary.passed())
}

fn run_report(manifest_loc: &str, report_dir: &Path, store_args: &StoreArgs) -> CliResult {
    let cfg = config_with_overrides(store_args);
    let manifest = load_manifest(manifest_loc, &cfg)?;

    let reorg = report(&manifest);
    if reorg.is_empty() {
        println!("No duplicates or collisions found; no report files written");
        return Ok(());
    }
    reorg.write_to(report_dir)?;
    println!(
        "✓ Reports written to {}: {} duplicate groups, {} collisions",
        report_dir.display(),
        reorg.duplicates.len(),
        reorg.collisions.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_store_args() -> StoreArgs {
        StoreArgs {
            store_uri: None,
            aws_region: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            gcs_service_account: None,
            azure_access_key: None,
            retry_max: None,
            retry_initial_ms: None,
            retry_max_ms: None,
        }
    }

    #[test]
    fn cli_flags_override_env_defaults() {
        let mut args = empty_store_args();
        args.store_uri = Some("s3://bucket/prefix".into());
        args.aws_region = Some("us-east-1".into());
        args.retry_max = Some(7);

        let cfg = config_with_overrides(&args);
        assert_eq!(cfg.store_uri.as_deref(), Some("s3://bucket/prefix"));
        assert_eq!(cfg.aws_region.as_deref(), Some("us-east-1"));
        assert_eq!(cfg.retry_max_retries, 7);
    }

    #[test]
    fn missing_store_uri_is_a_config_error() {
        let cfg = ReshelfConfig::default();
        let err = open_store(&cfg).err().expect("should fail");
        assert!(err.to_string().contains("store URI required"));
    }
}
