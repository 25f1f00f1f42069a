//! cloudinterview-uploader · coding-interview problems → Cloudflare KV
//!
//! - Parses a CSV or JSON problems file into canonical records
//! - Uploads one `problem:<id>` entry per record plus an `essentials` index
//! - Individual write failures degrade the run instead of aborting it
//!
//! Important env variables:
//!   CF_ACCOUNT_ID      : Cloudflare account id
//!   CF_API_TOKEN       : API token with KV write permission
//!   CF_NAMESPACE_ID    : target KV namespace id
//!   KV_UPLOADER_CONFIG : path to TOML config (filter policy + tuning)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"
//!
//! Exit codes: 0 = every write landed; 2 = degraded completion (some writes
//! failed, keys listed for out-of-band retry); 1 = fatal error.

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod filter;
mod normalize;
mod essentials;
mod kv;
mod uploader;
mod pipeline;
mod export;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::config::load_config_from_env;
use crate::error::Error;
use crate::filter::FilterPolicy;
use crate::kv::KvStore;
use crate::pipeline::{read_problems, run_upload, ParseSummary, UploadOptions};

#[derive(Parser, Debug)]
#[command(name = "cloudinterview-uploader")]
#[command(about = "Upload coding-interview problems to Cloudflare KV")]
#[command(version)]
struct Args {
  /// Path to the CSV or JSON problems file
  file: PathBuf,

  /// Cloudflare account id
  #[arg(long, env = "CF_ACCOUNT_ID")]
  account_id: Option<String>,

  /// Cloudflare API token with KV write permission
  #[arg(long, env = "CF_API_TOKEN", hide_env_values = true)]
  api_token: Option<String>,

  /// Target KV namespace id
  #[arg(long, env = "CF_NAMESPACE_ID")]
  namespace_id: Option<String>,

  /// Records per upload batch (overrides the config file)
  #[arg(long)]
  batch_size: Option<usize>,

  /// Do not upload the essentials index entry
  #[arg(long)]
  skip_essentials: bool,

  /// Parse and validate only; never contact the store
  #[arg(long)]
  dry_run: bool,

  /// Write a bulk-upload JSON file to PATH instead of uploading
  #[arg(long, value_name = "PATH")]
  export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
  telemetry::init_tracing();
  let args = Args::parse();

  match run(args).await {
    Ok(code) => code,
    Err(e) => {
      tracing::error!(target: "kv_upload", error = %e, "Fatal error");
      ExitCode::from(1)
    }
  }
}

fn require(value: Option<String>, what: &str) -> Result<String, Error> {
  value.filter(|v| !v.is_empty()).ok_or_else(|| Error::Config(format!("missing {what}")))
}

async fn run(args: Args) -> Result<ExitCode, Error> {
  let cfg = load_config_from_env().unwrap_or_default();
  let policy = FilterPolicy::from(&cfg.filter);
  let batch_size = args.batch_size.unwrap_or(cfg.upload.batch_size);

  info!(target: "kv_upload", path = %args.file.display(), "Starting upload run");
  let summary = read_problems(&args.file, &policy)?;
  info!(
    target: "kv_upload",
    rows_seen = summary.rows_seen,
    parsed = summary.problems.len(),
    "Reading and parsing complete"
  );

  if args.dry_run {
    report_dry_run(&summary);
    return Ok(ExitCode::SUCCESS);
  }

  if let Some(path) = &args.export {
    let count = export::write_bulk_export(path, &summary.problems, args.skip_essentials)?;
    info!(target: "kv_upload", path = %path.display(), count, "Export complete; nothing uploaded");
    return Ok(ExitCode::SUCCESS);
  }

  let account_id = require(args.account_id, "--account-id / CF_ACCOUNT_ID")?;
  let api_token = require(args.api_token, "--api-token / CF_API_TOKEN")?;
  let namespace_id = require(args.namespace_id, "--namespace-id / CF_NAMESPACE_ID")?;

  let store = KvStore::new(
    &account_id,
    &namespace_id,
    &api_token,
    Duration::from_secs(cfg.upload.timeout_secs),
  )?;
  store.verify_access().await?;

  let opts = UploadOptions { batch_size, skip_essentials: args.skip_essentials };
  let report = run_upload(store, &summary, &opts).await?;

  info!(
    target: "kv_upload",
    rows_seen = report.rows_seen,
    parsed = report.parsed,
    success = report.success,
    failed = report.failed,
    success_rate = report.success_rate(),
    "Upload summary"
  );

  if report.is_clean() {
    info!(target: "kv_upload", "All uploads completed successfully");
    Ok(ExitCode::SUCCESS)
  } else {
    for key in &report.failed_keys {
      warn!(target: "kv_upload", %key, "Key still needs retrying");
    }
    warn!(target: "kv_upload", failed = report.failed, "Some uploads failed; retry the keys above");
    Ok(ExitCode::from(2))
  }
}

/// Dry-run report: what would be uploaded, with a small sample for eyeballing.
fn report_dry_run(summary: &ParseSummary) {
  for problem in summary.problems.iter().take(3) {
    info!(
      target: "kv_upload",
      id = problem.id,
      title = %problem.title,
      difficulty = %problem.difficulty,
      topics = ?problem.metadata.topics,
      "Sample record"
    );
  }
  info!(
    target: "kv_upload",
    rows_seen = summary.rows_seen,
    parsed = summary.problems.len(),
    dropped = summary.rows_seen - summary.problems.len() as u64,
    "Dry run complete; nothing uploaded"
  );
}
