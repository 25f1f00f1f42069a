//! Pipeline driver: read → normalize+filter → batch-upload → essentials →
//! report.
//!
//! The source shape is decided by content, not file extension: a document
//! whose first non-whitespace byte opens a JSON value is treated as
//! structured, anything else streams as headered CSV. The extension stays a
//! convenience for humans only.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::domain::Problem;
use crate::error::{Error, Result};
use crate::essentials::build_essentials;
use crate::filter::FilterPolicy;
use crate::kv::KeyValueStore;
use crate::normalize::{parse_structured_problem, parse_tabular_row};
use crate::uploader::BatchUploader;

/// Everything the read phase learned: the valid records in input order plus
/// how many candidate rows were seen (the difference is dropped rows).
pub struct ParseSummary {
  pub problems: Vec<Problem>,
  pub rows_seen: u64,
}

/// Aggregate result of a full run, across the problem and essentials phases.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
  pub rows_seen: u64,
  pub parsed: u64,
  pub success: u64,
  pub failed: u64,
  pub failed_keys: Vec<String>,
}

impl RunReport {
  pub fn success_rate(&self) -> f64 {
    let total = self.success + self.failed;
    if total == 0 {
      0.0
    } else {
      self.success as f64 / total as f64 * 100.0
    }
  }

  /// True iff every attempted write landed.
  pub fn is_clean(&self) -> bool {
    self.failed == 0
  }
}

pub struct UploadOptions {
  pub batch_size: usize,
  pub skip_essentials: bool,
}

fn looks_structured(contents: &str) -> bool {
  matches!(contents.trim_start().as_bytes().first(), Some(b'{') | Some(b'['))
}

/// Read and normalize the input file, whichever shape it has. Fatal only
/// when the file itself is unreadable or a structured document is
/// undecodable; individual rows never abort the read.
#[instrument(level = "info", skip(policy), fields(path = %path.as_ref().display()))]
pub fn read_problems(path: impl AsRef<Path>, policy: &FilterPolicy) -> Result<ParseSummary> {
  let contents = std::fs::read_to_string(path.as_ref())?;
  if looks_structured(&contents) {
    parse_structured(&contents, policy)
  } else {
    parse_tabular(&contents, policy)
  }
}

fn parse_structured(contents: &str, policy: &FilterPolicy) -> Result<ParseSummary> {
  let document: Value = serde_json::from_str(contents)?;
  let raw = match &document {
    Value::Array(items) => items.as_slice(),
    Value::Object(map) => map
      .get("problems")
      .and_then(Value::as_array)
      .map(Vec::as_slice)
      .ok_or_else(|| {
        Error::InvalidInput(
          "structured input must be a list of problems or an object with a 'problems' key".into(),
        )
      })?,
    _ => {
      return Err(Error::InvalidInput(
        "structured input must be a list of problems or an object with a 'problems' key".into(),
      ))
    }
  };

  let mut problems = Vec::new();
  let mut rows_seen = 0u64;
  for value in raw {
    rows_seen += 1;
    if let Some(problem) = parse_structured_problem(value, policy) {
      problems.push(problem);
    }
  }
  info!(target: "kv_upload", rows_seen, parsed = problems.len(), "Parsed structured input");
  Ok(ParseSummary { problems, rows_seen })
}

fn parse_tabular(contents: &str, policy: &FilterPolicy) -> Result<ParseSummary> {
  let mut reader = csv::Reader::from_reader(contents.as_bytes());
  let mut problems = Vec::new();
  let mut rows_seen = 0u64;
  for record in reader.deserialize::<HashMap<String, String>>() {
    rows_seen += 1;
    let row = match record {
      Ok(row) => row,
      Err(e) => {
        warn!(target: "kv_upload", row = rows_seen, error = %e, "Skipping unreadable row");
        continue;
      }
    };
    if let Some(problem) = parse_tabular_row(&row, policy) {
      problems.push(problem);
    }
    if rows_seen % 1000 == 0 {
      info!(target: "kv_upload", rows_seen, "Processed rows...");
    }
  }
  info!(target: "kv_upload", rows_seen, parsed = problems.len(), "Parsed tabular input");
  Ok(ParseSummary { problems, rows_seen })
}

/// Upload every parsed problem, then (unless skipped) build the essentials
/// index, stamp it, and upload it as the final entry.
///
/// Zero valid records is a fatal precondition: nothing is written and no
/// partial essentials entry is ever attempted.
#[instrument(level = "info", skip(store, summary, opts), fields(parsed = summary.problems.len()))]
pub async fn run_upload<S: KeyValueStore>(
  store: S,
  summary: &ParseSummary,
  opts: &UploadOptions,
) -> Result<RunReport> {
  if summary.problems.is_empty() {
    return Err(Error::InvalidInput(
      "no problems matched the filter criteria; nothing to upload".into(),
    ));
  }

  let uploader = BatchUploader::new(store, opts.batch_size);
  let mut outcome = uploader.upload_problems(&summary.problems).await;

  if opts.skip_essentials {
    info!(target: "kv_upload", "Skipping essentials entry upload as requested");
  } else {
    let mut index = build_essentials(&summary.problems);
    index.last_updated = Some(Utc::now().timestamp().to_string());
    outcome.merge(uploader.upload_essentials(&index).await);
  }

  Ok(RunReport {
    rows_seen: summary.rows_seen,
    parsed: summary.problems.len() as u64,
    success: outcome.success,
    failed: outcome.failed,
    failed_keys: outcome.failed_keys,
  })
}
