//! Offline bulk export: the same entries an upload run would write, saved to
//! a local JSON file for wrangler-style bulk workflows instead.

use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::{Problem, ESSENTIALS_KEY};
use crate::error::Result;
use crate::essentials::build_essentials;

/// One key/value pair in the bulk file. The value is the already-serialized
/// compact JSON string, exactly what a live run would PUT.
#[derive(Serialize)]
struct BulkEntry {
  key: String,
  value: String,
}

/// Write the full entry list — one per problem, essentials last unless
/// skipped — and return how many entries were written. The essentials entry
/// is left unstamped: `last_updated` marks upload time, and an export is not
/// an upload.
#[instrument(level = "info", skip(problems), fields(path = %path.as_ref().display(), total = problems.len()))]
pub fn write_bulk_export(
  path: impl AsRef<Path>,
  problems: &[Problem],
  skip_essentials: bool,
) -> Result<u64> {
  let mut entries = Vec::with_capacity(problems.len() + 1);
  for problem in problems {
    entries.push(BulkEntry {
      key: problem.storage_key(),
      value: serde_json::to_string(problem)?,
    });
  }
  if !skip_essentials {
    let index = build_essentials(problems);
    entries.push(BulkEntry { key: ESSENTIALS_KEY.to_string(), value: serde_json::to_string(&index)? });
  }

  std::fs::write(path.as_ref(), serde_json::to_vec(&entries)?)?;
  let count = entries.len() as u64;
  info!(target: "kv_upload", count, "Wrote bulk export file");
  Ok(count)
}
