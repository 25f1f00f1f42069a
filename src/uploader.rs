//! Batched upload engine with per-entry fault tolerance.
//!
//! Records are partitioned into contiguous batches; within a batch every
//! write is dispatched concurrently and its outcome tallied independently.
//! A batch is not atomic: one record's failure never blocks or rolls back
//! siblings, in the same batch or later ones.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use tracing::{debug, error, info, instrument};

use crate::domain::{EssentialsIndex, Problem, ESSENTIALS_KEY};
use crate::kv::KeyValueStore;

/// Tally of one upload phase. Failed keys are kept verbatim so an operator
/// can retry them out-of-band.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadOutcome {
  pub success: u64,
  pub failed: u64,
  pub failed_keys: Vec<String>,
}

impl UploadOutcome {
  pub fn merge(&mut self, other: UploadOutcome) {
    self.success += other.success;
    self.failed += other.failed;
    self.failed_keys.extend(other.failed_keys);
  }
}

pub struct BatchUploader<S> {
  store: S,
  batch_size: usize,
  attempted: AtomicU64,
}

impl<S: KeyValueStore> BatchUploader<S> {
  pub fn new(store: S, batch_size: usize) -> Self {
    Self { store, batch_size: batch_size.max(1), attempted: AtomicU64::new(0) }
  }

  /// Monotonically increasing count of write attempts. Liveness signal for
  /// long runs; not part of the success/failure accounting.
  pub fn attempted(&self) -> u64 {
    self.attempted.load(Ordering::Relaxed)
  }

  /// Write one entry and report the outcome as data. Serialization trouble
  /// counts as a failed key, not a crash.
  async fn write_entry(&self, key: String, value: Result<Vec<u8>, String>) -> (String, Result<(), String>) {
    self.attempted.fetch_add(1, Ordering::Relaxed);
    let result = match value {
      Ok(bytes) => self.store.put(&key, &bytes).await,
      Err(cause) => Err(cause),
    };
    (key, result)
  }

  fn tally(&self, outcome: &mut UploadOutcome, results: Vec<(String, Result<(), String>)>) {
    for (key, result) in results {
      match result {
        Ok(()) => outcome.success += 1,
        Err(cause) => {
          error!(target: "kv_upload", %key, %cause, "Write failed");
          outcome.failed += 1;
          outcome.failed_keys.push(key);
        }
      }
    }
  }

  /// Upload every problem as an independent `problem:<id>` entry, batch by
  /// batch in input order. The last batch may be smaller.
  #[instrument(level = "info", skip(self, problems), fields(total = problems.len(), batch_size = self.batch_size))]
  pub async fn upload_problems(&self, problems: &[Problem]) -> UploadOutcome {
    let mut outcome = UploadOutcome::default();
    for batch in problems.chunks(self.batch_size) {
      let writes = batch.iter().map(|problem| {
        let value = serde_json::to_vec(problem).map_err(|e| format!("serialization failed: {e}"));
        self.write_entry(problem.storage_key(), value)
      });
      let results = join_all(writes).await;
      self.tally(&mut outcome, results);
      debug!(
        target: "kv_upload",
        attempted = self.attempted(),
        success = outcome.success,
        failed = outcome.failed,
        "Batch complete"
      );
    }
    info!(
      target: "kv_upload",
      success = outcome.success,
      failed = outcome.failed,
      "Problem entries uploaded"
    );
    outcome
  }

  /// Upload the essentials index as one additional independent write.
  #[instrument(level = "info", skip(self, index), fields(count = index.count))]
  pub async fn upload_essentials(&self, index: &EssentialsIndex) -> UploadOutcome {
    let mut outcome = UploadOutcome::default();
    let value = serde_json::to_vec(index).map_err(|e| format!("serialization failed: {e}"));
    let result = vec![self.write_entry(ESSENTIALS_KEY.to_string(), value).await];
    self.tally(&mut outcome, result);
    outcome
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ProblemMetadata;
  use crate::essentials::build_essentials;
  use crate::kv::testing::MockStore;

  fn problems(ids: &[u64]) -> Vec<Problem> {
    ids
      .iter()
      .map(|&id| Problem {
        id,
        difficulty: "Easy".into(),
        title: format!("Problem {id}"),
        title_slug: String::new(),
        url: String::new(),
        description: String::new(),
        solution_code: Default::default(),
        metadata: ProblemMetadata::default(),
      })
      .collect()
  }

  #[test]
  fn five_records_with_batch_size_two_form_three_batches() {
    let set = problems(&[1, 2, 3, 4, 5]);
    let sizes: Vec<usize> = set.chunks(2).map(|batch| batch.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
  }

  #[tokio::test]
  async fn all_writes_succeed_and_are_stored() {
    let store = MockStore::default();
    let uploader = BatchUploader::new(store.clone(), 2);
    let outcome = uploader.upload_problems(&problems(&[1931, 1932, 1933])).await;

    assert_eq!(outcome.success, 3);
    assert_eq!(outcome.failed, 0);
    assert_eq!(uploader.attempted(), 3);
    assert_eq!(store.stored_keys(), vec!["problem:1931", "problem:1932", "problem:1933"]);
  }

  #[tokio::test]
  async fn one_failure_is_tallied_without_aborting_the_run() {
    let store = MockStore::failing_on(["problem:3"]);
    let uploader = BatchUploader::new(store.clone(), 2);
    let outcome = uploader.upload_problems(&problems(&[1, 2, 3, 4, 5])).await;

    assert_eq!(outcome.success, 4);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.failed_keys, vec!["problem:3"]);
    assert_eq!(uploader.attempted(), 5, "every record is attempted exactly once");
    // Records after the failure were still written.
    assert!(store.stored("problem:4").is_some());
    assert!(store.stored("problem:5").is_some());
  }

  #[tokio::test]
  async fn reupload_with_same_id_overwrites_the_prior_value() {
    let store = MockStore::default();
    let uploader = BatchUploader::new(store.clone(), 10);
    let set = problems(&[1931]);

    uploader.upload_problems(&set).await;
    let first = store.stored("problem:1931").unwrap();
    uploader.upload_problems(&set).await;
    let second = store.stored("problem:1931").unwrap();

    assert_eq!(first, second, "last-write-wins with identical bytes");
    assert_eq!(store.stored_keys().len(), 1, "no duplication or accumulation");
  }

  #[tokio::test]
  async fn essentials_entry_is_one_independent_write() {
    let store = MockStore::default();
    let uploader = BatchUploader::new(store.clone(), 2);
    let set = problems(&[2000, 1931]);

    let mut index = build_essentials(&set);
    index.last_updated = Some("1733000000".into());
    let outcome = uploader.upload_essentials(&index).await;

    assert_eq!(outcome.success, 1);
    let bytes = store.stored(ESSENTIALS_KEY).unwrap();
    let json = String::from_utf8(bytes).unwrap();
    assert!(json.contains("\"count\":2"));
    assert!(json.contains("\"last_updated\":\"1733000000\""));
  }

  #[tokio::test]
  async fn essentials_failure_is_tallied_like_any_other() {
    let store = MockStore::failing_on([ESSENTIALS_KEY]);
    let uploader = BatchUploader::new(store, 2);
    let outcome = uploader.upload_essentials(&build_essentials(&problems(&[1931]))).await;
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.failed_keys, vec![ESSENTIALS_KEY.to_string()]);
  }
}
