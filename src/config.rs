//! Loading uploader configuration (filter policy + upload tuning) from TOML.
//!
//! See `UploaderConfig` for the expected schema. Every field has a default,
//! so a missing or partial file never blocks a run.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct UploaderConfig {
  #[serde(default)]
  pub filter: FilterConfig,
  #[serde(default)]
  pub upload: UploadTuning,
}

/// Which problem ids are eligible for storage. The defaults encode the
/// current re-upload window; override them in TOML rather than editing code.
#[derive(Clone, Debug, Deserialize)]
pub struct FilterConfig {
  /// Ids below `min_id` that are still eligible.
  #[serde(default = "default_include_ids")]
  pub include_ids: Vec<u64>,
  /// Every id at or above this value is eligible.
  #[serde(default = "default_min_id")]
  pub min_id: u64,
}

impl Default for FilterConfig {
  fn default() -> Self {
    Self { include_ids: default_include_ids(), min_id: default_min_id() }
  }
}

fn default_include_ids() -> Vec<u64> {
  vec![1262]
}

fn default_min_id() -> u64 {
  1931
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadTuning {
  /// Records per batch; the last batch may be smaller.
  #[serde(default = "default_batch_size")]
  pub batch_size: usize,
  /// Upper bound on any single write, in seconds.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for UploadTuning {
  fn default() -> Self {
    Self { batch_size: default_batch_size(), timeout_secs: default_timeout_secs() }
  }
}

fn default_batch_size() -> usize {
  50
}

fn default_timeout_secs() -> u64 {
  30
}

/// Attempt to load `UploaderConfig` from KV_UPLOADER_CONFIG. On any
/// parsing/IO error, returns None and the caller falls back to defaults.
pub fn load_config_from_env() -> Option<UploaderConfig> {
  let path = std::env::var("KV_UPLOADER_CONFIG").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<UploaderConfig>(&s) {
      Ok(cfg) => {
        info!(target: "kv_upload", %path, "Loaded uploader config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "kv_upload", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "kv_upload", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_encode_the_observed_reupload_window() {
    let cfg = UploaderConfig::default();
    assert_eq!(cfg.filter.include_ids, vec![1262]);
    assert_eq!(cfg.filter.min_id, 1931);
    assert_eq!(cfg.upload.batch_size, 50);
    assert_eq!(cfg.upload.timeout_secs, 30);
  }

  #[test]
  fn partial_toml_keeps_defaults_for_missing_fields() {
    let cfg: UploaderConfig = toml::from_str("[filter]\nmin_id = 100\n").unwrap();
    assert_eq!(cfg.filter.min_id, 100);
    assert_eq!(cfg.filter.include_ids, vec![1262]);
    assert_eq!(cfg.upload.batch_size, 50);
  }

  #[test]
  fn full_toml_overrides_everything() {
    let cfg: UploaderConfig = toml::from_str(
      "[filter]\ninclude_ids = [1, 2]\nmin_id = 10\n\n[upload]\nbatch_size = 5\ntimeout_secs = 3\n",
    )
    .unwrap();
    assert_eq!(cfg.filter.include_ids, vec![1, 2]);
    assert_eq!(cfg.filter.min_id, 10);
    assert_eq!(cfg.upload.batch_size, 5);
    assert_eq!(cfg.upload.timeout_secs, 3);
  }
}
