//! Filter policy: which problem ids are eligible for storage.
//!
//! Deliberately isolated from parsing so the rule can be swapped or
//! re-parameterized without touching the normalizer. The policy is pure and
//! stateless; its numbers come from configuration, not code.

use std::collections::HashSet;

use crate::config::FilterConfig;

#[derive(Clone, Debug)]
pub struct FilterPolicy {
  include_ids: HashSet<u64>,
  min_id: u64,
}

impl FilterPolicy {
  pub fn new(include_ids: impl IntoIterator<Item = u64>, min_id: u64) -> Self {
    Self { include_ids: include_ids.into_iter().collect(), min_id }
  }

  /// True iff `id` should be parsed and uploaded.
  pub fn is_eligible(&self, id: u64) -> bool {
    self.include_ids.contains(&id) || id >= self.min_id
  }
}

impl Default for FilterPolicy {
  fn default() -> Self {
    Self::from(&FilterConfig::default())
  }
}

impl From<&FilterConfig> for FilterPolicy {
  fn from(cfg: &FilterConfig) -> Self {
    Self::new(cfg.include_ids.iter().copied(), cfg.min_id)
  }
}
