//! Domain models: the canonical problem record and the essentials index.
//!
//! Wire format notes:
//! - values are compact JSON with raw (unescaped) Unicode
//! - `solutionCode` is omitted entirely when no language supplied code
//! - unrecognized source columns are flattened into the metadata object

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key of the single index entry summarizing all problems.
pub const ESSENTIALS_KEY: &str = "essentials";

/// One coding-interview problem, fully normalized. Either every required
/// field resolved during parsing or the record was dropped; there is no
/// partially-filled state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
  pub id: u64,
  #[serde(default)] pub difficulty: String,
  #[serde(default)] pub title: String,
  #[serde(rename = "titleSlug", default)] pub title_slug: String,
  #[serde(default)] pub url: String,
  #[serde(default)] pub description: String,

  /// Language name -> solution source text. Present only for languages the
  /// raw source supplied non-empty code for.
  #[serde(rename = "solutionCode", default, skip_serializing_if = "BTreeMap::is_empty")]
  pub solution_code: BTreeMap<String, String>,

  pub metadata: ProblemMetadata,
}

impl Problem {
  /// Storage key for this record.
  pub fn storage_key(&self) -> String {
    format!("problem:{}", self.id)
  }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProblemMetadata {
  #[serde(default)] pub category: String,
  #[serde(default)] pub topics: Vec<String>,
  #[serde(default)] pub hints: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub acceptance_rate: Option<f64>,
  #[serde(default)] pub likes: u64,
  #[serde(default)] pub dislikes: u64,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub similar_questions: Vec<String>,

  /// Catch-all for unanticipated source columns (tabular input only).
  /// Flattened so extra keys sit directly in the metadata object.
  #[serde(flatten)]
  pub extra: BTreeMap<String, String>,
}

/// Five-field projection of a problem used by list views.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EssentialSummary {
  pub id: u64,
  pub title: String,
  pub difficulty: String,
  pub category: String,
  pub topics: Vec<String>,
}

/// Compact summary of all problems, rebuilt from scratch every run and
/// uploaded last under [`ESSENTIALS_KEY`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EssentialsIndex {
  pub problems: Vec<EssentialSummary>,
  pub count: usize,
  /// Unix-seconds string, stamped by the driver at upload time.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_updated: Option<String>,
}
