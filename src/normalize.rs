//! Record normalizer: one raw row in, one well-formed `Problem` out — or
//! `None`. Never a partially-filled record, never a panic, never an error.
//!
//! Two source variants share the id/filter gate:
//!   - tabular rows (string fields from a headered CSV)
//!   - structured objects (already-typed JSON values)
//!
//! Only the identifier is load-bearing. Everything else is best-effort:
//! malformed list literals degrade to empty sequences, malformed numbers to
//! defaults, and neither invalidates the row.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::domain::{Problem, ProblemMetadata};
use crate::filter::FilterPolicy;

/// Column carrying the stable external identifier.
const ID_COLUMN: &str = "frontendQuestionId";

/// Languages with dedicated `solution_code_{lang}` columns.
const SOLUTION_LANGUAGES: [&str; 3] = ["python", "java", "cpp"];

/// Columns handled by the recognized schema. Anything else with non-empty
/// text is folded into the metadata catch-all.
const RECOGNIZED_COLUMNS: [&str; 22] = [
  "difficulty",
  "frontendQuestionId",
  "paidOnly",
  "title",
  "titleSlug",
  "url",
  "description_url",
  "description",
  "solution_url",
  "solution",
  "solution_code_python",
  "solution_code_java",
  "solution_code_cpp",
  "solution_code_url",
  "category",
  "acceptance_rate",
  "topics",
  "hints",
  "likes",
  "dislikes",
  "similar_questions",
  "stats",
];

/// Parse an identifier that may arrive in float clothing (`"1.0"`).
/// Empty, non-numeric, non-finite and sub-1 values are all invalid.
fn parse_problem_id(raw: &str) -> Option<u64> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }
  let value = trimmed.parse::<f64>().ok()?;
  if !value.is_finite() || value < 1.0 {
    return None;
  }
  Some(value as u64)
}

/// Best-effort parse of a list-literal-like field (`["Array", "Hash Table"]`)
/// into trimmed, quote-stripped items. Degrades rather than fails: empty
/// input yields an empty vec, bracket-less text yields one bare item.
pub fn parse_list_literal(raw: &str) -> Vec<String> {
  let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
  inner
    .split(',')
    .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim())
    .filter(|item| !item.is_empty())
    .map(str::to_string)
    .collect()
}

/// Non-negative count with default 0 on anything unparsable.
fn parse_count(raw: &str) -> u64 {
  raw.trim().parse::<u64>().unwrap_or(0)
}

/// Percentage like `"45.5%"` (the suffix is optional). Absent on failure.
fn parse_acceptance_rate(raw: &str) -> Option<f64> {
  let trimmed = raw.trim().trim_end_matches('%').trim();
  if trimmed.is_empty() {
    return None;
  }
  trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize one tabular row. Returns `None` for a missing/unparsable id or
/// a filtered-out id; field-level trouble never drops the row.
pub fn parse_tabular_row(row: &HashMap<String, String>, policy: &FilterPolicy) -> Option<Problem> {
  let id = parse_problem_id(row.get(ID_COLUMN).map(String::as_str).unwrap_or(""))?;
  if !policy.is_eligible(id) {
    return None;
  }

  let text = |name: &str| row.get(name).map(|v| v.trim().to_string()).unwrap_or_default();

  let topics = parse_list_literal(&text("topics"));
  let hints = parse_list_literal(&text("hints"));
  let similar_questions = parse_list_literal(&text("similar_questions"));

  let mut solution_code = BTreeMap::new();
  for lang in SOLUTION_LANGUAGES {
    let column = format!("solution_code_{lang}");
    if let Some(code) = row.get(column.as_str()) {
      if !code.is_empty() {
        solution_code.insert(lang.to_string(), code.clone());
      }
    }
  }

  let mut extra = BTreeMap::new();
  for (column, value) in row {
    if RECOGNIZED_COLUMNS.contains(&column.as_str()) {
      continue;
    }
    let trimmed = value.trim();
    if !trimmed.is_empty() {
      extra.insert(column.clone(), trimmed.to_string());
    }
  }

  Some(Problem {
    id,
    difficulty: text("difficulty"),
    title: text("title"),
    title_slug: text("titleSlug"),
    url: text("url"),
    description: text("description"),
    solution_code,
    metadata: ProblemMetadata {
      category: text("category"),
      topics,
      hints,
      acceptance_rate: parse_acceptance_rate(&text("acceptance_rate")),
      likes: parse_count(&text("likes")),
      dislikes: parse_count(&text("dislikes")),
      similar_questions,
      extra,
    },
  })
}

/// Normalize one structured (already-typed) problem object. Looser than the
/// tabular path: only `questionId` is mandatory and filtered; `topics` and
/// `category` pass through typed as-is.
pub fn parse_structured_problem(value: &Value, policy: &FilterPolicy) -> Option<Problem> {
  let object = value.as_object()?;

  let id = match object.get("questionId")? {
    Value::Number(n) => n
      .as_u64()
      .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 1.0).map(|f| f as u64))?,
    Value::String(s) => parse_problem_id(s)?,
    _ => return None,
  };
  if id == 0 || !policy.is_eligible(id) {
    return None;
  }

  let text = |name: &str| object.get(name).and_then(Value::as_str).unwrap_or_default().to_string();

  let topics = object
    .get("topics")
    .and_then(Value::as_array)
    .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
    .unwrap_or_default();

  let category = object
    .get("category")
    .and_then(Value::as_str)
    .unwrap_or("General")
    .to_string();

  Some(Problem {
    id,
    difficulty: text("difficulty"),
    title: text("title"),
    title_slug: text("titleSlug"),
    url: text("url"),
    description: text("description"),
    solution_code: BTreeMap::new(),
    metadata: ProblemMetadata { category, topics, ..Default::default() },
  })
}
