//! Essentials builder: project the full record set into the compact index.
//!
//! Pure so it stays trivially testable; the caller stamps `last_updated` at
//! upload time.

use crate::domain::{EssentialSummary, EssentialsIndex, Problem};

/// Build the index from the full in-memory set. Input order is arbitrary;
/// output is always sorted ascending by id so repeated runs diff cleanly.
pub fn build_essentials(problems: &[Problem]) -> EssentialsIndex {
  let mut summaries: Vec<EssentialSummary> = problems
    .iter()
    .map(|p| EssentialSummary {
      id: p.id,
      title: p.title.clone(),
      difficulty: p.difficulty.clone(),
      category: p.metadata.category.clone(),
      topics: p.metadata.topics.clone(),
    })
    .collect();
  summaries.sort_by_key(|s| s.id);

  EssentialsIndex { count: summaries.len(), problems: summaries, last_updated: None }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ProblemMetadata;

  fn problem(id: u64, title: &str) -> Problem {
    Problem {
      id,
      difficulty: "Medium".into(),
      title: title.into(),
      title_slug: String::new(),
      url: String::new(),
      description: String::new(),
      solution_code: Default::default(),
      metadata: ProblemMetadata { category: "General".into(), ..Default::default() },
    }
  }

  #[test]
  fn index_is_sorted_by_id_regardless_of_input_order() {
    let problems = vec![problem(1931, "b"), problem(1262, "a"), problem(2000, "c")];
    let index = build_essentials(&problems);
    let ids: Vec<u64> = index.problems.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1262, 1931, 2000]);
    assert_eq!(index.count, 3);
  }

  #[test]
  fn last_updated_is_left_for_the_caller() {
    let index = build_essentials(&[problem(1931, "x")]);
    assert!(index.last_updated.is_none());
  }

  #[test]
  fn summaries_carry_the_five_projection_fields() {
    let mut p = problem(1262, "Greatest Sum Divisible by Three");
    p.metadata.topics = vec!["Array".into(), "Dynamic Programming".into()];
    let index = build_essentials(&[p]);
    let s = &index.problems[0];
    assert_eq!(s.id, 1262);
    assert_eq!(s.title, "Greatest Sum Divisible by Three");
    assert_eq!(s.difficulty, "Medium");
    assert_eq!(s.category, "General");
    assert_eq!(s.topics, vec!["Array", "Dynamic Programming"]);
  }

  #[test]
  fn empty_input_builds_an_empty_index() {
    let index = build_essentials(&[]);
    assert_eq!(index.count, 0);
    assert!(index.problems.is_empty());
  }
}
