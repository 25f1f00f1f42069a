//! Small utility helpers used across modules.

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    s.to_string()
  } else {
    let mut end = max;
    while !s.is_char_boundary(end) {
      end -= 1;
    }
    format!("{}… ({} bytes total)", &s[..end], s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_strings_pass_through() {
    assert_eq!(trunc_for_log("ok", 10), "ok");
  }

  #[test]
  fn long_strings_are_cut_on_a_char_boundary() {
    let out = trunc_for_log("héllo wörld, this is long", 6);
    assert!(out.starts_with("héllo"));
    assert!(out.contains("bytes total"));
  }
}
