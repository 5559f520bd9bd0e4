//! Terminal rendering: views, reusable components and small helpers.

pub mod components;
pub mod view;
pub mod views;

use chrono::NaiveDate;
use ratatui::widgets::TableState;

/// Keep the table selection inside the current row count.
pub fn clamp_selection(state: &mut TableState, len: usize) {
  if len == 0 {
    state.select(None);
  } else {
    let selected = state.selected().unwrap_or(0).min(len - 1);
    state.select(Some(selected));
  }
}

/// Truncate a string for a fixed-width cell, appending "..." when cut.
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

/// Render a server date as YYYY-MM-DD, passing unparseable values through.
pub fn short_date(raw: &str) -> String {
  if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
    return dt.date_naive().to_string();
  }
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return date.to_string();
  }
  raw.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate() {
    assert_eq!(truncate("saplings", 10), "saplings");
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_short_date_rfc3339() {
    assert_eq!(short_date("2024-01-10T08:30:00.000Z"), "2024-01-10");
  }

  #[test]
  fn test_short_date_passthrough() {
    assert_eq!(short_date("2024-01-10"), "2024-01-10");
    assert_eq!(short_date("next week"), "next week");
  }

  #[test]
  fn test_clamp_selection() {
    let mut state = TableState::default();
    state.select(Some(10));
    clamp_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    clamp_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
