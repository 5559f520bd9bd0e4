use super::input::{InputResult, TextInput};
use super::key_result::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by the search overlay.
///
/// Keystrokes only edit the staged buffer; nothing reaches the query
/// parameters (and so the network) until the user submits with Enter.
/// Submitting an empty buffer clears the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Enter pressed; apply this search string
  Submitted(String),
  /// Escape pressed; buffer discarded, active filter unchanged
  Cancelled,
}

/// Staged search input, activated with '/'.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Staged (not yet submitted) buffer contents.
  pub fn buffer(&self) -> &str {
    self.input.value()
  }

  /// Handle a key event; call regardless of active state, activation is
  /// handled here too.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.active = true;
        self.input.clear();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(value) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted(value))
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        KeyResult::Event(SearchEvent::Cancelled)
      }
      InputResult::Consumed => KeyResult::Handled,
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// Render the overlay if active.
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60);
    let overlay = Rect::new(area.x + 1, area.y + 1, width.min(area.width), 3);

    frame.render_widget(Clear, overlay);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Search (Enter to apply) ");
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    if inner.height == 0 {
      return;
    }

    let line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_typing_emits_no_submission() {
    let mut search = SearchInput::new();
    assert_eq!(search.handle_key(key(KeyCode::Char('/'))), KeyResult::Handled);

    // Every keystroke stays in the staged buffer
    for c in "saplings".chars() {
      assert_eq!(
        search.handle_key(key(KeyCode::Char(c))),
        KeyResult::Handled
      );
    }
    assert_eq!(search.buffer(), "saplings");
  }

  #[test]
  fn test_enter_submits_buffer() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')));
    search.handle_key(key(KeyCode::Char('a')));

    assert_eq!(
      search.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(SearchEvent::Submitted("a".to_string()))
    );
    assert!(!search.is_active());
  }

  #[test]
  fn test_empty_submit_clears_filter() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')));
    assert_eq!(
      search.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(SearchEvent::Submitted(String::new()))
    );
  }

  #[test]
  fn test_escape_cancels_without_applying() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')));
    search.handle_key(key(KeyCode::Char('x')));
    assert_eq!(
      search.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(SearchEvent::Cancelled)
    );
    assert_eq!(search.buffer(), "");
  }

  #[test]
  fn test_inactive_passes_keys_through() {
    let mut search = SearchInput::new();
    assert_eq!(
      search.handle_key(key(KeyCode::Char('j'))),
      KeyResult::NotHandled
    );
  }
}
