use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// Actions a view can request in response to user input.
pub enum ViewAction {
  /// Nothing for the app to do
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop the current view (go back)
  Pop,
}

/// Trait for screen behavior.
///
/// Views own their input modes (search, form editing) and return actions
/// for the App to execute: App -> View -> Components. Views that load data
/// poll their `Query` handles in `tick()`; a view popped off the stack is
/// dropped, which releases its cache entries and discards any in-flight
/// responses for them.
pub trait View {
  /// Handle a key event, returning an action for the App
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Label for this view in the breadcrumb
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick so views can poll async queries
  fn tick(&mut self) {}

  /// Whether the view currently routes plain characters into a text field
  /// (an open form or search overlay). The App leaves mode keys alone
  /// while this holds.
  fn wants_input(&self) -> bool {
    false
  }

  /// Key hints for the footer
  fn hint(&self) -> &'static str {
    ":command  q:back"
  }
}
