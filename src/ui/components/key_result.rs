/// How a component answered a key event.
///
/// Components consume keys and optionally surface a typed event for the
/// owning view, which keeps the delegation chain uniform:
/// App -> View -> Components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, and the parent should process this event
  Event(T),
  /// Not consumed; the parent should try its next handler
  NotHandled,
}
