/// Outcome of offering a key to a component.
///
/// The app offers each key to the focused overlay first and falls through to
/// list navigation only on `NotHandled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the caller to do
  Handled,
  /// Consumed, and the caller should act on the payload
  Event(T),
  /// Not consumed; try the next handler
  NotHandled,
}
