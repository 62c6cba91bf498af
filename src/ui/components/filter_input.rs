use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by the filter input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
  /// Filter text changed; emitted on every keystroke, empty on cancel
  Changed(String),
  /// Overlay closed, filter stays applied
  Submitted,
}

/// Company filter opened with `/`, applied live while typing
#[derive(Debug, Clone, Default)]
pub struct FilterInput {
  input: TextInput,
  active: bool,
}

impl FilterInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the overlay, starting from the filter currently applied
  pub fn activate(&mut self, current: &str) {
    self.active = true;
    self.input.set(current);
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FilterEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(FilterEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        KeyResult::Event(FilterEvent::Changed(String::new()))
      }
      InputResult::Consumed => KeyResult::Event(FilterEvent::Changed(self.input.value().to_string())),
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 3).intersection(area);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Filter by company ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);
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
  fn test_changes_are_emitted_live() {
    let mut filter = FilterInput::new();
    filter.activate("");
    assert_eq!(
      filter.handle_key(key(KeyCode::Char('a'))),
      KeyResult::Event(FilterEvent::Changed("a".to_string()))
    );
    assert_eq!(
      filter.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FilterEvent::Submitted)
    );
    assert!(!filter.is_active());
  }

  #[test]
  fn test_cancel_resets_filter() {
    let mut filter = FilterInput::new();
    filter.activate("acme");
    assert_eq!(
      filter.handle_key(key(KeyCode::Backspace)),
      KeyResult::Event(FilterEvent::Changed("acm".to_string()))
    );
    assert_eq!(
      filter.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(FilterEvent::Changed(String::new()))
    );
  }
}
