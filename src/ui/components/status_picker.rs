use super::KeyResult;
use crate::ui::renderfns::status_color;
use crossterm::event::{KeyCode, KeyEvent};
use jobdesk::vacancy::VacancyStatus;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Status picker for marking the highlighted vacancy
#[derive(Debug, Clone, Default)]
pub struct StatusPicker {
  active: bool,
  uid: String,
  current: VacancyStatus,
  selected: usize,
}

impl StatusPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open for one vacancy, highlighting its current status
  pub fn show(&mut self, uid: String, current: VacancyStatus) {
    self.active = true;
    self.uid = uid;
    self.current = current;
    self.selected = VacancyStatus::ALL
      .iter()
      .position(|s| *s == current)
      .unwrap_or(0);
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.uid.clear();
  }

  /// Emits `(uid, status)` on Enter. Picking the current status closes the
  /// picker without an event.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<(String, VacancyStatus)> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    let count = VacancyStatus::ALL.len();
    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Handled
      }
      KeyCode::Enter => {
        let status = VacancyStatus::ALL[self.selected];
        let uid = std::mem::take(&mut self.uid);
        self.hide();
        if status == self.current {
          KeyResult::Handled
        } else {
          KeyResult::Event((uid, status))
        }
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.selected = (self.selected + 1) % count;
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.selected = (self.selected + count - 1) % count;
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = 24.min(area.width);
    let height = (VacancyStatus::ALL.len() as u16 + 2).min(area.height);

    // Centered
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Mark as ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = VacancyStatus::ALL
      .iter()
      .map(|status| {
        let marker = if *status == self.current { "● " } else { "  " };
        ListItem::new(Line::from(vec![
          Span::styled(marker, Style::default().fg(Color::DarkGray)),
          Span::styled(status.as_str(), Style::default().fg(status_color(*status))),
        ]))
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
  }
}
