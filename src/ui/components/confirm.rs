use super::KeyResult;
use crate::ui::renderfns::truncate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Yes/no prompt guarding a delete
#[derive(Debug, Clone, Default)]
pub struct ConfirmDelete {
  target: Option<(String, String)>,
}

impl ConfirmDelete {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.target.is_some()
  }

  /// Ask before deleting `uid`; `label` is what the user sees
  pub fn show(&mut self, uid: String, label: String) {
    self.target = Some((uid, label));
  }

  /// Emits the uid to delete on `y`
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<String> {
    let Some((uid, _)) = &self.target else {
      return KeyResult::NotHandled;
    };

    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => {
        let uid = uid.clone();
        self.target = None;
        KeyResult::Event(uid)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
        self.target = None;
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some((_, label)) = &self.target else {
      return;
    };

    let width = 50.min(area.width);
    let height = 5.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Delete vacancy ");

    let text = vec![
      Line::from(Span::styled(
        truncate(label, width.saturating_sub(4) as usize),
        Style::default().fg(Color::White).bold(),
      )),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Red)),
        Span::styled(" delete   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" keep", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    let paragraph = Paragraph::new(text)
      .block(block)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, overlay_area);
  }
}
