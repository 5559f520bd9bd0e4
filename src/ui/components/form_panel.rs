use super::input::TextInput;
use super::key_result::KeyResult;
use crate::resources::{field_text, FieldKind, Resource};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Whether the panel creates a new record or updates an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
  Create,
  Update { id: String },
}

/// Events emitted by the panel for the owning view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Enter pressed with the collected field values, in field order.
  /// The panel stays open and busy until the view reports the outcome
  /// via `complete_ok` / `complete_err`.
  Submitted { mode: FormMode, values: Vec<String> },
}

/// Create/update side panel for one resource.
///
/// The same panel serves both flows: `open_create` starts blank,
/// `open_update` pre-populates from the selected row. Field contents are
/// forwarded as entered; validation is the server's job. On failure the
/// inputs are preserved so the user can correct and resubmit.
pub struct FormPanel {
  resource: &'static Resource,
  mode: FormMode,
  inputs: Vec<TextInput>,
  focused: usize,
  open: bool,
  busy: bool,
  alert: Option<String>,
}

impl FormPanel {
  pub fn new(resource: &'static Resource) -> Self {
    Self {
      resource,
      mode: FormMode::Create,
      inputs: resource.fields.iter().map(|_| TextInput::new()).collect(),
      focused: 0,
      open: false,
      busy: false,
      alert: None,
    }
  }

  pub fn is_open(&self) -> bool {
    self.open
  }

  pub fn is_busy(&self) -> bool {
    self.busy
  }

  pub fn alert(&self) -> Option<&str> {
    self.alert.as_deref()
  }

  pub fn open_create(&mut self) {
    self.mode = FormMode::Create;
    self.reset_inputs();
    self.open = true;
  }

  /// Open pre-populated with the selected record. Secret fields start
  /// blank; their stored values never travel back to the client.
  pub fn open_update(&mut self, id: String, record: &serde_json::Value) {
    self.mode = FormMode::Update { id };
    self.reset_inputs();
    for (field, input) in self.resource.fields.iter().zip(&mut self.inputs) {
      if field.kind != FieldKind::Secret {
        input.set_value(&field_text(record, field.key));
      }
    }
    self.open = true;
  }

  /// The submitted write succeeded: close and clear.
  pub fn complete_ok(&mut self) {
    self.busy = false;
    self.open = false;
    self.reset_inputs();
  }

  /// The submitted write failed: keep the panel open with inputs intact
  /// and show the message.
  pub fn complete_err(&mut self, message: String) {
    self.busy = false;
    self.alert = Some(message);
  }

  fn reset_inputs(&mut self) {
    for input in &mut self.inputs {
      input.clear();
    }
    self.focused = 0;
    self.busy = false;
    self.alert = None;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.open {
      return KeyResult::NotHandled;
    }
    if self.busy {
      // Swallow input while the write is in flight
      return KeyResult::Handled;
    }

    match key.code {
      KeyCode::Esc => {
        self.open = false;
        self.reset_inputs();
        KeyResult::Handled
      }
      KeyCode::Enter => {
        self.busy = true;
        self.alert = None;
        KeyResult::Event(FormEvent::Submitted {
          mode: self.mode.clone(),
          values: self.inputs.iter().map(|i| i.value().to_string()).collect(),
        })
      }
      KeyCode::Tab | KeyCode::Down => {
        self.focused = (self.focused + 1) % self.inputs.len();
        KeyResult::Handled
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focused = self
          .focused
          .checked_sub(1)
          .unwrap_or(self.inputs.len() - 1);
        KeyResult::Handled
      }
      _ => {
        if let Some(input) = self.inputs.get_mut(self.focused) {
          input.handle_key(key);
        }
        KeyResult::Handled
      }
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.open {
      return;
    }

    let height = (self.resource.fields.len() as u16 + 4).min(area.height);
    let width = 56.min(area.width);
    let overlay = Rect::new(
      area.x + (area.width.saturating_sub(width)) / 2,
      area.y + (area.height.saturating_sub(height)) / 2,
      width,
      height,
    );

    frame.render_widget(Clear, overlay);

    let title = match &self.mode {
      FormMode::Create => format!(" New {} ", self.resource.name),
      FormMode::Update { .. } => format!(" Update {} ", self.resource.name),
    };
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Cyan))
      .title(title);
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let mut lines = Vec::new();
    for (index, (field, input)) in self.resource.fields.iter().zip(&self.inputs).enumerate() {
      let focused = index == self.focused;
      let label_style = if focused {
        Style::default().fg(Color::Cyan).bold()
      } else {
        Style::default().fg(Color::White)
      };
      let shown = match field.kind {
        FieldKind::Secret => "*".repeat(input.value().len()),
        _ => input.value().to_string(),
      };
      let mut spans = vec![
        Span::styled(format!("{:>12}: ", field.label), label_style),
        Span::raw(shown),
      ];
      if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Cyan)));
      }
      lines.push(Line::from(spans));
    }

    if let Some(alert) = &self.alert {
      lines.push(Line::from(Span::styled(
        format!(" {}", alert),
        Style::default().fg(Color::Red),
      )));
    } else if self.busy {
      lines.push(Line::from(Span::styled(
        " saving...",
        Style::default().fg(Color::DarkGray),
      )));
    } else {
      lines.push(Line::from(Span::styled(
        " Tab:next  Enter:save  Esc:cancel",
        Style::default().fg(Color::DarkGray),
      )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }
}
