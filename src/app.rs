use crate::api::client::ApiClient;
use crate::api::types::{DonationEvent, Donor, InventoryItem};
use crate::commands;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::query::QueryCache;
use crate::ui::components::{render_command_overlay, InputResult, TextInput};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::ResourceTableView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::io::stdout;
use std::time::Duration;

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: TextInput,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Application configuration
  config: Config,

  /// Backend client
  api: ApiClient,

  /// Shared query cache, one per application
  cache: QueryCache,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let api = ApiClient::new(&config)?;
    let cache = QueryCache::new();

    let root: Box<dyn View> = Box::new(ResourceTableView::<Donor>::new(
      api.clone(),
      cache.clone(),
      config.table.page_size,
    ));

    Ok(Self {
      view_stack: vec![root],
      mode: Mode::Normal,
      command_input: TextInput::new(),
      selected_suggestion: 0,
      config,
      api,
      cache,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      if let Some(event) = events.next().await {
        match event {
          Event::Key(key) => self.handle_key(key),
          Event::Tick => {
            if let Some(view) = self.view_stack.last_mut() {
              view.tick();
            }
          }
        }
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
      ])
      .split(frame.area());

    self.draw_header(frame, chunks[0]);

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }

    self.draw_footer(frame, chunks[2]);

    if self.mode == Mode::Command {
      render_command_overlay(
        frame,
        chunks[1],
        self.command_input.value(),
        &commands::get_suggestions(self.command_input.value()),
        self.selected_suggestion,
      );
    }
  }

  fn draw_header(&self, frame: &mut Frame, area: Rect) {
    let title = self
      .config
      .title
      .clone()
      .unwrap_or_else(|| self.api.host());

    let breadcrumb = self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect::<Vec<_>>()
      .join(" > ");

    let line = Line::from(vec![
      Span::styled(" d9s ", Style::default().fg(Color::Magenta).bold()),
      Span::styled(title, Style::default().fg(Color::Blue)),
      Span::raw("  "),
      Span::styled(breadcrumb, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
  }

  fn draw_footer(&self, frame: &mut Frame, area: Rect) {
    let hint = self
      .view_stack
      .last()
      .map(|view| view.hint())
      .unwrap_or_default();
    let line = Line::from(Span::styled(
      format!(" :command  {}", hint),
      Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(line), area);
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.mode {
      Mode::Command => self.handle_command_mode_key(key),
      Mode::Normal => self.handle_normal_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    let wants_input = self
      .view_stack
      .last()
      .map(|view| view.wants_input())
      .unwrap_or(false);

    if key.code == KeyCode::Char(':') && !wants_input {
      self.mode = Mode::Command;
      self.command_input.clear();
      self.selected_suggestion = 0;
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };

    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(self.command_input.value());
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(self.command_input.value());
        if !suggestions.is_empty() {
          self.selected_suggestion = self
            .selected_suggestion
            .checked_sub(1)
            .unwrap_or(suggestions.len() - 1);
        }
      }
      _ => match self.command_input.handle_key(key) {
        InputResult::Submitted(_) => {
          self.execute_command();
          self.mode = Mode::Normal;
          self.selected_suggestion = 0;
        }
        InputResult::Cancelled => {
          self.mode = Mode::Normal;
          self.command_input.clear();
          self.selected_suggestion = 0;
        }
        InputResult::Consumed => {
          // Reset selection on input change
          self.selected_suggestion = 0;
        }
        InputResult::NotHandled => {}
      },
    }
  }

  fn execute_command(&mut self) {
    // Take the selected suggestion when there is one, else the raw input
    let suggestions = commands::get_suggestions(self.command_input.value());
    let cmd = if let Some(suggestion) = suggestions.get(self.selected_suggestion) {
      suggestion.name.to_string()
    } else {
      self.command_input.value().trim().to_lowercase()
    };
    self.command_input.clear();

    let page_size = self.config.table.page_size;
    let root: Option<Box<dyn View>> = match cmd.as_str() {
      "donors" => Some(Box::new(ResourceTableView::<Donor>::new(
        self.api.clone(),
        self.cache.clone(),
        page_size,
      ))),
      "events" => Some(Box::new(ResourceTableView::<DonationEvent>::new(
        self.api.clone(),
        self.cache.clone(),
        page_size,
      ))),
      "items" => Some(Box::new(ResourceTableView::<InventoryItem>::new(
        self.api.clone(),
        self.cache.clone(),
        page_size,
      ))),
      "quit" => {
        self.should_quit = true;
        None
      }
      _ => None,
    };

    if let Some(root) = root {
      // Replacing the stack drops the old views, releasing their cache entries
      self.view_stack.clear();
      self.view_stack.push(root);
    }
  }
}
