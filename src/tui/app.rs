//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which drives the screens (welcome,
//! task list, add bar, edit form, dialogs), routes key presses to the task
//! list operations and renders the result.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::db::{format_completed, TaskList};
use crate::fields::Filter;
use crate::store::KeyValueStore;
use crate::task::Task;
use crate::tui::{
    colors::{AMBER, CORAL, INDIGO, PALE_GREEN, SKY, TEAL},
    enums::AppState,
    input::InputField,
    task_form::{TaskForm, ABOUT_FIELD, TITLE_FIELD},
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
pub struct App<S: KeyValueStore> {
    state: AppState,
    list: TaskList<S>,
    task_list_state: TableState,
    visible_tasks: Vec<String>,
    filter: Filter,
    add_form: TaskForm,
    edit_form: TaskForm,
    editing: Option<String>,
    pending_delete: Option<String>,
    share_text: String,
    status_message: String,
}

impl<S: KeyValueStore> App<S> {
    /// Create a new App around an already loaded task list.
    pub fn new(list: TaskList<S>) -> Self {
        let mut app = App {
            state: AppState::Welcome,
            list,
            task_list_state: TableState::default(),
            visible_tasks: Vec::new(),
            filter: Filter::All,
            add_form: TaskForm::new(),
            edit_form: TaskForm::new(),
            editing: None,
            pending_delete: None,
            share_text: String::new(),
            status_message: String::new(),
        };
        app.update_visible_tasks();
        app
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn list(&self) -> &TaskList<S> {
        &self.list
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Recompute which tasks the table shows, keeping the selection when possible.
    fn update_visible_tasks(&mut self) {
        let old_selected_id = self.selected_task_id();

        self.visible_tasks = self
            .list
            .filtered(self.filter)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();

        let idx = old_selected_id
            .and_then(|old| self.visible_tasks.iter().position(|id| *id == old))
            .or_else(|| {
                // Stay near the old row after a deletion.
                self.task_list_state
                    .selected()
                    .map(|i| i.min(self.visible_tasks.len().saturating_sub(1)))
            })
            .or(Some(0))
            .filter(|_| !self.visible_tasks.is_empty());
        self.task_list_state.select(idx);
    }

    /// Id of the highlighted task.
    pub fn selected_task_id(&self) -> Option<String> {
        self.task_list_state
            .selected()
            .and_then(|idx| self.visible_tasks.get(idx))
            .cloned()
    }

    fn selected_task(&self) -> Option<&Task> {
        self.selected_task_id().and_then(|id| self.list.get(&id))
    }

    fn select_task(&mut self, id: &str) {
        if let Some(idx) = self.visible_tasks.iter().position(|t| t == id) {
            self.task_list_state.select(Some(idx));
        }
    }

    /// Set a status message to display in the status bar.
    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    /// Clear the current status message.
    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Create a task from the add bar. The bar is cleared only when a task was added.
    fn create_task(&mut self) {
        let before = self.list.len();
        self.list
            .add(&self.add_form.title.value, &self.add_form.about.value);
        if self.list.len() == before {
            return;
        }
        self.add_form.clear();
        self.state = AppState::TaskList;
        if let Some(id) = self.list.tasks().last().map(|t| t.id.clone()) {
            self.update_visible_tasks();
            self.select_task(&id);
        }
        self.set_status_message("Task added".to_string());
    }

    /// Save the edit form into the task being edited.
    fn update_task(&mut self) {
        if let Some(id) = self.editing.take() {
            self.list
                .edit(&id, &self.edit_form.title.value, &self.edit_form.about.value);
            self.update_visible_tasks();
            self.set_status_message("Task updated".to_string());
        }
        self.state = AppState::TaskList;
    }

    fn toggle_selected_task(&mut self) {
        if let Some(id) = self.selected_task_id() {
            self.list.toggle_completed(&id);
            let done = self.list.get(&id).is_some_and(|t| t.completed);
            self.update_visible_tasks();
            self.set_status_message(if done { "Marked done" } else { "Marked open" }.to_string());
        }
    }

    fn delete_pending_task(&mut self) {
        if let Some(id) = self.pending_delete.take() {
            self.list.delete(&id);
            self.update_visible_tasks();
            self.set_status_message("Task deleted".to_string());
        }
    }

    /// Route a key press to the handler of the current screen.
    ///
    /// Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        self.clear_status_message();
        match self.state {
            AppState::Welcome => self.handle_welcome_input(key),
            AppState::TaskList => self.handle_task_list_input(key),
            AppState::AddTask => {
                self.handle_add_input(key);
                false
            }
            AppState::EditTask => {
                self.handle_edit_input(key);
                false
            }
            AppState::Confirm => {
                self.handle_confirm_input(key);
                false
            }
            AppState::Share | AppState::Help => {
                self.state = AppState::TaskList;
                false
            }
        }
    }

    fn handle_welcome_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Enter | KeyCode::Char(' ') => self.state = AppState::TaskList,
            KeyCode::Esc | KeyCode::Char('q') => return true,
            _ => {}
        }
        false
    }

    /// Handle keyboard input when in the task list view.
    ///
    /// Returns true if the application should quit.
    fn handle_task_list_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected > 0 {
                        self.task_list_state.select(Some(selected - 1));
                    }
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected + 1 < self.visible_tasks.len() {
                        self.task_list_state.select(Some(selected + 1));
                    }
                }
            }
            KeyCode::Char('a') => self.state = AppState::AddTask,
            KeyCode::Char(' ') | KeyCode::Char('c') | KeyCode::Enter => self.toggle_selected_task(),
            KeyCode::Char('e') => {
                if let Some(task) = self.selected_task().cloned() {
                    self.edit_form = TaskForm::from_task(&task);
                    self.editing = Some(task.id);
                    self.state = AppState::EditTask;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_task_id() {
                    self.pending_delete = Some(id);
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('s') => {
                let message = self.selected_task().map(Task::share_message);
                if let Some(text) = message {
                    self.share_text = text;
                    self.state = AppState::Share;
                }
            }
            KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.update_visible_tasks();
                self.set_status_message(format!("Showing: {}", self.filter.label()));
            }
            KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_add_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.state = AppState::TaskList,
            KeyCode::Enter => self.create_task(),
            other => edit_form(&mut self.add_form, other),
        }
    }

    fn handle_edit_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.editing = None;
                self.state = AppState::TaskList;
            }
            KeyCode::Enter => self.update_task(),
            other => edit_form(&mut self.edit_form, other),
        }
    }

    /// Handle keyboard input in the delete confirmation dialog.
    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.delete_pending_task();
                self.state = AppState::TaskList;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.pending_delete = None;
                self.state = AppState::TaskList;
            }
            _ => {}
        }
    }

    /// Poll for and handle one keyboard event.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn render_welcome(&mut self, f: &mut Frame, area: Rect) {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "[x] [ ] [ ]",
                Style::default().fg(TEAL).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Welcome to To-Do List",
                Style::default().fg(INDIGO).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Plan your day with a smile :)",
                Style::default().fg(Color::Rgb(119, 139, 235)),
            )),
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled(
                "  -> Start Organizing (Enter)  ",
                Style::default().bg(INDIGO).fg(Color::White).add_modifier(Modifier::BOLD),
            )),
        ];
        let popup = centered_rect(60, 50, area);
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(INDIGO)))
            .style(Style::default().bg(SKY))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, popup);
    }

    /// Render the task table, or a placeholder when there is nothing to show.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let heading = Paragraph::new(Line::from(Span::styled(
            "Your Day's Tasks",
            Style::default().fg(INDIGO).add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(heading, chunks[0]);

        let block = Block::default().borders(Borders::ALL).title(format!(
            "Tasks ({} left, showing {}) - Press 'h' for help",
            self.list.remaining(),
            self.filter.label()
        ));

        if self.visible_tasks.is_empty() {
            let placeholder = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled("No tasks yet!", Style::default().fg(PALE_GREEN))),
                Line::from(""),
                Line::from("Press 'a' to add one"),
            ])
            .block(block)
            .alignment(Alignment::Center);
            f.render_widget(placeholder, chunks[1]);
            return;
        }

        let header = Row::new(["", "Title", "About"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(INDIGO).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .visible_tasks
            .iter()
            .filter_map(|id| self.list.get(id))
            .map(|task| {
                let (marker_style, text_style) = if task.completed {
                    (
                        Style::default().fg(TEAL),
                        Style::default().fg(PALE_GREEN).add_modifier(Modifier::CROSSED_OUT),
                    )
                } else {
                    (Style::default().fg(PALE_GREEN), Style::default())
                };
                Row::new(vec![
                    Cell::from(format_completed(task.completed)).style(marker_style),
                    Cell::from(task.title.as_str())
                        .style(text_style.add_modifier(Modifier::BOLD)),
                    Cell::from(task.about.as_str()).style(text_style),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(4),
            Constraint::Percentage(35),
            Constraint::Min(20),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
    }

    /// Render the add bar along the bottom of the task list.
    fn render_add_bar(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);
        self.render_task_list(f, chunks[0]);

        let fields = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);
        render_input(f, fields[0], "Task title", &self.add_form.title);
        render_input(f, fields[1], "About this task", &self.add_form.about);
        place_cursor(f, &self.add_form, fields[0], fields[1]);
    }

    /// Render the edit form as a popup over the list.
    fn render_edit_form(&mut self, f: &mut Frame, area: Rect) {
        self.render_task_list(f, area);

        let popup = centered_rect(60, 40, area);
        f.render_widget(Clear, popup);
        let block = Block::default()
            .title("Edit Task")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(AMBER));
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(inner);
        render_input(f, chunks[0], "Title", &self.edit_form.title);
        render_input(f, chunks[1], "About", &self.edit_form.about);
        let hint = Paragraph::new("Enter: Save   Esc: Cancel   Tab: Next field")
            .alignment(Alignment::Center);
        f.render_widget(hint, chunks[2]);
        place_cursor(f, &self.edit_form, chunks[0], chunks[1]);
    }

    /// Render the delete confirmation dialog.
    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(INDIGO));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let title = self
            .pending_delete
            .as_deref()
            .and_then(|id| self.list.get(id))
            .map(|t| t.title.clone())
            .unwrap_or_default();

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Delete this task?",
                Style::default().fg(INDIGO).add_modifier(Modifier::BOLD),
            )),
            Line::from(title),
            Line::from(""),
            Line::from(vec![
                Span::styled(" Yes (y) ", Style::default().fg(TEAL).add_modifier(Modifier::BOLD)),
                Span::raw("   "),
                Span::styled(" No (n) ", Style::default().fg(CORAL).add_modifier(Modifier::BOLD)),
            ]),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, area);
    }

    fn render_share(&mut self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 30, area);
        f.render_widget(Clear, area);
        let mut lines: Vec<Line> = self.share_text.lines().map(|l| Line::from(l.to_string())).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::ITALIC),
        )));
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title("Share Task")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(INDIGO)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("To-Do List Help", bold)),
            Line::from(""),
            Line::from(Span::styled("Task List:", bold)),
            Line::from("  Up/k, Down/j      Navigate tasks"),
            Line::from("  Space/Enter/c     Toggle completion"),
            Line::from("  a                 Add new task"),
            Line::from("  e                 Edit selected task"),
            Line::from("  d/Del             Delete selected task"),
            Line::from("  s                 Share selected task"),
            Line::from("  f                 Cycle filter (All, Open, Done)"),
            Line::from("  h/?/F1            Show this help"),
            Line::from("  q/Esc/Ctrl+C      Quit"),
            Line::from(""),
            Line::from(Span::styled("Add bar and edit form:", bold)),
            Line::from("  Tab/Up/Down       Switch between title and about"),
            Line::from("  Enter             Save"),
            Line::from("  Esc               Cancel and return"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::Welcome => "Enter: Start | q: Quit".to_string(),
                AppState::TaskList => format!(
                    "Tasks: {} | Remaining: {} | Press 'h' for help",
                    self.list.len(),
                    self.list.remaining()
                ),
                AppState::AddTask => "Add Task (Enter to add, Esc to close)".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::Share => "Share Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(INDIGO).fg(Color::White))
            .alignment(Alignment::Left);

        f.render_widget(status, area);
    }

    /// Main render function that dispatches to appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::Welcome => self.render_welcome(f, chunks[0]),
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::AddTask => self.render_add_bar(f, chunks[0]),
            AppState::EditTask => self.render_edit_form(f, chunks[0]),
            AppState::Share => {
                self.render_task_list(f, chunks[0]);
                self.render_share(f, chunks[0]);
            }
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_task_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Draw one frame.
    pub fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|f| self.render(f))?;
        Ok(())
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering and input processing until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.draw(terminal)?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// Apply a text-editing key to the focused field of `form`.
fn edit_form(form: &mut TaskForm, key: KeyCode) {
    match key {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Char(c) => form.active_mut().handle_char(c),
        KeyCode::Backspace => form.active_mut().handle_backspace(),
        KeyCode::Delete => form.active_mut().handle_delete(),
        KeyCode::Left => form.active_mut().move_cursor_left(),
        KeyCode::Right => form.active_mut().move_cursor_right(),
        KeyCode::Home => form.active_mut().move_cursor_home(),
        KeyCode::End => form.active_mut().move_cursor_end(),
        _ => {}
    }
}

fn render_input(f: &mut Frame, area: Rect, title: &str, field: &InputField) {
    let border = if field.active {
        Style::default().fg(AMBER)
    } else {
        Style::default().fg(PALE_GREEN)
    };
    let input = Paragraph::new(field.value.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(border),
    );
    f.render_widget(input, area);
}

fn place_cursor(f: &mut Frame, form: &TaskForm, title_area: Rect, about_area: Rect) {
    let (area, field) = match form.current_field {
        TITLE_FIELD => (title_area, &form.title),
        ABOUT_FIELD => (about_area, &form.about),
        _ => return,
    };
    f.set_cursor_position((cursor_x(area, field.cursor), area.y.saturating_add(1)));
}

/// Column of the cursor inside a bordered input, clamped to the last inner cell.
fn cursor_x(area: Rect, cursor: usize) -> u16 {
    let max_x = area.x.saturating_add(area.width.saturating_sub(2));
    let offset = u16::try_from(cursor).unwrap_or(u16::MAX);
    area.x.saturating_add(1).saturating_add(offset).min(max_x)
}
