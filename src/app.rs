use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::ValidationError;
use crate::form::FormField;
use crate::task::Task;
use crate::task_manager::{ApiEvent, Command, TaskManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Table,
    Form(FormField),
}

/// Key bindings and cursor state on top of the task store.
#[derive(Debug)]
pub struct App {
    pub manager: TaskManager,
    pub focus: Focus,
    pub selected: usize,
    pub form_error: Option<ValidationError>,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            manager: TaskManager::new(),
            focus: Focus::Table,
            selected: 0,
            form_error: None,
            should_quit: false,
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.manager.visible_tasks().get(self.selected).copied()
    }

    pub fn apply(&mut self, event: ApiEvent) {
        self.manager.apply(event);
        self.clamp_selection();
    }

    /// Handles one key press, returning the request it triggers, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        match self.focus {
            Focus::Table => self.handle_table_key(key),
            Focus::Form(field) => self.handle_form_key(field, key),
        }
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let visible = self.manager.visible_tasks().len();
                if self.selected + 1 < visible {
                    self.selected += 1;
                }
            }
            KeyCode::Char('a') | KeyCode::Tab => self.focus = Focus::Form(FormField::Title),
            KeyCode::Char('e') => {
                if let Some(task) = self.selected_task().cloned() {
                    self.manager.begin_edit(task);
                    self.form_error = None;
                    self.focus = Focus::Form(FormField::Title);
                }
            }
            KeyCode::Char('d') => {
                return self.selected_task().map(|task| self.manager.remove(task.id.clone()));
            }
            KeyCode::Char('s') => {
                return self
                    .selected_task()
                    .map(|task| self.manager.change_status(task.id.clone(), task.status.next()));
            }
            KeyCode::Char('f') => {
                self.manager.set_filter(self.manager.filter().next());
                self.selected = 0;
            }
            _ => {}
        }
        None
    }

    fn handle_form_key(&mut self, field: FormField, key: KeyEvent) -> Option<Command> {
        self.form_error = None;
        match key.code {
            KeyCode::Esc => self.focus = Focus::Table,
            KeyCode::Tab => self.focus = Focus::Form(field.next()),
            KeyCode::BackTab => self.focus = Focus::Form(field.prev()),
            KeyCode::Char('x') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.manager.cancel_edit();
            }
            KeyCode::Enter => match self.manager.submit() {
                Ok(command) => {
                    self.focus = Focus::Table;
                    return Some(command);
                }
                Err(err) => self.form_error = Some(err),
            },
            KeyCode::Left if field == FormField::Status => {
                let form = self.manager.form_mut();
                form.status = form.status.prev();
            }
            KeyCode::Right | KeyCode::Char(' ') if field == FormField::Status => {
                let form = self.manager.form_mut();
                form.status = form.status.next();
            }
            KeyCode::Backspace => self.manager.form_mut().pop_char(field),
            KeyCode::Char(c) => self.manager.form_mut().push_char(field, c),
            _ => {}
        }
        None
    }

    fn clamp_selection(&mut self) {
        let visible = self.manager.visible_tasks().len();
        if self.selected >= visible {
            self.selected = visible.saturating_sub(1);
        }
    }
}
