use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::task::{Task, TaskDraft, TaskStatus};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Title,
    Description,
    DueDate,
    Status,
}

impl FormField {
    pub const ORDER: [FormField; 4] = [
        Self::Title,
        Self::Description,
        Self::DueDate,
        Self::Status,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::DueDate => "Due Date",
            Self::Status => "Status",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::DueDate,
            Self::DueDate => Self::Status,
            Self::Status => Self::Title,
        }
    }

    pub const fn prev(self) -> Self {
        match self {
            Self::Title => Self::Status,
            Self::Description => Self::Title,
            Self::DueDate => Self::Description,
            Self::Status => Self::DueDate,
        }
    }
}

/// Unsaved create/edit input. Text fields hold exactly what was typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: String,
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            due_date: task.due_date.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Mutable text of a field; `None` for the status selector.
    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::DueDate => Some(&mut self.due_date),
            FormField::Status => None,
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Description => &self.description,
            FormField::DueDate => &self.due_date,
            FormField::Status => self.status.as_str(),
        }
    }

    pub fn push_char(&mut self, field: FormField, c: char) {
        if let Some(text) = self.text_mut(field) {
            text.push(c);
        }
    }

    pub fn pop_char(&mut self, field: FormField) {
        if let Some(text) = self.text_mut(field) {
            text.pop();
        }
    }

    /// Applies the required-field policy and parses the due date.
    pub fn validate(&self) -> Result<TaskDraft, ValidationError> {
        let title = required(&self.title, FormField::Title)?;
        let description = required(&self.description, FormField::Description)?;
        let raw_date = required(&self.due_date, FormField::DueDate)?;
        let due_date = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(raw_date.clone()))?;

        Ok(TaskDraft {
            title,
            description,
            status: self.status,
            due_date,
        })
    }
}

/// Blank input counts as missing; anything else is kept as typed.
fn required(value: &str, field: FormField) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field.label()));
    }
    Ok(value.to_string())
}
