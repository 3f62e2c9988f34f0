use std::collections::HashSet;

use tracing::{error, warn};

use crate::error::{ApiResult, ValidationError};
use crate::form::TaskForm;
use crate::task::{StatusFilter, Task, TaskDraft, TaskId, TaskStatus};

/// A request the store wants sent to the task API.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadAll,
    Create(TaskDraft),
    Update(Task),
    ChangeStatus { id: TaskId, status: TaskStatus },
    Delete(TaskId),
}

/// Outcome of a [`Command`], carrying what is needed to apply it.
#[derive(Debug)]
pub enum ApiEvent {
    Loaded(ApiResult<Vec<Task>>),
    Created {
        draft: TaskDraft,
        result: ApiResult<TaskId>,
    },
    Updated {
        task: Task,
        result: ApiResult<()>,
    },
    StatusChanged {
        id: TaskId,
        status: TaskStatus,
        result: ApiResult<()>,
    },
    Deleted {
        id: TaskId,
        result: ApiResult<()>,
    },
}

/// State behind the task view.
///
/// Operations that reach the server only build a [`Command`]; `tasks` is
/// changed exclusively by [`TaskManager::apply`] once the server confirms.
#[derive(Debug, Default)]
pub struct TaskManager {
    tasks: Vec<Task>,
    form: TaskForm,
    editing: Option<Task>,
    filter: StatusFilter,
    last_error: Option<String>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    pub fn editing(&self) -> Option<&Task> {
        self.editing.as_ref()
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn load_all(&self) -> Command {
        Command::LoadAll
    }

    /// Builds the create or update request for the current form.
    pub fn submit(&self) -> Result<Command, ValidationError> {
        let draft = self.form.validate()?;
        Ok(match &self.editing {
            Some(target) => Command::Update(target.merged_with(draft)),
            None => Command::Create(draft),
        })
    }

    /// Switches the form to edit `task`, discarding unsaved input.
    pub fn begin_edit(&mut self, task: Task) {
        self.form = TaskForm::from_task(&task);
        self.editing = Some(task);
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.form.reset();
    }

    pub fn remove(&self, id: TaskId) -> Command {
        Command::Delete(id)
    }

    pub fn change_status(&self, id: TaskId, status: TaskStatus) -> Command {
        Command::ChangeStatus { id, status }
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// Tasks passing the active filter, in stored order.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| self.filter.matches(task))
            .collect()
    }

    pub fn apply(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::Loaded(result) => {
                if let Some(tasks) = self.confirmed("fetching tasks", result) {
                    self.replace_all(tasks);
                }
            }
            ApiEvent::Created { draft, result } => {
                if let Some(id) = self.confirmed("adding task", result) {
                    let created = Task::from_draft(id, draft);
                    match self.find_mut(&created.id) {
                        Some(slot) => {
                            warn!(id = %created.id, "created task already listed, replacing it");
                            *slot = created;
                        }
                        None => self.tasks.push(created),
                    }
                    self.form.reset();
                }
            }
            ApiEvent::Updated { task, result } => {
                if self.confirmed("updating task", result).is_some() {
                    if self.editing.as_ref().is_some_and(|target| target.id == task.id) {
                        self.editing = None;
                        self.form.reset();
                    }
                    if let Some(slot) = self.find_mut(&task.id) {
                        *slot = task;
                    }
                }
            }
            ApiEvent::StatusChanged { id, status, result } => {
                if self.confirmed("updating task status", result).is_some() {
                    if let Some(slot) = self.find_mut(&id) {
                        slot.status = status;
                    }
                }
            }
            ApiEvent::Deleted { id, result } => {
                if self.confirmed("deleting task", result).is_some() {
                    self.tasks.retain(|task| task.id != id);
                    if self.editing.as_ref().is_some_and(|task| task.id == id) {
                        self.cancel_edit();
                    }
                }
            }
        }
    }

    fn confirmed<T>(&mut self, action: &str, result: ApiResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                error!(%err, "error {action}");
                self.last_error = Some(format!("Error {action}: {err}"));
                None
            }
        }
    }

    fn find_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == *id)
    }

    fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut seen = HashSet::with_capacity(tasks.len());
        self.tasks = tasks
            .into_iter()
            .filter(|task| {
                let fresh = seen.insert(task.id.clone());
                if !fresh {
                    warn!(id = %task.id, "dropping duplicate task from server");
                }
                fresh
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use rstest::{fixture, rstest};

    fn task(id: u64, title: &str, status: TaskStatus) -> Task {
        Task::from_draft(
            TaskId::Int(id),
            TaskDraft {
                title: title.into(),
                description: format!("{title} description"),
                status,
                due_date: NaiveDate::from_ymd_opt(2024, 5, id as u32).unwrap(),
            },
        )
    }

    fn failure() -> ApiError {
        ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".into(),
        }
    }

    #[fixture]
    fn loaded() -> TaskManager {
        let mut manager = TaskManager::new();
        manager.apply(ApiEvent::Loaded(Ok(vec![
            task(1, "one", TaskStatus::Pending),
            task(2, "two", TaskStatus::Completed),
            task(3, "X", TaskStatus::Pending),
            task(4, "four", TaskStatus::InProgress),
            task(5, "five", TaskStatus::Completed),
        ])));
        manager
    }

    fn numeric(id: &TaskId) -> u64 {
        match id {
            TaskId::Int(n) => *n,
            TaskId::Str(s) => panic!("unexpected string id {s}"),
        }
    }

    fn ids(tasks: &[&Task]) -> Vec<u64> {
        tasks.iter().map(|t| numeric(&t.id)).collect()
    }

    #[rstest]
    fn load_then_all_filter_shows_every_task_in_order(loaded: TaskManager) {
        assert_eq!(loaded.filter(), StatusFilter::All);
        assert_eq!(ids(&loaded.visible_tasks()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn failed_load_leaves_list_empty_and_reports() {
        let mut manager = TaskManager::new();
        manager.apply(ApiEvent::Loaded(Err(failure())));
        assert!(manager.tasks().is_empty());
        assert!(manager
            .last_error()
            .is_some_and(|msg| msg.starts_with("Error fetching tasks")));
    }

    #[test]
    fn load_drops_duplicate_ids() {
        let mut manager = TaskManager::new();
        manager.apply(ApiEvent::Loaded(Ok(vec![
            task(1, "first", TaskStatus::Pending),
            task(1, "again", TaskStatus::Completed),
            task(2, "two", TaskStatus::Pending),
        ])));
        let titles: Vec<_> = manager.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "two"]);
    }

    #[test]
    fn create_confirmed_after_load_does_not_duplicate() {
        let mut manager = TaskManager::new();
        manager.apply(ApiEvent::Loaded(Ok(vec![task(7, "A", TaskStatus::Pending)])));
        manager.apply(ApiEvent::Created {
            draft: TaskDraft {
                title: "A".into(),
                description: "B".into(),
                status: TaskStatus::Pending,
                due_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            },
            result: Ok(TaskId::Int(7)),
        });
        assert_eq!(ids(&manager.visible_tasks()), vec![7]);
        assert_eq!(manager.tasks()[0].description, "B");
    }

    #[rstest]
    #[case(TaskStatus::Pending, vec![1, 3])]
    #[case(TaskStatus::InProgress, vec![4])]
    #[case(TaskStatus::Completed, vec![2, 5])]
    fn status_filter_keeps_matching_subset_in_order(
        mut loaded: TaskManager,
        #[case] status: TaskStatus,
        #[case] expected: Vec<u64>,
    ) {
        loaded.set_filter(StatusFilter::Only(status));
        assert_eq!(ids(&loaded.visible_tasks()), expected);
        assert_eq!(loaded.tasks().len(), 5);
    }

    #[rstest]
    fn setting_the_same_filter_twice_is_idempotent(mut loaded: TaskManager) {
        loaded.set_filter(StatusFilter::Only(TaskStatus::Completed));
        let once = ids(&loaded.visible_tasks());
        loaded.set_filter(StatusFilter::Only(TaskStatus::Completed));
        assert_eq!(ids(&loaded.visible_tasks()), once);
        assert_eq!(loaded.filter(), StatusFilter::Only(TaskStatus::Completed));
    }

    #[test]
    fn create_appends_server_id_and_resets_form() {
        let mut manager = TaskManager::new();
        {
            let form = manager.form_mut();
            form.title = "A".into();
            form.description = "B".into();
            form.due_date = "2024-01-01".into();
        }

        let Command::Create(draft) = manager.submit().unwrap() else {
            panic!("expected a create command");
        };
        assert!(manager.tasks().is_empty());

        manager.apply(ApiEvent::Created {
            draft,
            result: Ok(TaskId::Int(7)),
        });

        assert_eq!(manager.tasks().len(), 1);
        let created = &manager.tasks()[0];
        assert_eq!(created.id, TaskId::Int(7));
        assert_eq!(created.title, "A");
        assert_eq!(created.description, "B");
        assert_eq!(created.status, TaskStatus::Pending);
        assert_eq!(created.due_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(manager.form(), &TaskForm::default());
    }

    #[test]
    fn failed_create_keeps_form_and_list() {
        let mut manager = TaskManager::new();
        manager.form_mut().title = "A".into();
        let draft = TaskDraft {
            title: "A".into(),
            description: "B".into(),
            status: TaskStatus::Pending,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        manager.apply(ApiEvent::Created {
            draft,
            result: Err(failure()),
        });
        assert!(manager.tasks().is_empty());
        assert_eq!(manager.form().title, "A");
        assert!(manager.last_error().is_some());
    }

    #[test]
    fn incomplete_form_builds_no_command() {
        let manager = TaskManager::new();
        assert_eq!(
            manager.submit(),
            Err(ValidationError::Missing("Title"))
        );
    }

    #[rstest]
    fn editing_one_field_keeps_the_rest(mut loaded: TaskManager) {
        let target = loaded.tasks()[2].clone();
        loaded.begin_edit(target.clone());
        assert_eq!(loaded.form().title, "X");
        loaded.form_mut().description = "Y".into();

        let command = loaded.submit().unwrap();
        let Command::Update(merged) = command else {
            panic!("expected an update command");
        };
        assert_eq!(loaded.tasks()[2], target);

        loaded.apply(ApiEvent::Updated {
            task: merged,
            result: Ok(()),
        });

        let stored = &loaded.tasks()[2];
        assert_eq!(stored.id, TaskId::Int(3));
        assert_eq!(stored.description, "Y");
        assert_eq!(stored.title, target.title);
        assert_eq!(stored.status, target.status);
        assert_eq!(stored.due_date, target.due_date);
        assert!(loaded.editing().is_none());
        assert_eq!(loaded.form(), &TaskForm::default());
    }

    #[rstest]
    fn failed_update_keeps_edit_in_progress(mut loaded: TaskManager) {
        let target = loaded.tasks()[2].clone();
        loaded.begin_edit(target.clone());
        loaded.form_mut().description = "Y".into();
        let Ok(Command::Update(merged)) = loaded.submit() else {
            panic!("expected an update command");
        };

        loaded.apply(ApiEvent::Updated {
            task: merged,
            result: Err(failure()),
        });

        assert_eq!(loaded.tasks()[2], target);
        assert_eq!(loaded.editing(), Some(&target));
        assert_eq!(loaded.form().description, "Y");
    }

    #[rstest]
    fn late_update_keeps_a_newer_edit(mut loaded: TaskManager) {
        let first = loaded.tasks()[0].clone();
        loaded.begin_edit(first);
        loaded.form_mut().description = "changed".into();
        let Ok(Command::Update(merged)) = loaded.submit() else {
            panic!("expected an update command");
        };

        let second = loaded.tasks()[1].clone();
        loaded.begin_edit(second.clone());
        loaded.form_mut().title = "in progress".into();

        loaded.apply(ApiEvent::Updated {
            task: merged,
            result: Ok(()),
        });

        assert_eq!(loaded.tasks()[0].description, "changed");
        assert_eq!(loaded.editing(), Some(&second));
        assert_eq!(loaded.form().title, "in progress");
    }

    #[rstest]
    fn begin_edit_discards_unsaved_input(mut loaded: TaskManager) {
        loaded.form_mut().title = "scratch".into();
        let target = loaded.tasks()[0].clone();
        loaded.begin_edit(target.clone());
        assert_eq!(loaded.form(), &TaskForm::from_task(&target));
    }

    #[rstest]
    fn delete_removes_exactly_that_task(mut loaded: TaskManager) {
        assert_eq!(loaded.remove(TaskId::Int(5)), Command::Delete(TaskId::Int(5)));
        loaded.apply(ApiEvent::Deleted {
            id: TaskId::Int(5),
            result: Ok(()),
        });
        let remaining: Vec<_> = loaded.tasks().iter().map(|t| numeric(&t.id)).collect();
        assert_eq!(remaining, vec![1, 2, 3, 4]);
    }

    #[rstest]
    fn failed_delete_keeps_the_task(mut loaded: TaskManager) {
        loaded.apply(ApiEvent::Deleted {
            id: TaskId::Int(5),
            result: Err(failure()),
        });
        assert_eq!(loaded.tasks().len(), 5);
    }

    #[rstest]
    fn deleting_the_edited_task_ends_the_edit(mut loaded: TaskManager) {
        let target = loaded.tasks()[0].clone();
        loaded.begin_edit(target);
        loaded.apply(ApiEvent::Deleted {
            id: TaskId::Int(1),
            result: Ok(()),
        });
        assert!(loaded.editing().is_none());
        assert_eq!(loaded.form(), &TaskForm::default());
    }

    #[rstest]
    fn status_change_touches_only_status(mut loaded: TaskManager) {
        let before = loaded.tasks().to_vec();
        let Command::ChangeStatus { id, status } =
            loaded.change_status(TaskId::Int(4), TaskStatus::Completed)
        else {
            panic!("expected a status command");
        };
        loaded.apply(ApiEvent::StatusChanged {
            id,
            status,
            result: Ok(()),
        });

        for (old, new) in before.iter().zip(loaded.tasks()) {
            if old.id == TaskId::Int(4) {
                assert_eq!(new.status, TaskStatus::Completed);
                assert_eq!(new.title, old.title);
                assert_eq!(new.description, old.description);
                assert_eq!(new.due_date, old.due_date);
            } else {
                assert_eq!(new, old);
            }
        }
    }

    #[rstest]
    fn failed_status_change_leaves_tasks_unchanged(mut loaded: TaskManager) {
        let before = loaded.tasks().to_vec();
        loaded.apply(ApiEvent::StatusChanged {
            id: TaskId::Int(4),
            status: TaskStatus::Completed,
            result: Err(failure()),
        });
        assert_eq!(loaded.tasks(), before.as_slice());
    }

    #[rstest]
    fn success_clears_previous_error(mut loaded: TaskManager) {
        loaded.apply(ApiEvent::Deleted {
            id: TaskId::Int(1),
            result: Err(failure()),
        });
        assert!(loaded.last_error().is_some());
        loaded.apply(ApiEvent::Deleted {
            id: TaskId::Int(1),
            result: Ok(()),
        });
        assert!(loaded.last_error().is_none());
    }

    #[rstest]
    fn later_response_wins(mut loaded: TaskManager) {
        for status in [TaskStatus::Completed, TaskStatus::Pending] {
            loaded.apply(ApiEvent::StatusChanged {
                id: TaskId::Int(4),
                status,
                result: Ok(()),
            });
        }
        assert_eq!(loaded.tasks()[3].status, TaskStatus::Pending);
    }

    #[rstest]
    fn cancel_edit_returns_to_create_mode(mut loaded: TaskManager) {
        let target = loaded.tasks()[1].clone();
        loaded.begin_edit(target);
        loaded.cancel_edit();
        assert!(loaded.editing().is_none());
        assert!(matches!(loaded.submit(), Err(ValidationError::Missing(_))));
    }
}
