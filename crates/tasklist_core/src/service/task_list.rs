//! Editable task list synchronized with the repository.
//!
//! # Responsibility
//! - Track the active filter (all tasks or a title search).
//! - Run create/edit/delete-selected commands against the repository.
//! - Recompute and emit the full ordered list after every command.
//!
//! # Invariants
//! - Every successful mutation ends with a refresh; the emitted list is never
//!   stale relative to the store.
//! - Selection survives refreshes and filter changes.
//! - Delete-selected with an empty selection touches neither the repository
//!   nor the observer.
//! - A failed command returns its error and emits nothing.

use crate::model::task::{Task, TaskDraft, TaskId};
use crate::repo::task_repo::{RepoResult, TaskRepository};
use crate::service::selection::SelectionTracker;
use log::{debug, info, warn};

/// Which slice of the store the list shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListFilter {
    #[default]
    Unfiltered,
    /// Title substring search; the query is never blank.
    Filtered(String),
}

impl ListFilter {
    /// Blank queries map to `Unfiltered`; others are kept verbatim.
    pub fn from_query(query: &str) -> Self {
        if query.trim().is_empty() {
            Self::Unfiltered
        } else {
            Self::Filtered(query.to_string())
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Unfiltered => None,
            Self::Filtered(query) => Some(query.as_str()),
        }
    }
}

/// Receives the full ordered list after every command.
pub trait TaskListObserver {
    fn on_list_changed(&mut self, tasks: &[Task], selection: &SelectionTracker);
}

impl<F> TaskListObserver for F
where
    F: FnMut(&[Task], &SelectionTracker),
{
    fn on_list_changed(&mut self, tasks: &[Task], selection: &SelectionTracker) {
        self(tasks, selection)
    }
}

/// List synchronizer over a task repository.
pub struct TaskListSync<R: TaskRepository, O: TaskListObserver> {
    repo: R,
    observer: O,
    filter: ListFilter,
    selection: SelectionTracker,
    visible: Vec<Task>,
}

impl<R: TaskRepository, O: TaskListObserver> TaskListSync<R, O> {
    /// Creates an unfiltered list with empty selection.
    ///
    /// No storage access happens until the first command or `refresh()`.
    pub fn new(repo: R, observer: O) -> Self {
        Self {
            repo,
            observer,
            filter: ListFilter::Unfiltered,
            selection: SelectionTracker::new(),
            visible: Vec::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Last emitted list.
    pub fn visible(&self) -> &[Task] {
        &self.visible
    }

    /// Switches filter and recomputes.
    ///
    /// On failure the previous filter and list stay in place.
    pub fn set_query(&mut self, query: &str) -> RepoResult<&[Task]> {
        let filter = ListFilter::from_query(query);
        let tasks = self.load(&filter)?;
        self.filter = filter;
        Ok(self.publish(tasks))
    }

    /// Recomputes the list for the current filter and emits it.
    pub fn refresh(&mut self) -> RepoResult<&[Task]> {
        let tasks = self.load(&self.filter)?;
        Ok(self.publish(tasks))
    }

    fn load(&self, filter: &ListFilter) -> RepoResult<Vec<Task>> {
        match filter {
            ListFilter::Unfiltered => self.repo.list_all(),
            ListFilter::Filtered(query) => self.repo.search(query),
        }
    }

    fn publish(&mut self, tasks: Vec<Task>) -> &[Task] {
        debug!(
            "event=task_list_refresh module=service status=ok filtered={} count={} selected={}",
            self.filter.query().is_some(),
            tasks.len(),
            self.selection.len()
        );
        self.visible = tasks;
        self.emit();
        &self.visible
    }

    /// Validates and inserts a draft, then refreshes.
    pub fn create(&mut self, draft: &TaskDraft) -> RepoResult<TaskId> {
        draft.validate()?;
        let id = self.repo.insert(draft)?;
        self.refresh()?;
        Ok(id)
    }

    /// Validates and overwrites an existing task, then refreshes.
    ///
    /// Unknown ids fail with `RepoError::NotFound`.
    pub fn edit_existing(&mut self, id: TaskId, draft: &TaskDraft) -> RepoResult<()> {
        draft.validate()?;
        self.repo.update(id, draft)?;
        self.refresh()?;
        Ok(())
    }

    /// Marks or unmarks a task for batch deletion and re-emits the list.
    pub fn toggle_selected(&mut self, id: TaskId, selected: bool) {
        self.selection.toggle(id, selected);
        self.emit();
    }

    /// Deletes every selected task, clears the selection, then refreshes.
    ///
    /// Returns the number of rows removed. Stale ids count as no-ops.
    pub fn delete_selected(&mut self) -> RepoResult<usize> {
        if self.selection.is_empty() {
            return Ok(0);
        }

        let ids = self.selection.selected_ids();
        let removed = self.repo.delete_many(&ids)?;
        if removed < ids.len() {
            warn!(
                "event=task_delete_selected module=service status=ok stale_ids={}",
                ids.len() - removed
            );
        }
        self.selection.clear();
        info!("event=task_delete_selected module=service status=ok removed={removed}");

        self.refresh()?;
        Ok(removed)
    }

    fn emit(&mut self) {
        self.observer.on_list_changed(&self.visible, &self.selection);
    }
}
