//! Mock tracker for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use quizgrade_core::error::TrackerError;
use quizgrade_core::model::{Section, TaskRecord};
use quizgrade_core::traits::TaskTracker;

/// An in-memory tracker for exercising the review engine without network
/// calls.
///
/// Serves configured sections and tasks, and records every completion and
/// comment it receives.
#[derive(Default)]
pub struct MockTracker {
    /// Project gid → sections.
    sections: HashMap<String, Vec<Section>>,
    /// Section gid → tasks.
    tasks: HashMap<String, Vec<TaskRecord>>,
    /// Task gids whose write calls fail.
    failing: HashSet<String>,
    /// Number of calls made.
    call_count: AtomicU32,
    completed: Mutex<Vec<String>>,
    comments: Mutex<Vec<(String, String)>>,
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section to a project.
    pub fn with_section(mut self, project_gid: &str, gid: &str, name: &str) -> Self {
        self.sections
            .entry(project_gid.to_string())
            .or_default()
            .push(Section {
                gid: gid.to_string(),
                name: name.to_string(),
            });
        self
    }

    /// Add an open task to a section.
    pub fn with_task(mut self, section_gid: &str, task: TaskRecord) -> Self {
        self.tasks
            .entry(section_gid.to_string())
            .or_default()
            .push(task);
        self
    }

    /// Make completion and comment calls for a task fail with a server error.
    pub fn failing_on(mut self, task_gid: &str) -> Self {
        self.failing.insert(task_gid.to_string());
        self
    }

    /// Get the number of calls made to this tracker.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Gids of tasks marked complete, in call order.
    pub fn completed(&self) -> Vec<String> {
        lock(&self.completed).clone()
    }

    /// `(task gid, text)` of posted comments, in call order.
    pub fn comments(&self) -> Vec<(String, String)> {
        lock(&self.comments).clone()
    }

    fn check_writable(&self, task_gid: &str) -> Result<(), TrackerError> {
        if self.failing.contains(task_gid) {
            return Err(TrackerError::ApiError {
                status: 500,
                message: format!("mock failure for task {task_gid}"),
            });
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl TaskTracker for MockTracker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_sections(&self, project_gid: &str) -> Result<Vec<Section>, TrackerError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.sections
            .get(project_gid)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("project {project_gid}")))
    }

    async fn list_open_tasks(&self, section_gid: &str) -> Result<Vec<TaskRecord>, TrackerError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.tasks.get(section_gid).cloned().unwrap_or_default())
    }

    async fn complete_task(&self, task_gid: &str) -> Result<(), TrackerError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.check_writable(task_gid)?;
        lock(&self.completed).push(task_gid.to_string());
        Ok(())
    }

    async fn post_comment(&self, task_gid: &str, text: &str) -> Result<(), TrackerError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.check_writable(task_gid)?;
        lock(&self.comments).push((task_gid.to_string(), text.to_string()));
        Ok(())
    }
}
