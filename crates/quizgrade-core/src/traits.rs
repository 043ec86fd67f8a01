//! Core trait definitions for task trackers.
//!
//! Implemented by the `quizgrade-tracker` crate.

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::model::{Section, TaskRecord};

/// A project-management service holding quiz submissions as tasks.
#[async_trait]
pub trait TaskTracker: Send + Sync {
    /// Human-readable tracker name (e.g. "asana").
    fn name(&self) -> &str;

    /// List the sections of a project.
    async fn list_sections(&self, project_gid: &str) -> Result<Vec<Section>, TrackerError>;

    /// List incomplete tasks in a section, with their custom fields.
    async fn list_open_tasks(&self, section_gid: &str) -> Result<Vec<TaskRecord>, TrackerError>;

    /// Mark a task as complete.
    async fn complete_task(&self, task_gid: &str) -> Result<(), TrackerError>;

    /// Post a comment on a task.
    async fn post_comment(&self, task_gid: &str, text: &str) -> Result<(), TrackerError>;
}
