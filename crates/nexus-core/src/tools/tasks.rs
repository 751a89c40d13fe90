//! Session-owned task list and the `create_tasks` / `update_tasks` tools
//!
//! Each agent owns one [`TaskStore`] and hands it to tools through
//! [`ToolContext`]; two agents in one process never share a list.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::LocalToolResult;
use super::kind::BuiltinTool;
use super::local::{LocalTool, ToolContext};
use crate::types::{ToolResult, ToolSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Unix milliseconds of the last status change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub user_query: String,
    pub tasks: Vec<Task>,
    /// Unix milliseconds
    pub created_at: u64,
}

/// One requested status change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TaskDraft {
    #[serde(default)]
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Shared handle to one session's task list
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    inner: Arc<RwLock<Option<TaskList>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current list
    pub fn snapshot(&self) -> Option<TaskList> {
        self.inner.read().clone()
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Replace the list; returns its snapshot
    pub fn create(&self, user_query: impl Into<String>, tasks: Vec<Task>) -> TaskList {
        let list = TaskList {
            user_query: user_query.into(),
            tasks,
            created_at: now_millis(),
        };
        *self.inner.write() = Some(list.clone());
        list
    }

    /// Apply every update or none of them
    pub fn update(&self, updates: &[TaskUpdate]) -> Result<(TaskList, usize), String> {
        let mut guard = self.inner.write();
        let list = guard
            .as_mut()
            .ok_or_else(|| "Error: No task list exists. Create tasks first.".to_string())?;

        let mut resolved = Vec::with_capacity(updates.len());
        for update in updates {
            if update.id.is_empty() || update.status.is_empty() {
                return Err("Error: Task update missing required fields (id, status)".to_string());
            }
            let status = TaskStatus::parse(&update.status)
                .ok_or_else(|| format!("Error: Invalid status '{}'", update.status))?;
            let index = list
                .tasks
                .iter()
                .position(|task| task.id == update.id)
                .ok_or_else(|| format!("Error: Task '{}' not found", update.id))?;
            resolved.push((index, status, update.notes.clone()));
        }

        let stamp = now_millis();
        for (index, status, notes) in resolved {
            let task = &mut list.tasks[index];
            task.status = status;
            if let Some(notes) = notes.filter(|n| !n.is_empty()) {
                task.notes = Some(notes);
            }
            task.updated_at = Some(stamp);
        }
        Ok((list.clone(), updates.len()))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn snapshot_value(list: &TaskList) -> Value {
    serde_json::to_value(list).unwrap_or(Value::Null)
}

/// `create_tasks { user_query, tasks: [{id, description, status?}] }`
pub struct CreateTasksTool;

#[derive(Deserialize)]
struct CreateTasksArgs {
    #[serde(default)]
    user_query: String,
    #[serde(default)]
    tasks: Vec<TaskDraft>,
}

#[async_trait]
impl LocalTool for CreateTasksTool {
    fn name(&self) -> &str {
        BuiltinTool::CreateTasks.name()
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::function(
            self.name(),
            "Break the user's request into a list of subtasks to work through",
            json!({
                "type": "object",
                "properties": {
                    "user_query": { "type": "string", "description": "The request being planned" },
                    "tasks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "description": { "type": "string" },
                                "status": { "type": "string", "enum": ["pending", "in_progress", "completed"] }
                            },
                            "required": ["id", "description"]
                        }
                    }
                },
                "required": ["user_query", "tasks"]
            }),
        )
    }

    async fn call(&self, arguments: Value, ctx: &ToolContext) -> LocalToolResult<ToolResult> {
        let args: CreateTasksArgs = serde_json::from_value(arguments)?;

        let mut tasks = Vec::with_capacity(args.tasks.len());
        for (i, draft) in args.tasks.into_iter().enumerate() {
            if draft.id.is_empty() || draft.description.is_empty() {
                return Ok(ToolResult::failure(format!(
                    "Error: Task {i} missing required fields (id, description)"
                )));
            }
            let status = match draft.status.as_deref() {
                None | Some("") => TaskStatus::Pending,
                Some(raw) => match TaskStatus::parse(raw) {
                    Some(status) => status,
                    None => {
                        return Ok(ToolResult::failure(format!(
                            "Error: Invalid status '{raw}' for task {}",
                            draft.id
                        )))
                    }
                },
            };
            tasks.push(Task {
                id: draft.id,
                description: draft.description,
                status,
                notes: draft.notes,
                updated_at: None,
            });
        }

        let count = tasks.len();
        let list = ctx.tasks.create(args.user_query, tasks);
        Ok(ToolResult::success(snapshot_value(&list)).with_message(format!(
            "Created task list with {count} tasks for: {}",
            list.user_query
        )))
    }
}

/// `update_tasks { task_updates: [{id, status, notes?}] }`
pub struct UpdateTasksTool;

#[derive(Deserialize)]
struct UpdateTasksArgs {
    #[serde(default)]
    task_updates: Vec<TaskUpdate>,
}

#[async_trait]
impl LocalTool for UpdateTasksTool {
    fn name(&self) -> &str {
        BuiltinTool::UpdateTasks.name()
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::function(
            self.name(),
            "Update the status of one or more tasks in the current task list",
            json!({
                "type": "object",
                "properties": {
                    "task_updates": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "status": { "type": "string", "enum": ["pending", "in_progress", "completed"] },
                                "notes": { "type": "string" }
                            },
                            "required": ["id", "status"]
                        }
                    }
                },
                "required": ["task_updates"]
            }),
        )
    }

    async fn call(&self, arguments: Value, ctx: &ToolContext) -> LocalToolResult<ToolResult> {
        let args: UpdateTasksArgs = serde_json::from_value(arguments)?;
        match ctx.tasks.update(&args.task_updates) {
            Ok((list, count)) => Ok(ToolResult::success(snapshot_value(&list))
                .with_message(format!("Updated {count} task(s)"))),
            Err(message) => Ok(ToolResult::failure(message)),
        }
    }
}
