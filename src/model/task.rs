use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::model::front_matter::FrontMatter;

/// Default filename for requirement links when none was seen in the document.
pub const DEFAULT_REQUIREMENTS_FILE: &str = "requirements.md";

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum allowed length of a single detail line.
pub const MAX_DETAIL_LENGTH: usize = 1000;

/// Maximum allowed length of a single reference entry.
pub const MAX_REFERENCE_LENGTH: usize = 500;

/// Maximum number of tasks in one document.
pub const MAX_TASKS: usize = 10_000;

/// Maximum nesting depth (a root task is depth 1).
pub const MAX_DEPTH: usize = 10;

static TASK_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9]\d*(\.[1-9]\d*)*$").unwrap());

/// Task checkbox state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl Status {
    /// The checkbox rendering: `[ ]`, `[-]`, `[x]`
    pub fn checkbox(self) -> &'static str {
        match self {
            Status::Pending => "[ ]",
            Status::InProgress => "[-]",
            Status::Completed => "[x]",
        }
    }

    /// Parse a checkbox string into a status. `[X]` is accepted on input.
    pub fn from_checkbox(s: &str) -> Option<Status> {
        match s {
            "[ ]" => Some(Status::Pending),
            "[-]" => Some(Status::InProgress),
            "[x]" | "[X]" => Some(Status::Completed),
            _ => None,
        }
    }

    /// Parse a human-facing status name (CLI flag values).
    pub fn from_name(s: &str) -> Option<Status> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(Status::Pending),
            "inprogress" | "in-progress" | "in_progress" => Some(Status::InProgress),
            "completed" => Some(Status::Completed),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "InProgress",
            Status::Completed => "Completed",
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::from_name(s).ok_or_else(|| {
            format!("invalid status: {s} (expected pending, in-progress, or completed)")
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.checkbox())
    }
}

/// Batch JSON carries status as an integer (0-2), but accepts the
/// status names as strings too. Always serialized as an integer.
impl Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl Visitor<'_> for StatusVisitor {
            type Value = Status;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer 0-2 or a status name")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Status, E> {
                match v {
                    0 => Ok(Status::Pending),
                    1 => Ok(Status::InProgress),
                    2 => Ok(Status::Completed),
                    other => Err(E::custom(format!(
                        "invalid status value: {} (must be 0-2)",
                        other
                    ))),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Status, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("invalid status value: {} (must be 0-2)", v)))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Status, E> {
                Status::from_name(v).ok_or_else(|| {
                    E::custom(format!(
                        "invalid status string: {} (must be Pending, InProgress, or Completed)",
                        v
                    ))
                })
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

/// A single task in a hierarchical task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Dotted hierarchical ID like `1` or `2.1.3`, derived from tree position
    pub id: String,
    pub title: String,
    pub status: Status,
    /// Plain bullet lines under the task
    #[serde(default)]
    pub details: Vec<String>,
    /// Entries from the `References:` line
    #[serde(default)]
    pub references: Vec<String>,
    /// Requirement IDs extracted from `Requirements:` markdown links
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub children: Vec<Task>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, status: Status) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            status,
            details: Vec::new(),
            references: Vec::new(),
            requirements: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// Check if an ID matches the dotted hierarchical pattern (`1`, `2.1.3`, ...)
pub fn is_valid_id(id: &str) -> bool {
    TASK_ID_PATTERN.is_match(id)
}

/// Reject control characters in user-supplied text fields
pub fn validate_text(field: &str, text: &str) -> Result<(), String> {
    if text.chars().any(|c| c.is_control()) {
        return Err(format!("{field} contains control characters"));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        ));
    }
    validate_text("title", title)
}

pub fn validate_detail(detail: &str) -> Result<(), String> {
    if detail.chars().count() > MAX_DETAIL_LENGTH {
        return Err(format!(
            "detail exceeds maximum length of {MAX_DETAIL_LENGTH} characters"
        ));
    }
    validate_text("detail", detail)
}

pub fn validate_reference(reference: &str) -> Result<(), String> {
    if reference.chars().count() > MAX_REFERENCE_LENGTH {
        return Err(format!(
            "reference exceeds maximum length of {MAX_REFERENCE_LENGTH} characters"
        ));
    }
    validate_text("reference", reference)
}

/// Extract the parent ID from a dotted ID: `"1.2.3"` -> `Some("1.2")`, `"1"` -> `None`
pub fn parent_id(task_id: &str) -> Option<&str> {
    task_id.rsplit_once('.').map(|(parent, _)| parent)
}

/// Aggregate status counts for a task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl Stats {
    /// Completion percentage, rounded down. 0 for an empty list.
    pub fn percent_complete(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.completed * 100 / self.total
        }
    }
}

/// A collection of tasks with document-level metadata.
///
/// The sole root for tree traversal, ID lookup, and mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskList {
    pub title: String,
    pub tasks: Vec<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_matter: Option<FrontMatter>,
    /// File path used when rendering requirement links, shared by the
    /// whole document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements_file: Option<String>,
    #[serde(skip)]
    pub modified: DateTime<Utc>,
}

impl TaskList {
    pub fn new(title: impl Into<String>) -> Self {
        TaskList {
            title: title.into(),
            tasks: Vec::new(),
            front_matter: None,
            requirements_file: None,
            modified: Utc::now(),
        }
    }

    /// Find a task by its dotted ID anywhere in the hierarchy
    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        if task_id.is_empty() {
            return None;
        }
        find_in(&self.tasks, task_id)
    }

    pub fn find_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        if task_id.is_empty() {
            return None;
        }
        find_in_mut(&mut self.tasks, task_id)
    }

    /// Count every task in the hierarchy
    pub fn count_tasks(&self) -> usize {
        fn count(tasks: &[Task]) -> usize {
            tasks.iter().map(|t| 1 + count(&t.children)).sum()
        }
        count(&self.tasks)
    }

    /// Compute aggregate statistics over the whole tree
    pub fn stats(&self) -> Stats {
        fn visit(tasks: &[Task], stats: &mut Stats) {
            for task in tasks {
                stats.total += 1;
                match task.status {
                    Status::Pending => stats.pending += 1,
                    Status::InProgress => stats.in_progress += 1,
                    Status::Completed => stats.completed += 1,
                }
                visit(&task.children, stats);
            }
        }
        let mut stats = Stats::default();
        visit(&self.tasks, &mut stats);
        stats
    }
}

fn find_in<'a>(tasks: &'a [Task], task_id: &str) -> Option<&'a Task> {
    for task in tasks {
        if task.id == task_id {
            return Some(task);
        }
        if let Some(found) = find_in(&task.children, task_id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(tasks: &'a mut [Task], task_id: &str) -> Option<&'a mut Task> {
    for task in tasks.iter_mut() {
        if task.id == task_id {
            return Some(task);
        }
        if let Some(found) = find_in_mut(&mut task.children, task_id) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_checkbox_round_trip() {
        for status in [Status::Pending, Status::InProgress, Status::Completed] {
            assert_eq!(Status::from_checkbox(status.checkbox()), Some(status));
        }
        assert_eq!(Status::from_checkbox("[X]"), Some(Status::Completed));
        assert_eq!(Status::from_checkbox("[?]"), None);
    }

    #[test]
    fn test_status_json_accepts_int_and_string() {
        assert_eq!(
            serde_json::from_str::<Status>("2").unwrap(),
            Status::Completed
        );
        assert_eq!(
            serde_json::from_str::<Status>("\"in-progress\"").unwrap(),
            Status::InProgress
        );
        assert_eq!(
            serde_json::from_str::<Status>("\"pending\"").unwrap(),
            Status::Pending
        );
        assert!(serde_json::from_str::<Status>("5").is_err());
        assert!(serde_json::from_str::<Status>("\"done\"").is_err());
        // Always serialized as an integer
        assert_eq!(serde_json::to_string(&Status::Completed).unwrap(), "2");
    }

    #[test]
    fn test_is_valid_id() {
        assert!(is_valid_id("1"));
        assert!(is_valid_id("1.2.3"));
        assert!(is_valid_id("10.20"));
        assert!(!is_valid_id("0"));
        assert!(!is_valid_id("1.0"));
        assert!(!is_valid_id("1."));
        assert!(!is_valid_id(".1"));
        assert!(!is_valid_id("a.b"));
        assert!(!is_valid_id(""));
    }

    #[test]
    fn test_parent_id() {
        assert_eq!(parent_id("1.2.3"), Some("1.2"));
        assert_eq!(parent_id("1.2"), Some("1"));
        assert_eq!(parent_id("1"), None);
    }

    #[test]
    fn test_find_task_nested() {
        let mut list = TaskList::new("Test");
        let mut root = Task::new("1", "Root", Status::Pending);
        let mut child = Task::new("1.1", "Child", Status::Pending);
        child
            .children
            .push(Task::new("1.1.1", "Grandchild", Status::Completed));
        root.children.push(child);
        list.tasks.push(root);

        assert_eq!(list.find_task("1.1.1").unwrap().title, "Grandchild");
        assert!(list.find_task("2").is_none());
        assert!(list.find_task("").is_none());

        list.find_task_mut("1.1").unwrap().status = Status::InProgress;
        assert_eq!(list.find_task("1.1").unwrap().status, Status::InProgress);
    }

    #[test]
    fn test_stats() {
        let mut list = TaskList::new("Test");
        let mut root = Task::new("1", "Root", Status::InProgress);
        root.children
            .push(Task::new("1.1", "A", Status::Completed));
        root.children.push(Task::new("1.2", "B", Status::Pending));
        list.tasks.push(root);
        list.tasks.push(Task::new("2", "C", Status::Completed));

        let stats = list.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.percent_complete(), 50);
    }
}
