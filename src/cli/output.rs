use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{PhaseMarker, Stats, Status, Task, TaskList};
use crate::ops::next::NextTask;
use crate::ops::phase_ops::tasks_by_phase;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaskJson>,
}

impl TaskJson {
    pub fn from_task(task: &Task) -> Self {
        TaskJson {
            id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
            details: task.details.clone(),
            references: task.references.clone(),
            requirements: task.requirements.clone(),
            children: task.children.iter().map(TaskJson::from_task).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct ListJson {
    pub title: String,
    /// Last modification time of the task file, RFC 3339.
    pub modified: DateTime<Utc>,
    pub tasks: Vec<TaskJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<String>,
}

#[derive(Serialize)]
pub struct NextJson {
    pub id: String,
    pub title: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incomplete_children: Vec<TaskJson>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressJson {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub percent_complete: usize,
}

#[derive(Serialize)]
pub struct MutationJson {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "autoCompleted", skip_serializing_if = "Vec::is_empty")]
    pub auto_completed: Vec<String>,
}

impl MutationJson {
    pub fn ok(id: Option<String>) -> Self {
        MutationJson {
            success: true,
            id,
            auto_completed: Vec::new(),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: could not serialize output: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Plain-text output
// ---------------------------------------------------------------------------

/// Print the task tree with phase headers, much like the file itself but
/// without the markdown scaffolding.
pub fn print_list(list: &TaskList, markers: &[PhaseMarker]) {
    println!("{}", list.title);
    for (phase, tasks) in tasks_by_phase(list, markers) {
        if !phase.is_empty() {
            println!();
            println!("{phase}:");
        }
        for task in tasks {
            print_task_tree(task, 0);
        }
    }
}

fn print_task_tree(task: &Task, depth: usize) {
    println!(
        "{}{} {}. {}",
        "  ".repeat(depth + 1),
        task.status.checkbox(),
        task.id,
        task.title
    );
    for child in &task.children {
        print_task_tree(child, depth + 1);
    }
}

pub fn print_next(next: &NextTask) {
    println!(
        "{} {}. {}",
        next.task.status.checkbox(),
        next.task.id,
        next.task.title
    );
    for detail in &next.task.details {
        println!("  - {detail}");
    }
    if !next.incomplete_children.is_empty() {
        println!("incomplete children:");
        for child in &next.incomplete_children {
            println!("  {} {}. {}", child.status.checkbox(), child.id, child.title);
        }
    }
}

pub fn print_progress(stats: &Stats) {
    println!(
        "{}/{} completed ({}%)",
        stats.completed,
        stats.total,
        stats.percent_complete()
    );
    println!(
        "pending: {}  in progress: {}",
        stats.pending, stats.in_progress
    );
}
