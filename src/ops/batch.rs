use serde::{Deserialize, Serialize};

use crate::model::{PhaseMarker, Status, Task, TaskList};
use crate::ops::autocomplete::auto_complete_parents;
use crate::ops::phase_ops::{add_phase, add_task_to_phase};
use crate::ops::task_ops::{add_task, remove_task, update_task, TaskError, TaskUpdate};
use crate::parse::render_markdown_with_phases;

/// One mutation in a batch request. The `type` field selects the variant:
/// `add`, `update`, `remove`, or `add-phase`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    Add {
        title: String,
        #[serde(default)]
        parent: Option<String>,
        #[serde(default)]
        position: Option<String>,
        #[serde(default)]
        phase: Option<String>,
        #[serde(default)]
        status: Option<Status>,
        #[serde(default)]
        details: Vec<String>,
        #[serde(default)]
        references: Vec<String>,
        #[serde(default)]
        requirements: Vec<String>,
    },
    Update {
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        status: Option<Status>,
        #[serde(default)]
        details: Option<Vec<String>>,
        #[serde(default)]
        references: Option<Vec<String>>,
        #[serde(default)]
        requirements: Option<Vec<String>>,
    },
    Remove {
        id: String,
    },
    AddPhase {
        name: String,
    },
}

/// A batch request document, as read from stdin or a JSON file.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, alias = "requirementsFile")]
    pub requirements_file: Option<String>,
    pub operations: Vec<Operation>,
    #[serde(default, alias = "dryRun")]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
    pub op_index: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    pub applied: usize,
    pub errors: Vec<BatchError>,
    pub auto_completed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Execute a batch atomically: all operations apply in array order against
/// a working copy, and the caller's document is replaced only if every one
/// succeeds. The first failure aborts the batch and reports the failing
/// operation's index; the caller's document is left untouched either way on
/// failure or dry run.
pub fn execute_batch(
    list: &mut TaskList,
    markers: &mut Vec<PhaseMarker>,
    operations: &[Operation],
    dry_run: bool,
) -> BatchResponse {
    let mut work = list.clone();
    let mut work_markers = markers.clone();
    let mut auto_completed: Vec<String> = Vec::new();

    for (i, op) in operations.iter().enumerate() {
        if let Err(err) = apply(&mut work, &mut work_markers, op, &mut auto_completed) {
            return BatchResponse {
                success: false,
                applied: 0,
                errors: vec![BatchError {
                    op_index: i,
                    message: err.to_string(),
                }],
                auto_completed: Vec::new(),
                preview: None,
            };
        }
    }

    let preview = dry_run.then(|| render_markdown_with_phases(&work, &work_markers));
    if !dry_run {
        *list = work;
        *markers = work_markers;
    }

    BatchResponse {
        success: true,
        applied: operations.len(),
        errors: Vec::new(),
        auto_completed,
        preview,
    }
}

fn apply(
    list: &mut TaskList,
    markers: &mut Vec<PhaseMarker>,
    op: &Operation,
    auto_completed: &mut Vec<String>,
) -> Result<(), TaskError> {
    match op {
        Operation::Add {
            title,
            parent,
            position,
            phase,
            status,
            details,
            references,
            requirements,
        } => {
            let mut task = Task::new("", title.clone(), status.unwrap_or(Status::Pending));
            task.details = details.clone();
            task.references = references.clone();
            task.requirements = requirements.clone();

            let id = if let Some(phase) = phase {
                if parent.is_some() || position.is_some() {
                    return Err(TaskError::Validation(
                        "phase cannot be combined with parent or position".to_string(),
                    ));
                }
                add_task_to_phase(list, markers, phase, task)?
            } else {
                add_task(list, markers, parent.as_deref(), position.as_deref(), task)?
            };
            if *status == Some(Status::Completed) {
                for pid in auto_complete_parents(list, &id) {
                    if !auto_completed.contains(&pid) {
                        auto_completed.push(pid);
                    }
                }
            }
            Ok(())
        }
        Operation::Update {
            id,
            title,
            status,
            details,
            references,
            requirements,
        } => {
            update_task(
                list,
                id,
                TaskUpdate {
                    title: title.clone(),
                    status: *status,
                    details: details.clone(),
                    references: references.clone(),
                    requirements: requirements.clone(),
                },
            )?;
            if *status == Some(Status::Completed) {
                for pid in auto_complete_parents(list, id) {
                    if !auto_completed.contains(&pid) {
                        auto_completed.push(pid);
                    }
                }
            }
            Ok(())
        }
        Operation::Remove { id } => remove_task(list, markers, id),
        Operation::AddPhase { name } => add_phase(list, markers, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (TaskList, Vec<PhaseMarker>) {
        let mut list = TaskList::new("T");
        let mut one = Task::new("1", "One", Status::Pending);
        one.children
            .push(Task::new("1.1", "One-one", Status::Pending));
        one.children
            .push(Task::new("1.2", "One-two", Status::Completed));
        list.tasks.push(one);
        list.tasks.push(Task::new("2", "Two", Status::Pending));
        (list, Vec::new())
    }

    fn op(json: &str) -> Operation {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_batch_applies_in_array_order() {
        let (mut list, mut markers) = sample();
        // Remove 1.1 first, which renumbers 1.2 to 1.1; the update must see
        // the renumbered document
        let ops = vec![
            op(r#"{"type": "remove", "id": "1.1"}"#),
            op(r#"{"type": "update", "id": "1.1", "title": "Renamed"}"#),
        ];
        let resp = execute_batch(&mut list, &mut markers, &ops, false);
        assert!(resp.success);
        assert_eq!(resp.applied, 2);
        assert_eq!(list.find_task("1.1").unwrap().title, "Renamed");
    }

    #[test]
    fn test_batch_failure_leaves_document_untouched() {
        let (mut list, mut markers) = sample();
        let before = list.clone();
        let ops = vec![
            op(r#"{"type": "add", "title": "New"}"#),
            op(r#"{"type": "remove", "id": "99"}"#),
        ];
        let resp = execute_batch(&mut list, &mut markers, &ops, false);
        assert!(!resp.success);
        assert_eq!(resp.applied, 0);
        assert_eq!(resp.errors.len(), 1);
        assert_eq!(resp.errors[0].op_index, 1);
        assert_eq!(list, before);
    }

    #[test]
    fn test_batch_dry_run_previews_without_commit() {
        let (mut list, mut markers) = sample();
        let before = list.clone();
        let ops = vec![op(r#"{"type": "add", "title": "Previewed"}"#)];
        let resp = execute_batch(&mut list, &mut markers, &ops, true);
        assert!(resp.success);
        assert!(resp.preview.unwrap().contains("- [ ] 3. Previewed"));
        assert_eq!(list, before);
    }

    #[test]
    fn test_batch_auto_complete_cascade() {
        let (mut list, mut markers) = sample();
        let ops = vec![op(r#"{"type": "update", "id": "1.1", "status": 2}"#)];
        let resp = execute_batch(&mut list, &mut markers, &ops, false);
        assert!(resp.success);
        assert_eq!(resp.auto_completed, vec!["1"]);
        assert_eq!(list.find_task("1").unwrap().status, Status::Completed);
    }

    #[test]
    fn test_batch_add_with_phase_and_fields() {
        let (mut list, mut markers) = sample();
        let ops = vec![
            op(r#"{"type": "add-phase", "name": "Cleanup"}"#),
            op(r#"{"type": "add", "title": "Sweep", "phase": "Cleanup", "details": ["dust"], "requirements": ["3.1"]}"#),
        ];
        let resp = execute_batch(&mut list, &mut markers, &ops, false);
        assert!(resp.success, "{:?}", resp.errors);
        assert_eq!(markers.len(), 1);
        let task = list.find_task("3").unwrap();
        assert_eq!(task.title, "Sweep");
        assert_eq!(task.details, vec!["dust"]);
        assert_eq!(task.requirements, vec!["3.1"]);
    }

    #[test]
    fn test_batch_status_accepts_names() {
        let (mut list, mut markers) = sample();
        let ops = vec![op(
            r#"{"type": "update", "id": "2", "status": "in-progress"}"#,
        )];
        let resp = execute_batch(&mut list, &mut markers, &ops, false);
        assert!(resp.success);
        assert_eq!(list.find_task("2").unwrap().status, Status::InProgress);
    }

    #[test]
    fn test_batch_phase_conflicts_with_parent() {
        let (mut list, mut markers) = sample();
        let ops = vec![op(
            r#"{"type": "add", "title": "X", "phase": "P", "parent": "1"}"#,
        )];
        let resp = execute_batch(&mut list, &mut markers, &ops, false);
        assert!(!resp.success);
        assert_eq!(resp.errors[0].op_index, 0);
    }

    #[test]
    fn test_response_json_shape() {
        let resp = BatchResponse {
            success: false,
            applied: 0,
            errors: vec![BatchError {
                op_index: 3,
                message: "task not found: 9".to_string(),
            }],
            auto_completed: Vec::new(),
            preview: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"opIndex\":3"));
        assert!(json.contains("\"autoCompleted\":[]"));
        assert!(!json.contains("preview"));
    }
}
