use crate::model::{
    is_valid_id, parent_id, validate_detail, validate_reference, validate_title, PhaseMarker,
    Status, Task, TaskList, MAX_DEPTH, MAX_TASKS,
};
use crate::ops::phase_ops::{anchor_indices, restore_anchors};
use crate::ops::renumber::assign_ids;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("parent task not found: {0}")]
    ParentNotFound(String),
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    #[error("{0}")]
    Validation(String),
}

/// Fields to change on an existing task. `None` leaves the field untouched.
#[derive(Debug, Default, Clone)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub details: Option<Vec<String>>,
    pub references: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
}

/// Canonical ID for a task appended at the root level: one past the last
/// root task's leading segment, so appends never disturb existing IDs.
pub(crate) fn next_root_id(list: &TaskList) -> String {
    next_sibling_id(&list.tasks, "")
}

fn next_sibling_id(siblings: &[Task], prefix: &str) -> String {
    let next = siblings
        .last()
        .and_then(|t| t.id.rsplit('.').next())
        .and_then(|seg| seg.parse::<usize>().ok())
        .map(|n| n + 1)
        .unwrap_or(siblings.len() + 1);
    if prefix.is_empty() {
        next.to_string()
    } else {
        format!("{prefix}.{next}")
    }
}

pub(crate) fn validate_new_task(task: &Task) -> Result<(), TaskError> {
    validate_title(&task.title).map_err(TaskError::Validation)?;
    for detail in &task.details {
        validate_detail(detail).map_err(TaskError::Validation)?;
    }
    for reference in &task.references {
        validate_reference(reference).map_err(TaskError::Validation)?;
    }
    for req in &task.requirements {
        if !is_valid_id(req) {
            return Err(TaskError::Validation(format!(
                "invalid requirement ID: {req}"
            )));
        }
    }
    Ok(())
}

/// Add a task, appending by default or inserting at an explicit position.
///
/// Appends never renumber, so documents with non-contiguous IDs are left
/// undisturbed. A positional insert (`position` like `2.3` means third child
/// of task 2) renumbers the whole document; a position past the end of the
/// sibling list degrades to an append. Returns the new task's ID.
pub fn add_task(
    list: &mut TaskList,
    markers: &mut [PhaseMarker],
    parent: Option<&str>,
    position: Option<&str>,
    mut task: Task,
) -> Result<String, TaskError> {
    validate_new_task(&task)?;
    if list.count_tasks() >= MAX_TASKS {
        return Err(TaskError::Validation(format!(
            "maximum of {MAX_TASKS} tasks exceeded"
        )));
    }

    if let Some(pos) = position {
        if !is_valid_id(pos) {
            return Err(TaskError::InvalidPosition(pos.to_string()));
        }
        let pos_parent = parent_id(pos);
        if let Some(p) = parent {
            if pos_parent != Some(p) {
                return Err(TaskError::InvalidPosition(format!(
                    "position {pos} is not under parent {p}"
                )));
            }
        }
        return insert_at(list, markers, pos_parent, pos, task);
    }

    match parent {
        None => {
            let id = next_root_id(list);
            task.id = id.clone();
            list.tasks.push(task);
            Ok(id)
        }
        Some(p) => {
            if p.split('.').count() + 1 > MAX_DEPTH {
                return Err(TaskError::Validation(format!(
                    "maximum nesting depth of {MAX_DEPTH} exceeded"
                )));
            }
            let Some(parent_task) = list.find_task_mut(p) else {
                return Err(TaskError::ParentNotFound(p.to_string()));
            };
            let id = next_sibling_id(&parent_task.children, &parent_task.id);
            task.id = id.clone();
            parent_task.children.push(task);
            Ok(id)
        }
    }
}

fn insert_at(
    list: &mut TaskList,
    markers: &mut [PhaseMarker],
    parent: Option<&str>,
    pos: &str,
    task: Task,
) -> Result<String, TaskError> {
    if pos.split('.').count() > MAX_DEPTH {
        return Err(TaskError::Validation(format!(
            "maximum nesting depth of {MAX_DEPTH} exceeded"
        )));
    }
    let slot = pos
        .rsplit('.')
        .next()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| TaskError::InvalidPosition(pos.to_string()))?
        - 1;

    let mut anchors = anchor_indices(list, markers);

    // Record the insertion point as a tree index path so the new task can
    // be located again after renumbering rewrites every ID.
    let path = match parent {
        None => {
            let idx = slot.min(list.tasks.len());
            for anchor in anchors.iter_mut().flatten() {
                if *anchor >= idx {
                    *anchor += 1;
                }
            }
            list.tasks.insert(idx, task);
            vec![idx]
        }
        Some(p) => {
            let Some(mut path) = index_path(&list.tasks, p) else {
                return Err(TaskError::ParentNotFound(p.to_string()));
            };
            let parent_task = task_at_path(&mut list.tasks, &path);
            let idx = slot.min(parent_task.children.len());
            parent_task.children.insert(idx, task);
            path.push(idx);
            path
        }
    };

    assign_ids(&mut list.tasks, "");
    restore_anchors(list, markers, &anchors);
    Ok(task_at_path(&mut list.tasks, &path).id.clone())
}

fn index_path(tasks: &[Task], task_id: &str) -> Option<Vec<usize>> {
    for (i, task) in tasks.iter().enumerate() {
        if task.id == task_id {
            return Some(vec![i]);
        }
        if let Some(mut rest) = index_path(&task.children, task_id) {
            rest.insert(0, i);
            return Some(rest);
        }
    }
    None
}

fn task_at_path<'a>(tasks: &'a mut [Task], path: &[usize]) -> &'a mut Task {
    let mut task = &mut tasks[path[0]];
    for &idx in &path[1..] {
        task = &mut task.children[idx];
    }
    task
}

/// Remove a task and its whole subtree, then renumber.
///
/// A phase marker anchored to a removed root task re-anchors to the previous
/// root task, or to the start of the list.
pub fn remove_task(
    list: &mut TaskList,
    markers: &mut [PhaseMarker],
    task_id: &str,
) -> Result<(), TaskError> {
    let mut anchors = anchor_indices(list, markers);

    match parent_id(task_id) {
        None => {
            let Some(idx) = list.tasks.iter().position(|t| t.id == task_id) else {
                return Err(TaskError::NotFound(task_id.to_string()));
            };
            for anchor in anchors.iter_mut() {
                if let Some(i) = anchor {
                    if *i == idx {
                        *anchor = if idx == 0 { None } else { Some(idx - 1) };
                    } else if *i > idx {
                        *anchor = Some(*i - 1);
                    }
                }
            }
            list.tasks.remove(idx);
        }
        Some(parent) => {
            let Some(parent_task) = list.find_task_mut(parent) else {
                return Err(TaskError::NotFound(task_id.to_string()));
            };
            let Some(idx) = parent_task.children.iter().position(|t| t.id == task_id) else {
                return Err(TaskError::NotFound(task_id.to_string()));
            };
            parent_task.children.remove(idx);
        }
    }

    assign_ids(&mut list.tasks, "");
    restore_anchors(list, markers, &anchors);
    Ok(())
}

/// Apply a partial update to an existing task.
pub fn update_task(
    list: &mut TaskList,
    task_id: &str,
    update: TaskUpdate,
) -> Result<(), TaskError> {
    if let Some(title) = &update.title {
        validate_title(title).map_err(TaskError::Validation)?;
    }
    if let Some(details) = &update.details {
        for detail in details {
            validate_detail(detail).map_err(TaskError::Validation)?;
        }
    }
    if let Some(references) = &update.references {
        for reference in references {
            validate_reference(reference).map_err(TaskError::Validation)?;
        }
    }
    if let Some(requirements) = &update.requirements {
        for req in requirements {
            if !is_valid_id(req) {
                return Err(TaskError::Validation(format!(
                    "invalid requirement ID: {req}"
                )));
            }
        }
    }

    let Some(task) = list.find_task_mut(task_id) else {
        return Err(TaskError::NotFound(task_id.to_string()));
    };
    if let Some(title) = update.title {
        task.title = title;
    }
    if let Some(status) = update.status {
        task.status = status;
    }
    if let Some(details) = update.details {
        task.details = details;
    }
    if let Some(references) = update.references {
        task.references = references;
    }
    if let Some(requirements) = update.requirements {
        task.requirements = requirements;
    }
    Ok(())
}

/// Set just the status of a task.
pub fn update_status(
    list: &mut TaskList,
    task_id: &str,
    status: Status,
) -> Result<(), TaskError> {
    let Some(task) = list.find_task_mut(task_id) else {
        return Err(TaskError::NotFound(task_id.to_string()));
    };
    task.status = status;
    Ok(())
}
