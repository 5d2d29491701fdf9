use crate::model::{PhaseMarker, Task, TaskList, MAX_TASKS};
use crate::ops::renumber::assign_ids;
use crate::ops::task_ops::{next_root_id, validate_new_task, TaskError};

/// Resolve each marker to the root index of its anchor task.
///
/// `None` means the marker sits before all tasks. A marker whose anchor ID
/// no longer exists is clamped by its leading ID segment so it is never
/// dropped.
pub(crate) fn anchor_indices(list: &TaskList, markers: &[PhaseMarker]) -> Vec<Option<usize>> {
    markers
        .iter()
        .map(|marker| {
            if marker.at_start() {
                return None;
            }
            if let Some(pos) = list.tasks.iter().position(|t| t.id == marker.after_task_id) {
                return Some(pos);
            }
            if list.tasks.is_empty() {
                return None;
            }
            let leading = marker
                .after_task_id
                .split('.')
                .next()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(usize::MAX);
            Some(leading.clamp(1, list.tasks.len()) - 1)
        })
        .collect()
}

/// Rewrite marker anchors from resolved root indices after a mutation.
pub(crate) fn restore_anchors(
    list: &TaskList,
    markers: &mut [PhaseMarker],
    anchors: &[Option<usize>],
) {
    for (marker, anchor) in markers.iter_mut().zip(anchors) {
        marker.after_task_id = match anchor {
            None => String::new(),
            Some(idx) => match list.tasks.get(*idx).or_else(|| list.tasks.last()) {
                Some(task) => task.id.clone(),
                None => String::new(),
            },
        };
    }
}

/// True if the document uses phase headers at all.
pub fn has_phases(markers: &[PhaseMarker]) -> bool {
    !markers.is_empty()
}

/// Append a new phase after all existing tasks.
pub fn add_phase(
    list: &TaskList,
    markers: &mut Vec<PhaseMarker>,
    name: &str,
) -> Result<(), TaskError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaskError::Validation("phase name cannot be empty".to_string()));
    }
    let anchor = list.tasks.last().map(|t| t.id.clone()).unwrap_or_default();
    markers.push(PhaseMarker::new(name, anchor));
    Ok(())
}

/// Add a root task at the end of the named phase, creating the phase at the
/// end of the document if it does not exist. Returns the new task's ID.
///
/// Inserting mid-document renumbers the whole list so the new task gets a
/// canonical ID.
pub fn add_task_to_phase(
    list: &mut TaskList,
    markers: &mut Vec<PhaseMarker>,
    phase: &str,
    task: Task,
) -> Result<String, TaskError> {
    validate_new_task(&task)?;
    if list.count_tasks() >= MAX_TASKS {
        return Err(TaskError::Validation(format!(
            "maximum of {MAX_TASKS} tasks exceeded"
        )));
    }
    let Some(m) = markers.iter().position(|marker| marker.name == phase) else {
        add_phase(list, markers, phase)?;
        let id = next_root_id(list);
        let mut task = task;
        task.id = id.clone();
        list.tasks.push(task);
        return Ok(id);
    };

    let anchors = anchor_indices(list, markers);

    // End of this phase: just past the anchor of the next phase header.
    // With no next header the phase runs to the end of the document.
    let insert_idx = match anchors.get(m + 1) {
        Some(Some(k)) => k + 1,
        Some(None) => 0,
        None => list.tasks.len(),
    };

    if insert_idx == list.tasks.len() {
        let id = next_root_id(list);
        let mut task = task;
        task.id = id.clone();
        list.tasks.push(task);
        return Ok(id);
    }

    let mut anchors = anchors;
    for (i, anchor) in anchors.iter_mut().enumerate() {
        if let Some(idx) = anchor {
            if *idx >= insert_idx {
                *idx += 1;
            } else if i > m && *idx + 1 == insert_idx {
                // Header that closed this phase now follows the new task
                *idx = insert_idx;
            }
        }
    }

    list.tasks.insert(insert_idx, task);
    assign_ids(&mut list.tasks, "");
    restore_anchors(list, markers, &anchors);
    Ok(list.tasks[insert_idx].id.clone())
}

/// Group root tasks by the phase they fall under. Tasks before the first
/// phase header are returned under an empty name.
pub fn tasks_by_phase<'a>(
    list: &'a TaskList,
    markers: &'a [PhaseMarker],
) -> Vec<(&'a str, Vec<&'a Task>)> {
    let anchors = anchor_indices(list, markers);
    let mut groups: Vec<(&str, Vec<&Task>)> = Vec::new();
    let mut boundaries: Vec<(usize, &str)> = Vec::new();
    for (marker, anchor) in markers.iter().zip(&anchors) {
        let start = anchor.map_or(0, |i| i + 1);
        boundaries.push((start, marker.name.as_str()));
    }

    let first = boundaries.first().map_or(list.tasks.len(), |(s, _)| *s);
    if first > 0 {
        groups.push(("", list.tasks[..first].iter().collect()));
    }
    for (i, (start, name)) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(i + 1)
            .map_or(list.tasks.len(), |(s, _)| *s);
        let slice = if *start <= end { &list.tasks[*start..end] } else { &[] };
        groups.push((name, slice.iter().collect()));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn list_with(n: usize) -> TaskList {
        let mut list = TaskList::new("T");
        for i in 1..=n {
            list.tasks
                .push(Task::new(i.to_string(), format!("Task {i}"), Status::Pending));
        }
        list
    }

    #[test]
    fn test_add_phase_anchors_to_last_task() {
        let list = list_with(2);
        let mut markers = Vec::new();
        add_phase(&list, &mut markers, "Cleanup").unwrap();
        assert_eq!(markers[0], PhaseMarker::new("Cleanup", "2"));
    }

    #[test]
    fn test_add_phase_empty_list() {
        let list = TaskList::new("T");
        let mut markers = Vec::new();
        add_phase(&list, &mut markers, "First").unwrap();
        assert!(markers[0].at_start());
        assert!(add_phase(&list, &mut markers, "   ").is_err());
    }

    #[test]
    fn test_add_task_to_last_phase_appends() {
        let mut list = list_with(2);
        let mut markers = vec![PhaseMarker::new("Only", "")];
        let id = add_task_to_phase(
            &mut list,
            &mut markers,
            "Only",
            Task::new("", "New", Status::Pending),
        )
        .unwrap();
        assert_eq!(id, "3");
        assert_eq!(list.tasks[2].title, "New");
    }

    #[test]
    fn test_add_task_to_middle_phase_inserts_and_renumbers() {
        let mut list = list_with(3);
        let mut markers = vec![
            PhaseMarker::new("A", ""),
            PhaseMarker::new("B", "1"),
            PhaseMarker::new("C", "2"),
        ];
        // Phase A holds task 1; inserting there pushes tasks 2 and 3 down
        let id = add_task_to_phase(
            &mut list,
            &mut markers,
            "A",
            Task::new("", "New", Status::Pending),
        )
        .unwrap();
        assert_eq!(id, "2");
        assert_eq!(list.tasks[1].title, "New");
        assert_eq!(list.tasks[3].title, "Task 3");
        // B's boundary moves to the new task; C follows the shifted task
        assert_eq!(markers[1].after_task_id, "2");
        assert_eq!(markers[2].after_task_id, "3");
    }

    #[test]
    fn test_add_task_creates_missing_phase() {
        let mut list = list_with(1);
        let mut markers = vec![PhaseMarker::new("A", "")];
        let id = add_task_to_phase(
            &mut list,
            &mut markers,
            "Later",
            Task::new("", "New", Status::Pending),
        )
        .unwrap();
        assert_eq!(id, "2");
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[1], PhaseMarker::new("Later", "1"));
    }

    #[test]
    fn test_add_task_to_phase_respects_task_limit() {
        let mut list = list_with(MAX_TASKS);
        let mut markers = vec![PhaseMarker::new("Full", "")];
        let err = add_task_to_phase(
            &mut list,
            &mut markers,
            "Full",
            Task::new("", "One too many", Status::Pending),
        )
        .unwrap_err();
        assert!(err.to_string().contains("maximum"));
        assert_eq!(list.tasks.len(), MAX_TASKS);
    }

    #[test]
    fn test_tasks_by_phase() {
        let list = list_with(3);
        let markers = vec![PhaseMarker::new("Rest", "1")];
        let groups = tasks_by_phase(&list, &markers);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "");
        assert_eq!(groups[0].1.len(), 1);
        assert_eq!(groups[1].0, "Rest");
        assert_eq!(groups[1].1.len(), 2);
    }
}
