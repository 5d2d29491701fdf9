use crate::model::{PhaseMarker, Task, TaskList};
use crate::ops::phase_ops::{anchor_indices, restore_anchors};

/// Rewrite every task ID to its canonical position-derived value: root tasks
/// are `1..n` in order, children append `.1..m`.
///
/// Phase markers are re-anchored by root index so they stay attached to the
/// same task even when its ID changes.
pub fn renumber(list: &mut TaskList, markers: &mut [PhaseMarker]) {
    let anchors = anchor_indices(list, markers);
    assign_ids(&mut list.tasks, "");
    restore_anchors(list, markers, &anchors);
}

/// Assign canonical IDs to a subtree. `prefix` is the parent ID, empty at
/// the root.
pub(crate) fn assign_ids(tasks: &mut [Task], prefix: &str) {
    for (i, task) in tasks.iter_mut().enumerate() {
        task.id = if prefix.is_empty() {
            (i + 1).to_string()
        } else {
            format!("{prefix}.{}", i + 1)
        };
        assign_ids(&mut task.children, &task.id);
    }
}
