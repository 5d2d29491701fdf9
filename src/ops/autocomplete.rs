use crate::model::{parent_id, Status, Task, TaskList};

/// Cascade completion up the parent chain after `task_id` was completed.
///
/// Walks from the task's parent toward the root; each parent whose children
/// are now all complete is marked complete itself, and the walk continues.
/// The first parent with incomplete children stops the cascade. Returns the
/// IDs of parents that were auto-completed, in bottom-up order.
pub fn auto_complete_parents(list: &mut TaskList, task_id: &str) -> Vec<String> {
    let mut completed = Vec::new();
    let mut current = task_id.to_string();

    while let Some(pid) = parent_id(&current).map(str::to_string) {
        let Some(parent) = list.find_task_mut(&pid) else {
            break;
        };
        if !all_children_complete(parent) {
            break;
        }
        if parent.status != Status::Completed {
            parent.status = Status::Completed;
            completed.push(pid.clone());
        }
        current = pid;
    }

    completed
}

fn all_children_complete(task: &Task) -> bool {
    task.children.iter().all(|child| {
        child.status == Status::Completed && all_children_complete(child)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> TaskList {
        let mut list = TaskList::new("T");
        let mut root = Task::new("1", "Root", Status::Pending);
        let mut mid = Task::new("1.1", "Mid", Status::Pending);
        mid.children
            .push(Task::new("1.1.1", "Leaf A", Status::Completed));
        mid.children
            .push(Task::new("1.1.2", "Leaf B", Status::Completed));
        root.children.push(mid);
        list.tasks.push(root);
        list
    }

    #[test]
    fn test_cascade_to_root() {
        let mut list = build();
        let completed = auto_complete_parents(&mut list, "1.1.2");
        assert_eq!(completed, vec!["1.1", "1"]);
        assert_eq!(list.find_task("1").unwrap().status, Status::Completed);
    }

    #[test]
    fn test_cascade_stops_at_incomplete_sibling() {
        let mut list = build();
        list.tasks[0]
            .children
            .push(Task::new("1.2", "Other", Status::Pending));
        let completed = auto_complete_parents(&mut list, "1.1.2");
        assert_eq!(completed, vec!["1.1"]);
        assert_eq!(list.find_task("1").unwrap().status, Status::Pending);
    }

    #[test]
    fn test_no_cascade_for_root_task() {
        let mut list = build();
        assert!(auto_complete_parents(&mut list, "1").is_empty());
    }

    #[test]
    fn test_already_complete_parent_skipped_but_cascade_continues() {
        let mut list = build();
        list.find_task_mut("1.1").unwrap().status = Status::Completed;
        let completed = auto_complete_parents(&mut list, "1.1.2");
        assert_eq!(completed, vec!["1"]);
        assert_eq!(list.find_task("1").unwrap().status, Status::Completed);
    }
}
