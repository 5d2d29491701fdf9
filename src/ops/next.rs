use crate::model::{Status, Task};

/// The next piece of actionable work: the first incomplete task in document
/// order, along with its incomplete children for context.
#[derive(Debug)]
pub struct NextTask<'a> {
    pub task: &'a Task,
    pub incomplete_children: Vec<&'a Task>,
}

/// Find the first task in document order that is not completed.
pub fn find_next_incomplete<'a>(tasks: &'a [Task]) -> Option<NextTask<'a>> {
    for task in tasks {
        if task.status != Status::Completed {
            let incomplete_children = task
                .children
                .iter()
                .filter(|c| c.status != Status::Completed)
                .collect();
            return Some(NextTask {
                task,
                incomplete_children,
            });
        }
        // A completed parent can still hide incomplete descendants
        if let Some(found) = find_next_incomplete(&task.children) {
            return Some(found);
        }
    }
    None
}
