use crate::model::{PhaseMarker, Task, TaskList, DEFAULT_REQUIREMENTS_FILE};
use crate::parse::front_matter;

/// Render a task list in canonical form, without phase headers.
pub fn render_markdown(list: &TaskList) -> String {
    render_markdown_with_phases(list, &[])
}

/// Render a task list in canonical form with `## Phase` headers interleaved.
///
/// Canonical form: optional front matter, `# Title`, one blank line, then
/// each root task's subtree as a contiguous block, blocks separated by a
/// single blank line. Phase headers appear after the block of the root task
/// they are anchored to; markers whose anchor no longer exists are appended
/// at the end rather than dropped.
pub fn render_markdown_with_phases(list: &TaskList, markers: &[PhaseMarker]) -> String {
    let req_file = list
        .requirements_file
        .as_deref()
        .unwrap_or(DEFAULT_REQUIREMENTS_FILE);

    // Each block ends with a newline; blocks are joined with a blank line.
    let mut blocks: Vec<String> = Vec::new();

    let fm = front_matter::encode(list.front_matter.as_ref());
    if !fm.is_empty() {
        blocks.push(fm);
    }
    if !list.title.is_empty() {
        blocks.push(format!("# {}\n", list.title));
    }

    let mut emitted = vec![false; markers.len()];
    for (i, marker) in markers.iter().enumerate() {
        if marker.at_start() {
            blocks.push(format!("## {}\n", marker.name));
            emitted[i] = true;
        }
    }

    for task in &list.tasks {
        let mut block = String::new();
        render_task(&mut block, task, 0, req_file);
        blocks.push(block);
        for (i, marker) in markers.iter().enumerate() {
            if !emitted[i] && marker.after_task_id == task.id {
                blocks.push(format!("## {}\n", marker.name));
                emitted[i] = true;
            }
        }
    }

    // Orphaned markers keep their recorded order at the end of the document
    for (i, marker) in markers.iter().enumerate() {
        if !emitted[i] {
            blocks.push(format!("## {}\n", marker.name));
        }
    }

    blocks.join("\n")
}

fn render_task(out: &mut String, task: &Task, depth: usize, req_file: &str) {
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push_str("- ");
    out.push_str(task.status.checkbox());
    out.push(' ');
    out.push_str(&task.id);
    out.push_str(". ");
    out.push_str(&task.title);
    out.push('\n');

    let child_indent = "  ".repeat(depth + 1);
    for detail in &task.details {
        out.push_str(&child_indent);
        out.push_str("- ");
        out.push_str(detail);
        out.push('\n');
    }
    if !task.references.is_empty() {
        out.push_str(&child_indent);
        out.push_str("- References: ");
        out.push_str(&task.references.join(", "));
        out.push('\n');
    }
    if !task.requirements.is_empty() {
        let links: Vec<String> = task
            .requirements
            .iter()
            .map(|id| format!("[{id}]({req_file}#{id})"))
            .collect();
        out.push_str(&child_indent);
        out.push_str("- Requirements: ");
        out.push_str(&links.join(", "));
        out.push('\n');
    }
    for child in &task.children {
        render_task(out, child, depth + 1, req_file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Status, TaskList};
    use crate::parse::parse_markdown;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_minimal() {
        let mut list = TaskList::new("My Tasks");
        list.tasks.push(Task::new("1", "First", Status::Pending));
        assert_eq!(render_markdown(&list), "# My Tasks\n\n- [ ] 1. First\n");
    }

    #[test]
    fn test_render_subtree_contiguous() {
        let mut list = TaskList::new("T");
        let mut root = Task::new("1", "Parent", Status::InProgress);
        root.details.push("context".to_string());
        root.children
            .push(Task::new("1.1", "Child", Status::Completed));
        list.tasks.push(root);
        list.tasks.push(Task::new("2", "Second", Status::Pending));

        let expected = "\
# T

- [-] 1. Parent
  - context
  - [x] 1.1. Child

- [ ] 2. Second
";
        assert_eq!(render_markdown(&list), expected);
    }

    #[test]
    fn test_render_requirements_default_file() {
        let mut list = TaskList::new("T");
        let mut task = Task::new("1", "A", Status::Pending);
        task.requirements.push("1.2".to_string());
        list.tasks.push(task);
        assert!(
            render_markdown(&list)
                .contains("- Requirements: [1.2](requirements.md#1.2)")
        );
    }

    #[test]
    fn test_render_phases() {
        let mut list = TaskList::new("T");
        list.tasks.push(Task::new("1", "A", Status::Pending));
        list.tasks.push(Task::new("2", "B", Status::Pending));
        let markers = vec![
            PhaseMarker::new("Setup", ""),
            PhaseMarker::new("Build", "1"),
        ];
        let expected = "\
# T

## Setup

- [ ] 1. A

## Build

- [ ] 2. B
";
        assert_eq!(render_markdown_with_phases(&list, &markers), expected);
    }

    #[test]
    fn test_render_orphaned_marker_kept() {
        let mut list = TaskList::new("T");
        list.tasks.push(Task::new("1", "A", Status::Pending));
        let markers = vec![PhaseMarker::new("Ghost", "9")];
        let out = render_markdown_with_phases(&list, &markers);
        assert!(out.ends_with("## Ghost\n"));
    }

    #[test]
    fn test_canonical_round_trip() {
        let content = "\
---
references:
  - design.md
metadata:
  version: \"1.0\"
---

# Project

## Phase One

- [-] 1. Parent
  - a detail line
  - References: src/lib.rs
  - Requirements: [2.1](reqs.md#2.1)
  - [x] 1.1. Done child

## Phase Two

- [ ] 2. Second
";
        let (list, markers) = parse_markdown(content).unwrap();
        assert_eq!(render_markdown_with_phases(&list, &markers), content);
    }
}
