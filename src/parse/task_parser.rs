use std::sync::LazyLock;

use regex::Regex;

use crate::model::{
    is_valid_id, validate_detail, validate_reference, validate_title, PhaseMarker, Status, Task,
    TaskList, MAX_DEPTH, MAX_TASKS,
};
use crate::parse::{front_matter, ParseError, MAX_FILE_SIZE};

static TASK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- (\[[ \-xX]\]) (\d+(?:\.\d+)*)\. (.+)$").unwrap());
static CHECKBOX_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[ \-xX]\]").unwrap());
static ANY_CHECKBOX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[[^\]]*\]").unwrap());
static REQUIREMENT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^#)]+)#[^)]*\)").unwrap());

/// Parse a full task document: optional front matter, a `# Title` header,
/// task lines with their details, and `## Phase` headers.
///
/// The parser is strict: any line it cannot classify is an error rather than
/// being skipped. Literal task IDs are preserved exactly as written; only
/// their depth is checked against indentation, so a non-contiguous document
/// survives a load/save cycle untouched.
pub fn parse_markdown(content: &str) -> Result<(TaskList, Vec<PhaseMarker>), ParseError> {
    if content.len() > MAX_FILE_SIZE {
        return Err(ParseError::TooLarge(content.len()));
    }

    let (fm, body) = front_matter::decode(content)?;
    // Line numbers are reported against the whole document
    let offset = content[..content.len() - body.len()].lines().count();

    let mut list = TaskList::new("");
    list.front_matter = fm;
    let mut markers: Vec<PhaseMarker> = Vec::new();
    let mut have_title = false;
    // Index path to the most recent task at each depth
    let mut path: Vec<usize> = Vec::new();
    let mut last_root_id = String::new();
    let mut task_count = 0usize;

    for (idx, raw) in body.lines().enumerate() {
        let line_no = offset + idx + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if line.trim().is_empty() {
            continue;
        }
        if line.contains('\t') {
            return Err(ParseError::at(line_no, "tabs are not allowed"));
        }
        if line.chars().any(|c| c.is_control()) {
            return Err(ParseError::at(line_no, "control characters are not allowed"));
        }

        let spaces = line.len() - line.trim_start_matches(' ').len();
        if spaces % 2 != 0 {
            return Err(ParseError::at(
                line_no,
                "indentation must be a multiple of two spaces",
            ));
        }
        let depth = spaces / 2;
        let content = &line[spaces..];

        if depth == 0 {
            if let Some(name) = content.strip_prefix("## ") {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ParseError::at(line_no, "empty phase name"));
                }
                markers.push(PhaseMarker::new(name, last_root_id.clone()));
                continue;
            }
            if let Some(title) = content.strip_prefix("# ") {
                if have_title {
                    return Err(ParseError::at(line_no, "duplicate title header"));
                }
                if !list.tasks.is_empty() || !markers.is_empty() {
                    return Err(ParseError::at(
                        line_no,
                        "title header must appear before any tasks",
                    ));
                }
                validate_title(title).map_err(|e| ParseError::at(line_no, e))?;
                list.title = title.to_string();
                have_title = true;
                continue;
            }
        }

        if let Some(caps) = TASK_LINE.captures(content) {
            if depth > path.len() {
                return Err(ParseError::at(line_no, "unexpected indentation"));
            }
            if depth + 1 > MAX_DEPTH {
                return Err(ParseError::at(
                    line_no,
                    format!("maximum nesting depth of {MAX_DEPTH} exceeded"),
                ));
            }
            let status = Status::from_checkbox(&caps[1])
                .ok_or_else(|| ParseError::at(line_no, format!("invalid status: {}", &caps[1])))?;
            let id = caps[2].to_string();
            if !is_valid_id(&id) {
                return Err(ParseError::at(line_no, format!("invalid task ID: {id}")));
            }
            if id.split('.').count() != depth + 1 {
                return Err(ParseError::at(
                    line_no,
                    format!("task ID {id} does not match its indentation depth"),
                ));
            }
            let title = caps[3].to_string();
            validate_title(&title).map_err(|e| ParseError::at(line_no, e))?;

            task_count += 1;
            if task_count > MAX_TASKS {
                return Err(ParseError::at(
                    line_no,
                    format!("maximum of {MAX_TASKS} tasks exceeded"),
                ));
            }

            let task = Task::new(id.clone(), title, status);
            if depth == 0 {
                last_root_id = id;
                list.tasks.push(task);
                path.clear();
                path.push(list.tasks.len() - 1);
            } else {
                path.truncate(depth);
                let parent = task_at(&mut list.tasks, &path);
                parent.children.push(task);
                let child_idx = parent.children.len() - 1;
                path.push(child_idx);
            }
            continue;
        }

        if let Some(rest) = content.strip_prefix("- ") {
            // Detail-style line belonging to the task one level up
            if depth == 0 || depth > path.len() {
                return Err(ParseError::at(
                    line_no,
                    "unexpected content at this indentation level",
                ));
            }
            diagnose_bad_task_line(rest, line_no)?;

            let owner_path = &path[..depth];
            let req_file = parse_requirements(rest);
            let owner = task_at(&mut list.tasks, owner_path);
            if !owner.children.is_empty() {
                return Err(ParseError::at(
                    line_no,
                    "detail lines must appear before child tasks",
                ));
            }

            if let Some(refs) = rest.strip_prefix("References: ") {
                let refs: Vec<String> =
                    refs.split(',').map(|r| r.trim().to_string()).collect();
                for r in &refs {
                    validate_reference(r).map_err(|e| ParseError::at(line_no, e))?;
                }
                owner.references = refs;
                continue;
            }
            if let Some((ids, files)) = req_file {
                owner.requirements = ids;
                for file in files {
                    merge_requirements_file(&mut list.requirements_file, file)?;
                }
                continue;
            }
            validate_detail(rest).map_err(|e| ParseError::at(line_no, e))?;
            owner.details.push(rest.to_string());
            continue;
        }

        return Err(ParseError::at(
            line_no,
            "unexpected content at this indentation level",
        ));
    }

    Ok((list, markers))
}

// Navigate to the task at an index path. Callers guarantee the path is valid.
fn task_at<'a>(tasks: &'a mut [Task], path: &[usize]) -> &'a mut Task {
    let mut task = &mut tasks[path[0]];
    for &idx in &path[1..] {
        task = &mut task.children[idx];
    }
    task
}

/// Report a specific error for lines that were clearly meant to be tasks
/// but are malformed, instead of silently treating them as details.
fn diagnose_bad_task_line(rest: &str, line_no: usize) -> Result<(), ParseError> {
    if let Some(m) = CHECKBOX_PREFIX.find(rest) {
        let after = &rest[m.end()..];
        if !after.starts_with(' ') {
            return Err(ParseError::at(line_no, "missing space after checkbox"));
        }
        // Valid checkbox with a space but no ID matched the task pattern
        return Err(ParseError::at(
            line_no,
            "invalid task format: missing task number",
        ));
    }
    if let Some(m) = ANY_CHECKBOX.find(rest) {
        return Err(ParseError::at(
            line_no,
            format!("invalid status: {}", m.as_str()),
        ));
    }
    Ok(())
}

/// Parse a `Requirements:` line into requirement IDs and the file each link
/// points at. Returns None if the line is not a requirements line with at
/// least one well-formed link, in which case it is kept as a plain detail.
fn parse_requirements(rest: &str) -> Option<(Vec<String>, Vec<String>)> {
    let body = rest.strip_prefix("Requirements: ")?;
    let mut ids = Vec::new();
    let mut files = Vec::new();
    for caps in REQUIREMENT_LINK.captures_iter(body) {
        let id = caps[1].to_string();
        if !is_valid_id(&id) {
            continue;
        }
        ids.push(id);
        files.push(caps[2].to_string());
    }
    if files.is_empty() {
        return None;
    }
    Some((ids, files))
}

fn merge_requirements_file(
    current: &mut Option<String>,
    file: String,
) -> Result<(), ParseError> {
    match current {
        None => {
            *current = Some(file);
            Ok(())
        }
        Some(existing) if *existing == file => Ok(()),
        Some(existing) => Err(ParseError::RequirementsFileMismatch {
            first: existing.clone(),
            second: file,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_minimal() {
        let (list, markers) = parse_markdown("# My Tasks\n\n- [ ] 1. First task\n").unwrap();
        assert_eq!(list.title, "My Tasks");
        assert_eq!(list.tasks.len(), 1);
        assert_eq!(list.tasks[0].id, "1");
        assert_eq!(list.tasks[0].status, Status::Pending);
        assert!(markers.is_empty());
    }

    #[test]
    fn test_parse_hierarchy_and_details() {
        let content = "\
# Project

- [-] 1. Parent
  - some context
  - References: src/main.rs, docs/a.md
  - [x] 1.1. Child
    - [ ] 1.1.1. Grandchild
- [ ] 2. Second
";
        let (list, _) = parse_markdown(content).unwrap();
        assert_eq!(list.tasks.len(), 2);
        let parent = &list.tasks[0];
        assert_eq!(parent.details, vec!["some context"]);
        assert_eq!(parent.references, vec!["src/main.rs", "docs/a.md"]);
        assert_eq!(parent.children[0].children[0].id, "1.1.1");
    }

    #[test]
    fn test_parse_preserves_literal_ids() {
        // Non-contiguous IDs survive parsing untouched
        let content = "# T\n\n- [ ] 2. Only task\n  - [ ] 2.5. Child\n";
        let (list, _) = parse_markdown(content).unwrap();
        assert_eq!(list.tasks[0].id, "2");
        assert_eq!(list.tasks[0].children[0].id, "2.5");
    }

    #[test]
    fn test_parse_phases() {
        let content = "\
# T

## Setup

- [ ] 1. A

## Build

- [ ] 2. B
- [ ] 3. C
";
        let (list, markers) = parse_markdown(content).unwrap();
        assert_eq!(list.tasks.len(), 3);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0], PhaseMarker::new("Setup", ""));
        assert_eq!(markers[1], PhaseMarker::new("Build", "1"));
    }

    #[test]
    fn test_parse_requirements_links() {
        let content =
            "# T\n\n- [ ] 1. A\n  - Requirements: [1.1](reqs.md#1.1), [2.3](reqs.md#2.3)\n";
        let (list, _) = parse_markdown(content).unwrap();
        assert_eq!(list.tasks[0].requirements, vec!["1.1", "2.3"]);
        assert_eq!(list.requirements_file.as_deref(), Some("reqs.md"));
    }

    #[test]
    fn test_parse_requirements_file_mismatch() {
        let content = "\
# T

- [ ] 1. A
  - Requirements: [1.1](a.md#1.1)
- [ ] 2. B
  - Requirements: [1.2](b.md#1.2)
";
        assert!(matches!(
            parse_markdown(content),
            Err(ParseError::RequirementsFileMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_requirements_file_mismatch_within_line() {
        let content = "# T\n\n- [ ] 1. A\n  - Requirements: [1.1](a.md#1.1), [1.2](b.md#1.2)\n";
        assert!(matches!(
            parse_markdown(content),
            Err(ParseError::RequirementsFileMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_requirements_without_links_is_detail() {
        let content = "# T\n\n- [ ] 1. A\n  - Requirements: none yet\n";
        let (list, _) = parse_markdown(content).unwrap();
        assert!(list.tasks[0].requirements.is_empty());
        assert_eq!(list.tasks[0].details, vec!["Requirements: none yet"]);
    }

    #[test]
    fn test_parse_errors() {
        // tab indentation
        assert!(parse_markdown("# T\n\n\t- [ ] 1. A\n").is_err());
        // odd indentation
        assert!(parse_markdown("# T\n\n - [ ] 1. A\n").is_err());
        // depth jump
        assert!(parse_markdown("# T\n\n- [ ] 1. A\n    - [ ] 1.1.1. B\n").is_err());
        // ID depth mismatch
        assert!(parse_markdown("# T\n\n- [ ] 1.1. A\n").is_err());
        // duplicate title
        assert!(parse_markdown("# A\n# B\n").is_err());
        // title after tasks
        assert!(parse_markdown("- [ ] 1. A\n# Late\n").is_err());
        // unknown content
        assert!(parse_markdown("# T\n\nrandom prose\n").is_err());
    }

    #[test]
    fn test_parse_untitled_fragment() {
        let (list, _) = parse_markdown("- [ ] 1. A\n").unwrap();
        assert_eq!(list.title, "");
        assert_eq!(list.tasks[0].title, "A");

        // The indent error is reported even without a title header
        let err = parse_markdown("- [ ] 1. T\n    - [ ] 1.1. Bad indent\n").unwrap_err();
        assert_eq!(err.to_string(), "line 2: unexpected indentation");
    }

    #[test]
    fn test_parse_near_miss_diagnostics() {
        let err = parse_markdown("# T\n\n- [ ] 1. A\n  - [?] oops\n").unwrap_err();
        assert!(err.to_string().contains("invalid status"));

        let err = parse_markdown("# T\n\n- [ ] 1. A\n  - [x]no space\n").unwrap_err();
        assert!(err.to_string().contains("missing space after checkbox"));

        let err = parse_markdown("# T\n\n- [ ] 1. A\n  - [x] no number\n").unwrap_err();
        assert!(err.to_string().contains("missing task number"));
    }

    #[test]
    fn test_parse_details_after_children_rejected() {
        let content = "# T\n\n- [ ] 1. A\n  - [ ] 1.1. B\n  - stray detail\n";
        let err = parse_markdown(content).unwrap_err();
        assert!(err.to_string().contains("before child tasks"));
    }

    #[test]
    fn test_parse_accepts_capital_x() {
        let (list, _) = parse_markdown("# T\n\n- [X] 1. Done\n").unwrap();
        assert_eq!(list.tasks[0].status, Status::Completed);
    }

    #[test]
    fn test_parse_with_front_matter() {
        let content = "---\nreferences:\n  - design.md\n---\n\n# T\n\n- [ ] 1. A\n";
        let (list, _) = parse_markdown(content).unwrap();
        assert_eq!(
            list.front_matter.as_ref().unwrap().references,
            vec!["design.md"]
        );
        assert_eq!(list.title, "T");
    }

    #[test]
    fn test_parse_crlf() {
        let (list, _) = parse_markdown("# T\r\n\r\n- [ ] 1. A\r\n").unwrap();
        assert_eq!(list.tasks[0].title, "A");
    }
}
