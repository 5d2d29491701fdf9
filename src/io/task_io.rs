use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::{PhaseMarker, TaskList};
use crate::parse::{parse_markdown, render_markdown_with_phases, ParseError};

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("task file not found: {0}")]
    NotFound(PathBuf),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read and parse a task file.
pub fn read_file(path: &Path) -> Result<(TaskList, Vec<PhaseMarker>), FileError> {
    validate_path(path)?;
    if !path.exists() {
        return Err(FileError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let (mut list, markers) = parse_markdown(&content)?;
    if let Ok(mtime) = fs::metadata(path).and_then(|m| m.modified()) {
        list.modified = mtime.into();
    }
    Ok((list, markers))
}

/// Render and write a task file atomically: the content lands in a temp
/// file in the same directory and is renamed over the target, so a crash
/// never leaves a half-written document.
pub fn write_file(
    path: &Path,
    list: &TaskList,
    markers: &[PhaseMarker],
) -> Result<(), FileError> {
    validate_path(path)?;
    let content = render_markdown_with_phases(list, markers);
    atomic_write(path, content.as_bytes())?;
    Ok(())
}

/// Like [`write_file`], but first copies the existing file to `<path>.bak`.
/// Used by renumbering, which rewrites every ID in the document.
pub fn write_with_backup(
    path: &Path,
    list: &TaskList,
    markers: &[PhaseMarker],
) -> Result<PathBuf, FileError> {
    validate_path(path)?;
    let backup = backup_path(path);
    if path.exists() {
        fs::copy(path, &backup)?;
    }
    write_file(path, list, markers)?;
    Ok(backup)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".bak");
    PathBuf::from(os)
}

/// Write `content` to `path` atomically using a temp file + rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// Reject paths with embedded control characters before they reach the
// filesystem; everything else is the OS's problem.
fn validate_path(path: &Path) -> Result<(), FileError> {
    let Some(s) = path.to_str() else {
        return Err(FileError::InvalidPath(path.display().to_string()));
    };
    if s.is_empty() {
        return Err(FileError::InvalidPath("empty path".to_string()));
    }
    if s.chars().any(|c| c.is_control()) {
        return Err(FileError::InvalidPath(
            "path contains control characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Status, Task};

    #[test]
    fn test_write_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.md");

        let mut list = TaskList::new("Round trip");
        list.tasks.push(Task::new("1", "First", Status::Pending));
        let markers = vec![PhaseMarker::new("P", "")];

        write_file(&path, &list, &markers).unwrap();
        let (read, read_markers) = read_file(&path).unwrap();
        assert_eq!(read.title, "Round trip");
        assert_eq!(read.tasks, list.tasks);
        assert_eq!(read_markers, markers);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file(&dir.path().join("nope.md")).unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
    }

    #[test]
    fn test_write_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.md");
        fs::write(&path, "# Old\n").unwrap();

        let list = TaskList::new("New");
        let backup = write_with_backup(&path, &list, &[]).unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), "# Old\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "# New\n");
    }

    #[test]
    fn test_invalid_path() {
        let err = write_file(Path::new("bad\u{1}name.md"), &TaskList::new("T"), &[]).unwrap_err();
        assert!(matches!(err, FileError::InvalidPath(_)));
    }
}
