use std::path::PathBuf;
use std::process::Command;

use crate::io::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("no task file given and branch-based discovery is disabled")]
    Disabled,
    #[error("not on a named git branch; pass a task file explicitly")]
    NoBranch,
    #[error("no task file found at {0} for the current branch")]
    NotFound(PathBuf),
}

/// Resolve which task file a command should operate on.
///
/// An explicit path always wins. Otherwise the current git branch is
/// substituted into the configured discovery template, and the resulting
/// path must already exist.
pub fn resolve_file(
    explicit: Option<PathBuf>,
    config: &Config,
) -> Result<PathBuf, DiscoveryError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if !config.discovery.enabled {
        return Err(DiscoveryError::Disabled);
    }
    let branch = current_branch().ok_or(DiscoveryError::NoBranch)?;
    let path = PathBuf::from(
        config
            .discovery
            .template
            .replace("{branch}", &branch),
    );
    if !path.exists() {
        return Err(DiscoveryError::NotFound(path));
    }
    Ok(path)
}

/// Name of the current git branch, or None outside a repository or in a
/// detached-HEAD state.
fn current_branch() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let branch = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if branch.is_empty() || branch == "HEAD" {
        return None;
    }
    Some(branch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let config = Config::default();
        let path = resolve_file(Some(PathBuf::from("my/tasks.md")), &config).unwrap();
        assert_eq!(path, PathBuf::from("my/tasks.md"));
    }

    #[test]
    fn test_discovery_disabled() {
        let mut config = Config::default();
        config.discovery.enabled = false;
        assert!(matches!(
            resolve_file(None, &config),
            Err(DiscoveryError::Disabled)
        ));
    }
}
