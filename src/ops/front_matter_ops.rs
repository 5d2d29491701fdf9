use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::model::{validate_reference, validate_text, FrontMatter, TaskList};
use crate::ops::task_ops::TaskError;

static METADATA_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap());

/// Parse `key:value` CLI flags into a metadata map. Later duplicates of a
/// key win. Keys must be flat identifiers; YAML merge/anchor syntax is
/// rejected so the encoded front matter stays inert.
pub fn parse_metadata_flags(flags: &[String]) -> Result<IndexMap<String, String>, TaskError> {
    let mut metadata = IndexMap::new();
    for flag in flags {
        let Some((key, value)) = flag.split_once(':') else {
            return Err(TaskError::Validation(format!(
                "invalid metadata flag (expected key:value): {flag}"
            )));
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            return Err(TaskError::Validation(format!(
                "empty metadata key in: {flag}"
            )));
        }
        if key.contains('.') {
            return Err(TaskError::Validation(format!(
                "nested keys not supported: {key}"
            )));
        }
        if key == "<<" || key.starts_with('&') || key.starts_with('*') {
            return Err(TaskError::Validation(format!(
                "reserved metadata key: {key}"
            )));
        }
        if !METADATA_KEY.is_match(key) {
            return Err(TaskError::Validation(format!(
                "invalid metadata key: {key}"
            )));
        }
        validate_text("metadata value", value).map_err(TaskError::Validation)?;
        metadata.insert(key.to_string(), value.to_string());
    }
    Ok(metadata)
}

/// Merge references and metadata into the document's front matter, creating
/// the block if absent. References append (duplicates allowed); metadata
/// keys overwrite existing values.
pub fn add_front_matter_content(
    list: &mut TaskList,
    references: Vec<String>,
    metadata: IndexMap<String, String>,
) -> Result<(), TaskError> {
    for reference in &references {
        validate_reference(reference).map_err(TaskError::Validation)?;
    }
    let fm = list.front_matter.get_or_insert_with(FrontMatter::default);
    fm.references.extend(references);
    for (key, value) in metadata {
        fm.metadata.insert(key, value);
    }
    Ok(())
}
