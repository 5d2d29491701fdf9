use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// YAML front matter block at the top of a task file.
///
/// Only two keys are recognized: a list of document-level references and a
/// flat string-to-string metadata map. Metadata preserves insertion order so
/// a load/save cycle does not reshuffle keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,
}

impl FrontMatter {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.metadata.is_empty()
    }
}
