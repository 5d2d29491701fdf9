use serde::{Deserialize, Serialize};

/// A `## heading` in the root-level task sequence.
///
/// Phase markers are not tree nodes. They are an overlay anchored to the ID
/// of the root-level task they appear after, and must be re-derived whenever
/// root-level IDs shift (insertion, removal, renumbering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseMarker {
    /// Phase name from the H2 header. Duplicate names are legal.
    pub name: String,
    /// ID of the root-level task that precedes this phase.
    /// Empty means the phase appears before all tasks.
    pub after_task_id: String,
}

impl PhaseMarker {
    pub fn new(name: impl Into<String>, after_task_id: impl Into<String>) -> Self {
        PhaseMarker {
            name: name.into(),
            after_task_id: after_task_id.into(),
        }
    }

    /// True if this phase appears before the first task.
    pub fn at_start(&self) -> bool {
        self.after_task_id.is_empty()
    }
}
