use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::Status;

#[derive(Parser)]
#[command(
    name = "mdtask",
    about = "Hierarchical markdown task lists with atomic batch edits",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new, empty task file
    Create(CreateArgs),
    /// Add a task
    Add(AddArgs),
    /// Update fields of an existing task
    Update(UpdateArgs),
    /// Mark a task completed (completes parents whose children are all done)
    Complete(CompleteArgs),
    /// Mark a completed task pending again
    Uncomplete(UncompleteArgs),
    /// Remove a task and its subtree
    Remove(RemoveArgs),
    /// Print the task tree
    List(ListArgs),
    /// Show the next incomplete task
    Next(NextArgs),
    /// Show completion statistics
    Progress(ProgressArgs),
    /// Rewrite all task IDs to canonical sequential form
    Renumber(RenumberArgs),
    /// Report whether the file uses phase headers
    HasPhases(HasPhasesArgs),
    /// Add a phase header after the last task
    AddPhase(AddPhaseArgs),
    /// Add references or metadata to the YAML front matter
    AddFrontmatter(AddFrontmatterArgs),
    /// Apply a JSON batch of operations atomically
    Batch(BatchArgs),
}

// ---------------------------------------------------------------------------
// Per-command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct CreateArgs {
    /// Title for the new task list
    pub title: String,
    /// Task file to create
    pub file: PathBuf,
    /// Front matter reference (repeatable)
    #[arg(long = "reference")]
    pub references: Vec<String>,
    /// Front matter metadata entry as key:value (repeatable)
    #[arg(long = "meta")]
    pub metadata: Vec<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Title of the new task
    pub title: String,
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
    /// Add as a child of this task ID
    #[arg(long)]
    pub parent: Option<String>,
    /// Insert at this ID instead of appending (renumbers the document)
    #[arg(long, conflicts_with = "phase")]
    pub position: Option<String>,
    /// Add at the end of this phase (created if missing)
    #[arg(long, conflicts_with = "parent")]
    pub phase: Option<String>,
    /// Detail line (repeatable)
    #[arg(long = "detail")]
    pub details: Vec<String>,
    /// Reference entry (repeatable)
    #[arg(long = "reference")]
    pub references: Vec<String>,
    /// Comma-separated requirement IDs
    #[arg(long, value_delimiter = ',')]
    pub requirements: Vec<String>,
    /// Requirements file to link against
    #[arg(long)]
    pub requirements_file: Option<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Task ID to update
    pub id: String,
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New status: pending, in-progress, or completed
    #[arg(long)]
    pub status: Option<Status>,
    /// Replace detail lines (repeatable)
    #[arg(long = "detail")]
    pub details: Option<Vec<String>>,
    /// Replace references (repeatable)
    #[arg(long = "reference")]
    pub references: Option<Vec<String>>,
    /// Replace requirement IDs (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub requirements: Option<Vec<String>>,
    /// Requirements file to link against
    #[arg(long)]
    pub requirements_file: Option<String>,
}

#[derive(Args)]
pub struct CompleteArgs {
    /// Task ID to complete
    pub id: String,
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct UncompleteArgs {
    /// Task ID to reopen
    pub id: String,
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Task ID to remove
    pub id: String,
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct NextArgs {
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ProgressArgs {
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct RenumberArgs {
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct HasPhasesArgs {
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddPhaseArgs {
    /// Phase name
    pub name: String,
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddFrontmatterArgs {
    /// Task file (discovered from the git branch if omitted)
    pub file: Option<PathBuf>,
    /// Reference to append (repeatable)
    #[arg(long = "reference")]
    pub references: Vec<String>,
    /// Metadata entry as key:value (repeatable)
    #[arg(long = "meta")]
    pub metadata: Vec<String>,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Task file (overrides the request's "file" field)
    pub file: Option<PathBuf>,
    /// Read the JSON request from this file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Validate and preview without writing
    #[arg(long)]
    pub dry_run: bool,
}
