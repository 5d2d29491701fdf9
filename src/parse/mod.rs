pub mod front_matter;
pub mod task_parser;
pub mod task_serializer;

pub use task_parser::parse_markdown;
pub use task_serializer::{render_markdown, render_markdown_with_phases};

/// Maximum input size accepted by the parser (10 MiB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("file too large: {0} bytes (maximum {MAX_FILE_SIZE})")]
    TooLarge(usize),
    #[error("unclosed front matter block")]
    UnclosedFrontMatter,
    #[error("invalid front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
    #[error("front matter metadata value for '{key}' is not a scalar")]
    MetadataNotScalar { key: String },
    #[error("line {line}: {message}")]
    Line { line: usize, message: String },
    #[error(
        "inconsistent requirements file: found both '{first}' and '{second}'"
    )]
    RequirementsFileMismatch { first: String, second: String },
}

impl ParseError {
    pub(crate) fn at(line: usize, message: impl Into<String>) -> Self {
        ParseError::Line {
            line,
            message: message.into(),
        }
    }
}
