pub mod config;
pub mod discovery;
pub mod task_io;

pub use config::{load_config, Config};
pub use discovery::resolve_file;
pub use task_io::{read_file, write_file, write_with_backup, FileError};
