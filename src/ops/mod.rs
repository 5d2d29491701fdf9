pub mod autocomplete;
pub mod batch;
pub mod front_matter_ops;
pub mod next;
pub mod phase_ops;
pub mod renumber;
pub mod task_ops;

pub use task_ops::TaskError;
