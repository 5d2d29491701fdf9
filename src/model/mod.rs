pub mod front_matter;
pub mod phase;
pub mod task;

pub use front_matter::*;
pub use phase::*;
pub use task::*;
