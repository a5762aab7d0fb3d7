//! Small shared types.

mod ticker;

pub use ticker::*;
