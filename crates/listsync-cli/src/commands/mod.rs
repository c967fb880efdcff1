pub mod check;
pub mod common;
pub mod completions;
pub mod definitions;
pub mod lists;
pub mod sync;
