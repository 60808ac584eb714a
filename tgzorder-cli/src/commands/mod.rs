//! Command implementations for the tgzorder CLI.

pub mod list;
pub mod optimize;

pub use list::{ListOptions, cmd_list};
pub use optimize::{OptimizeArgs, cmd_optimize};
