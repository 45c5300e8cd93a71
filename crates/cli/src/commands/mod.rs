//! CLI commands.

pub mod lookup;
pub mod register;
