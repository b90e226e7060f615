// Path: crates/cli/src/commands/mod.rs

pub mod config;
pub mod fetch;
pub mod promote;
pub mod query;
pub mod start;
pub mod upgrade;
