//! CKG Core Components
//!
//! This crate provides configuration and the query tool on top of the
//! CKG indexer: command dispatch, report rendering and per-path store
//! memoization.

mod command;
mod config;
mod error;
mod report;
mod tool;

pub use command::Command;
pub use config::{CkgConfig, GitConfig};
pub use error::CoreError;
pub use report::render;
pub use tool::{CkgTool, ToolResult};
