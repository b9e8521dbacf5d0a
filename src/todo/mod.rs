//! Todo domain models
//!
//! This module contains the core task data structures. It is split into
//! submodules for better organization:
//! - `task`: the task entity, its identifiers, and list mode enums
//! - `filter`: the display filter evaluated against tasks

mod filter;
mod task;

// Re-export all public types
pub use filter::TaskFilter;
pub use task::{EditMode, SelectMode, StorageHandle, Task, TaskId};
