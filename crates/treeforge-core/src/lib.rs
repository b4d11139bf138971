//! TreeForge - Core Library
//!
//! Structured project generation: recovers a project-tree JSON shape
//! from model output, partitions it into bounded chunks, drives a
//! one-request-per-chunk generation step, and materializes the result
//! onto a storage backend.

pub mod codec;
pub mod config;
pub mod error;
pub mod generator;
pub mod materialize;
pub mod orchestrator;
pub mod partition;
pub mod prompt;
pub mod storage;
pub mod types;

pub use codec::*;
pub use config::*;
pub use error::*;
pub use generator::*;
pub use materialize::*;
pub use orchestrator::*;
pub use partition::*;
pub use prompt::*;
pub use storage::*;
pub use types::*;
