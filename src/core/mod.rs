//! Core module for memaudit
//!
//! Shared types and the loaders for concept stores and retrieval logs.

pub mod loader;
mod types;

pub use loader::{load_concepts, load_retrievals};
pub use types::*;
