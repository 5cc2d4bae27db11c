//! Command implementations.

mod stow;

pub use stow::{RunSummary, stow};
