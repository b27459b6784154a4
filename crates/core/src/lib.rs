//! `stockpile-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use version::{ExpectedVersion, Revision};
