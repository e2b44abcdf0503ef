//! Core infrastructure for modulize.
//!
//! This crate provides language-agnostic infrastructure:
//! - Patch IR for span-anchored document rewrites
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - Document discovery and path utilities
//! - Text position utilities

pub mod error;
pub mod files;
pub mod output;
pub mod patch;
pub mod paths;
pub mod text;
