//! modulize: migrate global CSS classes to CSS modules
//!
//! Finds classes that are declared in exactly one stylesheet, renames them to
//! camel case, wraps every other class in `:global(...)`, rewrites the string
//! literals in scripts that spell those classes into style-module property
//! accesses, and adds the matching imports.

// Core infrastructure - re-exported from modulize-core
pub use modulize_core::error;
pub use modulize_core::files;
pub use modulize_core::output;
pub use modulize_core::patch;
pub use modulize_core::paths;
pub use modulize_core::text;

// Engine
pub mod allocator;
pub mod corpus;
pub mod migrate;
pub mod naming;
pub mod registry;
pub mod rewrite;
pub mod scanner;

// Write step and front door
pub mod apply;
pub mod cli;

// Error bridges - converts subsystem errors to ModulizeError
mod error_bridges;
