//! Edit generation for stylesheets and scripts.
//!
//! Both rewriters only queue span-anchored edits into a
//! [`PatchSet`](modulize_core::patch::PatchSet); nothing is applied until the
//! whole corpus has been planned.

pub mod script;
pub mod stylesheet;

pub use script::ScriptRewriter;
pub use stylesheet::{rewrite_stylesheets, ClassRenames};
