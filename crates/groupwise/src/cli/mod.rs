//! CLI module for groupwise
//!
//! Standalone commands over the core engine. None of them keep state between
//! runs; everything is derived from the directory and the arguments.

pub mod error;
pub mod output;
pub mod rules;

pub mod analyze;
pub mod explain;
pub mod generate;
pub mod group;
pub mod validate;
