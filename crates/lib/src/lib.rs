//! buildmeta-lib: metadata extraction from finished build outputs
//!
//! This crate reads what a completed build left in the store and turns it into
//! a [`output::BuildOutput`] record:
//! - `Store`: the content-addressed store the outputs live in
//! - `Derivation`: output names and the store paths they were built to
//! - `BuildOutput`: closure sizes, products, release name and metrics

pub mod consts;
pub mod derivation;
pub mod output;
pub mod store;
pub mod util;

pub use derivation::Derivation;
pub use output::{BuildOutput, OutputError, get_build_output};
pub use store::{LocalStore, Store};
