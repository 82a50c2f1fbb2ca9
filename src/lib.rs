//! mpdec-recipe - fetch, patch, build and package the mpdecimal C library
//!
//! The recipe is a fixed pipeline: download the pinned release tarball and
//! verify it, patch the upstream build files for the requested linkage, run
//! `configure && make` or `nmake`, lay the results out as a package and
//! describe it for consumers.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test doubles for the network and the external build tools.
///
/// Only compiled for unit tests.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildPlan, RecipeContext};
pub use core::{CppInfo, Options, RecipeError, Settings, SourceArchive};
pub use ops::{run_recipe, RunReport};
pub use util::config::Config;
