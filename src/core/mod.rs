//! Core types: settings, the pinned archive, package layout and metadata.

pub mod cpp_info;
pub mod errors;
pub mod layout;
pub mod recipe;
pub mod settings;

pub use cpp_info::CppInfo;
pub use errors::RecipeError;
pub use layout::{CopyRule, Dest, PackageLayout};
pub use recipe::{RecipeMetadata, SourceArchive};
pub use settings::{Arch, BuildType, Compiler, Linkage, MsvcRuntime, Options, Os, Settings};
