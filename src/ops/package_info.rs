//! Consumer metadata derived from the finished package.

use std::path::Path;

use anyhow::{Context, Result};

use crate::builder::context::RecipeContext;
use crate::core::cpp_info::CppInfo;
use crate::core::recipe::RecipeMetadata;
use crate::core::settings::Linkage;

/// Extensions recognized as link libraries.
pub const LIB_EXTENSIONS: &[&str] = &["so", "lib", "a", "dylib", "bc"];

/// Define consumers need to import symbols from the MSVC DLL.
pub const USE_DLL: &str = "USE_DLL";

/// List link library names found directly in `lib_dir`.
///
/// `libmpdec.a` and `libmpdec.so` both become `mpdec`; `.lib` names keep
/// their prefix (`libmpdec-2.lib` becomes `libmpdec-2`). Versioned shared
/// objects are skipped since their unversioned alias is listed already:
/// `libmpdec.so.2.4.2` has no library extension, and `libmpdec.2.dylib`
/// leaves a dotted stem.
pub fn collect_libs(lib_dir: &Path) -> Result<Vec<String>> {
    if !lib_dir.is_dir() {
        tracing::warn!("lib folder doesn't exist, can't collect libraries: {}", lib_dir.display());
        return Ok(Vec::new());
    }

    let mut libs = Vec::new();
    let entries = std::fs::read_dir(lib_dir)
        .with_context(|| format!("failed to read {}", lib_dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read {}", lib_dir.display()))?
            .path();
        if !path.is_file() {
            continue;
        }
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        if !LIB_EXTENSIONS.contains(&ext) {
            continue;
        }

        let name = match stem.strip_prefix("lib") {
            Some(rest) if ext != "lib" => rest,
            _ => stem,
        };
        if name.contains('.') {
            continue;
        }
        libs.push(name.to_string());
    }

    libs.sort();
    libs.dedup();
    Ok(libs)
}

/// Compute the metadata for the package described by `ctx`.
pub fn package_info(ctx: &RecipeContext) -> Result<CppInfo> {
    let meta = RecipeMetadata::mpdecimal();
    let mut libs = collect_libs(&ctx.layout.lib())?;
    if ctx.settings.compiler.needs_libm() {
        libs.push("m".to_string());
    }

    let mut defines = Vec::new();
    if ctx.settings.is_msvc() && ctx.linkage() == Linkage::Shared {
        defines.push(USE_DLL.to_string());
    }

    Ok(CppInfo {
        name: meta.name.to_string(),
        version: ctx.archive.version.clone(),
        libs,
        defines,
        include_dirs: vec!["include".to_string()],
        lib_dirs: vec!["lib".to_string()],
        bin_dirs: vec!["bin".to_string()],
    })
}

/// Compute the metadata and write it to `<package>/cpp_info.json`.
pub fn publish(ctx: &RecipeContext) -> Result<CppInfo> {
    let info = package_info(ctx)?;
    let path = ctx.package_dir().join(CppInfo::FILE_NAME);
    info.save(&path)?;
    tracing::debug!("wrote {}", path.display());
    Ok(info)
}
