//! MSVC developer environment capture.
//!
//! `nmake` and `cl` only work inside the environment `vcvarsall.bat` sets up.
//! We run it once through `cmd`, dump the resulting environment with `set`,
//! and keep the variables the compiler actually reads.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::errors::RecipeError;
use crate::core::settings::Arch;
use crate::util::process::{find_executable, CommandRunner, ProcessBuilder};

/// Variables carried from the captured environment into build commands.
pub const CAPTURED_VARS: &[&str] = &["PATH", "INCLUDE", "LIB", "LIBPATH", "VSCMD_ARG_TGT_ARCH"];

/// Captured MSVC environment.
pub type VcEnv = BTreeMap<String, String>;

/// `vcvarsall.bat` argument for a target architecture.
pub fn vcvars_arch(arch: &Arch) -> Result<&'static str, RecipeError> {
    match arch {
        Arch::X86 => Ok("x86"),
        Arch::X86_64 => Ok("amd64"),
        Arch::Other(other) => Err(RecipeError::UnsupportedArch {
            arch: other.clone(),
        }),
    }
}

/// Locate `vcvarsall.bat`, preferring an explicitly configured path.
pub fn locate_vcvarsall(explicit: Option<&Path>, runner: &dyn CommandRunner) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("configured vcvarsall.bat does not exist: {}", path.display());
        }
        return Ok(path.to_path_buf());
    }

    let Some(vswhere) = find_vswhere() else {
        return Err(not_found("vswhere.exe not found; set `msvc.vcvarsall` in the config"));
    };
    tracing::debug!("Found vswhere at: {}", vswhere.display());

    let output = ProcessBuilder::new(&vswhere)
        .args([
            "-latest",
            "-requires",
            "Microsoft.VisualStudio.Component.VC.Tools.x86.x64",
            "-property",
            "installationPath",
            "-format",
            "value",
        ])
        .run_checked(runner)?;

    let install = output.stdout.trim();
    if install.is_empty() {
        return Err(not_found("vswhere found no Visual Studio with C++ tools"));
    }

    let vcvarsall = Path::new(install)
        .join("VC")
        .join("Auxiliary")
        .join("Build")
        .join("vcvarsall.bat");
    if !vcvarsall.is_file() {
        return Err(not_found(&format!(
            "vcvarsall.bat not found at {}",
            vcvarsall.display()
        )));
    }
    Ok(vcvarsall)
}

/// Run `vcvarsall.bat <arch>` and return the variables in [`CAPTURED_VARS`].
pub fn capture_env(vcvarsall: &Path, arch: &Arch, runner: &dyn CommandRunner) -> Result<VcEnv> {
    let arch = vcvars_arch(arch)?;
    tracing::info!("Capturing MSVC environment via {} {}", vcvarsall.display(), arch);

    // A batch file sidesteps cmd.exe quoting of paths with spaces.
    let mut batch = tempfile::Builder::new()
        .prefix("mpdec_vcvars")
        .suffix(".bat")
        .tempfile()
        .context("failed to create temp batch file")?;
    write!(
        batch,
        "@echo off\r\ncall \"{}\" {} >nul 2>&1\r\nif errorlevel 1 exit /b 1\r\nset\r\n",
        vcvarsall.display(),
        arch
    )
    .context("failed to write temp batch file")?;
    batch.flush().context("failed to write temp batch file")?;

    let output = ProcessBuilder::new("cmd")
        .arg("/c")
        .arg(batch.path())
        .run_checked(runner)?;

    let env = parse_set_output(&output.stdout);
    if env.get("PATH").map_or(true, |p| p.is_empty()) {
        bail!("vcvarsall.bat produced an empty PATH; the MSVC environment is not usable");
    }
    Ok(env)
}

/// Parse `set` output into the variables we care about.
///
/// Windows variable names are case-insensitive, so keys are upper-cased.
pub fn parse_set_output(output: &str) -> VcEnv {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_uppercase(), value.trim_end().to_string()))
        .filter(|(key, _)| CAPTURED_VARS.contains(&key.as_str()))
        .collect()
}

/// Resolve a tool inside the captured `PATH`, falling back to the bare name.
pub fn resolve_tool(name: &str, env: &VcEnv, cwd: &Path) -> PathBuf {
    env.get("PATH")
        .and_then(|path| which::which_in(name, Some(path), cwd).ok())
        .unwrap_or_else(|| PathBuf::from(name))
}

fn find_vswhere() -> Option<PathBuf> {
    let program_files_x86 = std::env::var("ProgramFiles(x86)")
        .unwrap_or_else(|_| "C:\\Program Files (x86)".to_string());

    let standard = PathBuf::from(program_files_x86)
        .join("Microsoft Visual Studio")
        .join("Installer")
        .join("vswhere.exe");
    if standard.exists() {
        return Some(standard);
    }
    find_executable("vswhere")
}

fn not_found(msg: &str) -> anyhow::Error {
    RecipeError::ToolFailed {
        command: "vcvarsall.bat".to_string(),
        code: None,
        stderr: msg.to_string(),
    }
    .into()
}
