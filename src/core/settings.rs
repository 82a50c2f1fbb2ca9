//! Target settings and package options.
//!
//! Settings describe the machine the library is built for (OS, compiler,
//! architecture, build type, MSVC runtime). Options describe the package
//! itself (shared vs static, position independent code).

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::core::errors::RecipeError;

/// Target operating system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Windows,
    Macos,
    /// Anything else; rejected wherever an OS convention is required.
    Other(String),
}

impl Os {
    /// The host operating system.
    pub fn host() -> Self {
        std::env::consts::OS.parse().unwrap_or(Os::Linux)
    }

    /// Extension of shared libraries on this OS, including the dot.
    pub fn shared_lib_extension(&self) -> Result<&'static str, RecipeError> {
        match self {
            Os::Linux => Ok(".so"),
            Os::Windows => Ok(".dll"),
            Os::Macos => Ok(".dylib"),
            Os::Other(name) => Err(RecipeError::UnknownPlatform { os: name.clone() }),
        }
    }

    /// Extension of static archives produced by the autotools flow.
    pub fn static_lib_extension(&self) -> &'static str {
        ".a"
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Os::Windows)
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("operating system must not be empty".to_string());
        }
        Ok(match s.to_lowercase().as_str() {
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            "macos" | "macosx" | "darwin" => Os::Macos,
            _ => Os::Other(s.to_string()),
        })
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Linux => write!(f, "Linux"),
            Os::Windows => write!(f, "Windows"),
            Os::Macos => write!(f, "Macos"),
            Os::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Compiler family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Compiler {
    Gcc,
    Clang,
    AppleClang,
    VisualStudio,
    Other(String),
}

impl Compiler {
    /// A sensible default compiler for an OS.
    pub fn default_for(os: &Os) -> Self {
        match os {
            Os::Windows => Compiler::VisualStudio,
            Os::Macos => Compiler::AppleClang,
            _ => Compiler::Gcc,
        }
    }

    /// Whether consumers must add the C math library explicitly.
    pub fn needs_libm(&self) -> bool {
        matches!(self, Compiler::Gcc | Compiler::Clang)
    }

    /// Whether the compiler accepts GCC-style `-m32`/`-m64` flags.
    pub fn is_gcc_like(&self) -> bool {
        matches!(self, Compiler::Gcc | Compiler::Clang | Compiler::AppleClang)
    }
}

impl FromStr for Compiler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("compiler must not be empty".to_string());
        }
        Ok(match s.to_lowercase().as_str() {
            "gcc" => Compiler::Gcc,
            "clang" => Compiler::Clang,
            "apple-clang" | "apple_clang" | "appleclang" => Compiler::AppleClang,
            "visual studio" | "visual-studio" | "visual_studio" | "msvc" | "vs" => {
                Compiler::VisualStudio
            }
            _ => Compiler::Other(s.to_string()),
        })
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compiler::Gcc => write!(f, "gcc"),
            Compiler::Clang => write!(f, "clang"),
            Compiler::AppleClang => write!(f, "apple-clang"),
            Compiler::VisualStudio => write!(f, "Visual Studio"),
            Compiler::Other(name) => write!(f, "{}", name),
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X86_64,
    Other(String),
}

impl Arch {
    /// The host architecture.
    pub fn host() -> Self {
        std::env::consts::ARCH
            .parse()
            .unwrap_or_else(|_| Arch::Other(std::env::consts::ARCH.to_string()))
    }

    /// Pointer width in bits for the supported architectures.
    pub fn bits(&self) -> Option<u32> {
        match self {
            Arch::X86 => Some(32),
            Arch::X86_64 => Some(64),
            Arch::Other(_) => None,
        }
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("architecture must not be empty".to_string());
        }
        Ok(match s.to_lowercase().as_str() {
            "x86" | "i386" | "i686" => Arch::X86,
            "x86_64" | "amd64" | "x64" => Arch::X86_64,
            _ => Arch::Other(s.to_string()),
        })
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X86 => write!(f, "x86"),
            Arch::X86_64 => write!(f, "x86_64"),
            Arch::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Build type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn is_debug(&self) -> bool {
        matches!(self, BuildType::Debug)
    }

    /// Optimization flags passed through `CFLAGS` on the autotools path.
    pub fn cflags(&self) -> &'static [&'static str] {
        match self {
            BuildType::Debug => &["-g"],
            BuildType::Release => &["-O3", "-DNDEBUG"],
            BuildType::RelWithDebInfo => &["-O2", "-g", "-DNDEBUG"],
            BuildType::MinSizeRel => &["-Os", "-DNDEBUG"],
        }
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
            "minsizerel" => Ok(BuildType::MinSizeRel),
            _ => Err(format!(
                "invalid build type '{}'; expected Debug, Release, RelWithDebInfo or MinSizeRel",
                s
            )),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        };
        f.write_str(s)
    }
}

/// MSVC C runtime variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsvcRuntime {
    MD,
    MT,
    MDd,
    MTd,
}

impl MsvcRuntime {
    /// Default runtime for a build type (dynamic CRT).
    pub fn default_for(build_type: BuildType) -> Self {
        if build_type.is_debug() {
            MsvcRuntime::MDd
        } else {
            MsvcRuntime::MD
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MsvcRuntime::MD => "MD",
            MsvcRuntime::MT => "MT",
            MsvcRuntime::MDd => "MDd",
            MsvcRuntime::MTd => "MTd",
        }
    }
}

impl FromStr for MsvcRuntime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Case matters: `MDd` and `MD` differ only by the suffix.
        match s.trim_start_matches('/') {
            "MD" => Ok(MsvcRuntime::MD),
            "MT" => Ok(MsvcRuntime::MT),
            "MDd" => Ok(MsvcRuntime::MDd),
            "MTd" => Ok(MsvcRuntime::MTd),
            _ => Err(format!(
                "invalid runtime '{}'; expected MD, MT, MDd or MTd",
                s
            )),
        }
    }
}

impl fmt::Display for MsvcRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! serialize_as_display {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(self)
                }
            }
        )*
    };
}

serialize_as_display!(Os, Compiler, Arch, BuildType, MsvcRuntime);

/// Requested artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    Shared,
    Static,
}

/// Target configuration of a recipe run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub os: Os,
    pub compiler: Compiler,
    pub arch: Arch,
    pub build_type: BuildType,
    /// MSVC runtime; only meaningful with Visual Studio.
    pub runtime: Option<MsvcRuntime>,
}

impl Settings {
    /// Settings for the host with the OS's default compiler.
    pub fn host() -> Self {
        let os = Os::host();
        let compiler = Compiler::default_for(&os);
        Settings {
            os,
            compiler,
            arch: Arch::host(),
            build_type: BuildType::Release,
            runtime: None,
        }
    }

    /// Reject configurations the recipe cannot build and fill in defaults.
    ///
    /// Runs before any network or filesystem work.
    pub fn validate(mut self) -> Result<Self, RecipeError> {
        if let Arch::Other(arch) = &self.arch {
            return Err(RecipeError::UnsupportedArch { arch: arch.clone() });
        }

        if self.compiler == Compiler::VisualStudio {
            if self.runtime.is_none() {
                self.runtime = Some(MsvcRuntime::default_for(self.build_type));
            }
        } else {
            self.runtime = None;
        }

        Ok(self)
    }

    pub fn is_msvc(&self) -> bool {
        self.compiler == Compiler::VisualStudio
    }
}

/// Package options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Options {
    pub shared: bool,
    /// Position independent code; removed when it cannot apply.
    pub fpic: Option<bool>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            shared: false,
            fpic: Some(true),
        }
    }
}

impl Options {
    /// Drop `fpic` for shared builds and for MSVC, where it is meaningless.
    pub fn normalize(mut self, settings: &Settings) -> Self {
        if self.shared || settings.is_msvc() {
            self.fpic = None;
        }
        self
    }

    pub fn linkage(&self) -> Linkage {
        if self.shared {
            Linkage::Shared
        } else {
            Linkage::Static
        }
    }

    pub fn fpic_enabled(&self) -> bool {
        self.fpic.unwrap_or(false)
    }
}
