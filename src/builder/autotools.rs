//! `configure && make` plan for gcc, clang and apple-clang.
//!
//! Upstream's autotools files build and install both a static archive and a
//! shared object. The patch rules below cut that down to the requested
//! linkage and give the shared object the OS's naming convention. On Windows
//! (MinGW) every command is run through an MSYS2 login shell.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::builder::context::RecipeContext;
use crate::builder::patch::PatchRule;
use crate::builder::{BuildSteps, InstallOutcome};
use crate::core::layout::prune_artifacts;
use crate::core::settings::Settings;
use crate::util::fs::{remove_dir_all_if_exists, to_msys_path};
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Base name shared by every artifact of the library.
pub const LIB_BASE_NAME: &str = "libmpdec";

const STATIC_EXT: &str = ".a";

const INSTALL_SHARED: &str = "\t$(INSTALL) -m 755 libmpdec/$(LIBSHARED) $(DESTDIR)$(libdir)\n";
const INSTALL_STATIC: &str = "\t$(INSTALL) -m 644 libmpdec/$(LIBSTATIC) $(DESTDIR)$(libdir)\n";
const SYMLINK_ALIASES: &str =
    "\tcd $(DESTDIR)$(libdir) && ln -sf $(LIBSHARED) $(LIBSONAME) && ln -sf $(LIBSHARED) libmpdec.so";

/// Shell the autotools commands run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigureShell {
    /// `sh` on the host.
    Native,
    /// `bash -lc` from an MSYS2 installation, with Unix-style paths.
    Msys2Bash,
}

impl ConfigureShell {
    pub fn for_settings(settings: &Settings) -> Self {
        if settings.os.is_windows() && !settings.is_msvc() {
            ConfigureShell::Msys2Bash
        } else {
            ConfigureShell::Native
        }
    }

    fn path(&self, path: &Path) -> String {
        match self {
            ConfigureShell::Native => path.display().to_string(),
            ConfigureShell::Msys2Bash => to_msys_path(path),
        }
    }
}

/// Autotools build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutotoolsPlan {
    pub shell: ConfigureShell,
}

impl AutotoolsPlan {
    pub fn new(settings: &Settings) -> Self {
        AutotoolsPlan {
            shell: ConfigureShell::for_settings(settings),
        }
    }

    /// `CFLAGS` for the configured build type, architecture and PIC option.
    pub fn cflags(&self, ctx: &RecipeContext) -> String {
        let mut flags: Vec<String> = ctx
            .settings
            .build_type
            .cflags()
            .iter()
            .map(|f| f.to_string())
            .collect();

        if ctx.settings.compiler.is_gcc_like() {
            if let Some(bits) = ctx.settings.arch.bits() {
                flags.push(format!("-m{}", bits));
            }
        }
        if ctx.options.fpic_enabled() {
            flags.push("-fPIC".to_string());
        }
        flags.join(" ")
    }

    /// Arguments passed to `./configure`.
    pub fn configure_args(&self, ctx: &RecipeContext) -> Vec<String> {
        let layout = &ctx.layout;
        vec![
            format!("--prefix={}", self.shell.path(layout.root())),
            format!("--bindir={}", self.shell.path(&layout.bin())),
            format!("--libdir={}", self.shell.path(&layout.lib())),
            format!("--includedir={}", self.shell.path(&layout.include())),
            format!("--datarootdir={}", self.shell.path(&layout.share())),
        ]
    }

    /// Wrap `program args...` for the selected shell, run in the source root.
    fn command(&self, ctx: &RecipeContext, program: &str, args: &[String]) -> ProcessBuilder {
        let source_dir = ctx.source_dir();
        let cmd = match self.shell {
            ConfigureShell::Native => ProcessBuilder::new(program).args(args),
            ConfigureShell::Msys2Bash => {
                let mut script =
                    format!("cd {} && {}", shell_quote(&to_msys_path(&source_dir)), program);
                for arg in args {
                    script.push(' ');
                    script.push_str(&shell_quote(arg));
                }
                ProcessBuilder::new("bash").arg("-lc").arg(script)
            }
        };

        let mut cmd = cmd.cwd(&source_dir).env("CFLAGS", self.cflags(ctx));
        if let Some(cc) = &ctx.cc {
            cmd = cmd.env("CC", cc);
        }
        cmd
    }

    pub fn configure_command(&self, ctx: &RecipeContext) -> ProcessBuilder {
        let args = self.configure_args(ctx);
        match self.shell {
            ConfigureShell::Native => {
                let mut full = vec!["./configure".to_string()];
                full.extend(args);
                self.command(ctx, "sh", &full)
            }
            ConfigureShell::Msys2Bash => self.command(ctx, "./configure", &args),
        }
    }

    pub fn make_command(&self, ctx: &RecipeContext, target: Option<&str>) -> ProcessBuilder {
        let args = match target {
            Some(target) => vec![target.to_string()],
            None => vec![format!("-j{}", ctx.jobs)],
        };
        self.command(ctx, "make", &args)
    }
}

impl BuildSteps for AutotoolsPlan {
    fn patch_rules(&self, ctx: &RecipeContext) -> Result<Vec<PatchRule>> {
        let os = &ctx.settings.os;
        let shared_ext = os.shared_lib_extension()?;
        let major = ctx.archive.main_version()?;
        let versioned_shared = format!("LIBSHARED = {}-{}{}", LIB_BASE_NAME, major, shared_ext);

        let makefile = PathBuf::from("Makefile.in");
        let lib_makefile = PathBuf::from("libmpdec").join("Makefile.in");

        let mut rules = vec![
            PatchRule::replace("configure", "libmpdec.a", format!("libmpdec{}", STATIC_EXT)),
            PatchRule::replace("configure", "libmpdec.so", format!("libmpdec{}", shared_ext)),
            PatchRule::replace(
                &makefile,
                "libdir = @libdir@",
                "libdir = @libdir@\nbindir = @bindir@",
            ),
        ];

        match (ctx.is_shared(), os.is_windows()) {
            (true, true) => rules.extend([
                PatchRule::replace(&makefile, "LIBSHARED = @LIBSHARED@", &versioned_shared),
                PatchRule::replace(
                    &makefile,
                    "install: FORCE",
                    "install: FORCE\n\t$(INSTALL) -d -m 755 $(DESTDIR)$(bindir)",
                ),
                PatchRule::replace(
                    &makefile,
                    INSTALL_SHARED,
                    "\t$(INSTALL) -m 755 libmpdec/$(LIBSHARED) $(DESTDIR)$(bindir)\n",
                ),
                PatchRule::remove(&makefile, format!("{}\n", SYMLINK_ALIASES)),
            ]),
            (true, false) => rules.extend([
                PatchRule::remove(&makefile, INSTALL_STATIC),
                PatchRule::replace(
                    &makefile,
                    SYMLINK_ALIASES,
                    format!(
                        "\tcd $(DESTDIR)$(libdir) && ln -sf $(LIBSHARED) $(LIBSONAME) && ln -sf $(LIBSHARED) libmpdec{}",
                        shared_ext
                    ),
                ),
            ]),
            (false, _) => rules.extend([
                PatchRule::remove(&makefile, INSTALL_SHARED),
                PatchRule::remove(&makefile, format!("{}\n", SYMLINK_ALIASES)),
            ]),
        }

        let default_target = if ctx.is_shared() { "LIBSHARED" } else { "LIBSTATIC" };
        rules.push(PatchRule::replace(
            &lib_makefile,
            "default: $(LIBSTATIC) $(LIBSHARED)",
            format!("default: $({})", default_target),
        ));

        if os.is_windows() {
            rules.extend([
                PatchRule::replace(&lib_makefile, "LIBSHARED = @LIBSHARED@", &versioned_shared),
                PatchRule::remove(&lib_makefile, "\tln -sf $(LIBSHARED) libmpdec.so"),
                PatchRule::remove(&lib_makefile, "\tln -sf $(LIBSHARED) $(LIBSONAME)"),
                PatchRule::replace(
                    &lib_makefile,
                    "CONFIGURE_LDFLAGS = ",
                    format!("CONFIGURE_LDFLAGS = -Wl,--out-implib,libmpdec{} ", STATIC_EXT),
                ),
            ]);
        } else {
            rules.push(PatchRule::replace(
                &lib_makefile,
                "libmpdec.so",
                format!("libmpdec{}", shared_ext),
            ));
        }

        Ok(rules)
    }

    fn configure(&mut self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<()> {
        self.configure_command(ctx).run_checked(runner)?;
        Ok(())
    }

    fn build(&self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<()> {
        self.make_command(ctx, None).run_checked(runner)?;
        Ok(())
    }

    fn install(&self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<InstallOutcome> {
        self.make_command(ctx, Some("install")).run_checked(runner)?;

        // Man pages and docs are not part of the package.
        remove_dir_all_if_exists(&ctx.layout.share())?;

        let pruned = prune_artifacts(&ctx.layout, LIB_BASE_NAME, &ctx.settings.os, ctx.linkage())?;
        Ok(InstallOutcome {
            copied: Vec::new(),
            pruned,
        })
    }
}

/// Single-quote `s` for a POSIX shell.
fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
