//! Test doubles for the network and the build tools.
//!
//! [`FakeToolchain`] stands in for `sh`, `make`, `cmd` and `nmake`: it records
//! every command and produces the files the real tools would, driven by the
//! (patched) makefiles in the source tree. [`MockDownloader`] serves a fixed
//! byte buffer and counts requests.

pub mod fixtures;

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use url::Url;

use crate::sources::download::Downloader;
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessOutput};
use crate::util::shell::Shell;

pub use fixtures::*;

/// Downloader that returns canned bytes without touching the network.
#[derive(Debug, Default)]
pub struct MockDownloader {
    body: Option<Vec<u8>>,
    requests: Cell<usize>,
}

impl MockDownloader {
    pub fn serving(body: Vec<u8>) -> Self {
        MockDownloader {
            body: Some(body),
            requests: Cell::new(0),
        }
    }

    /// A downloader whose every request fails like a dropped connection.
    pub fn unreachable() -> Self {
        MockDownloader::default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.get()
    }
}

impl Downloader for MockDownloader {
    fn download(&self, url: &Url, _shell: &Shell) -> Result<Vec<u8>> {
        self.requests.set(self.requests.get() + 1);
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => bail!("failed to download tarball from {}: connection refused", url),
        }
    }
}

/// Install directories passed to `./configure`.
#[derive(Debug, Clone, Default)]
struct InstallDirs {
    bin: PathBuf,
    lib: PathBuf,
    include: PathBuf,
    share: PathBuf,
}

/// Scripted stand-in for the external build tools.
#[derive(Debug, Default)]
pub struct FakeToolchain {
    calls: RefCell<Vec<String>>,
    fail_program: Option<String>,
    dirs: RefCell<InstallDirs>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        FakeToolchain::default()
    }

    /// Every invocation of `program` exits with status 2.
    pub fn failing_on(program: &str) -> Self {
        FakeToolchain {
            fail_program: Some(program.to_string()),
            ..FakeToolchain::default()
        }
    }

    /// Commands run so far, as displayed in error messages.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn configure(&self, args: &[String]) {
        let mut dirs = self.dirs.borrow_mut();
        for arg in args {
            let Some((key, value)) = arg.split_once('=') else {
                continue;
            };
            let value = PathBuf::from(value);
            match key {
                "--bindir" => dirs.bin = value,
                "--libdir" => dirs.lib = value,
                "--includedir" => dirs.include = value,
                "--datarootdir" => dirs.share = value,
                _ => {}
            }
        }
    }

    /// Install what the top-level `Makefile.in` would install.
    fn make_install(&self, source_dir: &Path) -> Result<()> {
        let makefile = fs::read_to_string(source_dir.join("Makefile.in"))
            .context("fake make: no Makefile.in")?;
        let dirs = self.dirs.borrow();
        if dirs.lib.as_os_str().is_empty() || dirs.include.as_os_str().is_empty() {
            bail!("fake make: install before configure");
        }

        touch(&dirs.include.join("mpdecimal.h"))?;
        if makefile.contains("libmpdec/$(LIBSTATIC) $(DESTDIR)$(libdir)") {
            touch(&dirs.lib.join("libmpdec.a"))?;
        }
        if makefile.contains("libmpdec/$(LIBSHARED) $(DESTDIR)$(libdir)") {
            touch(&dirs.lib.join("libmpdec.so.2.4.2"))?;
        }
        if makefile.contains("ln -sf $(LIBSHARED) $(LIBSONAME)") {
            touch(&dirs.lib.join("libmpdec.so.2"))?;
            touch(&dirs.lib.join("libmpdec.so"))?;
        }
        if makefile.contains("libmpdec/$(LIBSHARED) $(DESTDIR)$(bindir)") {
            touch(&dirs.bin.join("libmpdec-2.dll"))?;
        }
        touch(&dirs.share.join("doc").join("mpdecimal").join("index.html"))?;
        Ok(())
    }

    /// Produce what `Makefile.vc` would leave in `libmpdec/`.
    fn nmake(&self, args: &[String], cwd: Option<&Path>) -> Result<()> {
        let lib_dir = cwd.context("fake nmake: no working directory")?;
        if !lib_dir.join("Makefile").exists() {
            bail!("fake nmake: no Makefile in {}", lib_dir.display());
        }
        if args.iter().any(|a| a == "DLL=1") {
            for name in ["libmpdec-2.dll", "libmpdec-2.dll.exp", "libmpdec-2.dll.lib"] {
                touch(&lib_dir.join(name))?;
            }
        } else {
            touch(&lib_dir.join("libmpdec-2.lib"))?;
        }
        Ok(())
    }
}

impl FakeToolchain {
    /// Emulate one program invocation.
    fn step(&self, program: &str, args: &[String], cwd: Option<&Path>) -> Result<ProcessOutput> {
        // `sh ./configure ...` and a bare `./configure ...` are the same step.
        let (program, args) = match (program, args.split_first()) {
            ("sh", Some((script, rest))) if script == "./configure" => ("./configure", rest),
            _ => (program, args),
        };
        let name = Path::new(program)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.fail_program.as_deref() == Some(name.as_str()) {
            return Ok(ProcessOutput {
                code: Some(2),
                stdout: String::new(),
                stderr: format!("{}: simulated failure", name),
            });
        }

        let mut stdout = String::new();
        match name.as_str() {
            "configure" => self.configure(args),
            "make" if args.iter().any(|a| a == "install") => {
                let cwd = cwd.context("fake make: no working directory")?;
                self.make_install(cwd)?;
            }
            "cmd" => {
                stdout = "Path=C:\\VC\\Tools\\bin\\Hostx64\\x86;C:\\Windows\r\n\
                          INCLUDE=C:\\VC\\Tools\\include\r\n\
                          LIB=C:\\VC\\Tools\\lib\\x86\r\n\
                          USERNAME=ci\r\n"
                    .to_string();
            }
            "nmake" => self.nmake(args, cwd)?,
            _ => {}
        }

        Ok(ProcessOutput {
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }

    /// Run a `bash -lc` script of `&&`-joined steps, honouring `cd`.
    fn login_script(&self, script: &str, cwd: Option<&Path>) -> Result<ProcessOutput> {
        let mut cwd = cwd.map(Path::to_path_buf);
        for step in script.split("&&") {
            let mut words = step.split_whitespace().map(unquote);
            let Some(program) = words.next() else {
                continue;
            };
            let args: Vec<String> = words.collect();

            if program == "cd" {
                cwd = args.first().map(PathBuf::from);
                continue;
            }
            let output = self.step(&program, &args, cwd.as_deref())?;
            if output.code != Some(0) {
                return Ok(output);
            }
        }

        Ok(ProcessOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

impl CommandRunner for FakeToolchain {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        self.calls.borrow_mut().push(cmd.display_command());

        let program = cmd.get_program().to_string_lossy().into_owned();
        match cmd.get_args() {
            [flag, script] if program == "bash" && flag == "-lc" => {
                self.login_script(script, cmd.get_cwd())
            }
            args => self.step(&program, args, cmd.get_cwd()),
        }
    }
}

/// Undo the single quoting the MSYS2 command builder applies.
fn unquote(word: &str) -> String {
    word.strip_prefix('\'')
        .and_then(|w| w.strip_suffix('\''))
        .unwrap_or(word)
        .to_string()
}

fn touch(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, b"fake artifact")?;
    Ok(())
}
