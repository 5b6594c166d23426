//! Access to the ambient execution environment
//!
//! Probes never read process-global state directly. Environment variables,
//! the GCP product name file and `PATH` lookups all go through
//! [`Environment`], so tests can substitute a [`FixedEnvironment`].

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

/// Read-only view of the environment a probe runs in
pub trait Environment: Send + Sync {
    /// Look up an environment variable
    ///
    /// Returns `None` if the variable is unset or not valid unicode.
    fn var(&self, key: &str) -> Option<String>;

    /// Read a file into a string
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Find an executable on the search path
    fn which(&self, program: &str) -> Option<PathBuf>;

    /// Look up an environment variable, treating an empty value as unset
    fn non_empty_var(&self, key: &str) -> Option<String> {
        self.var(key).filter(|value| !value.is_empty())
    }
}

/// The real process environment, filesystem and `PATH`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        let paths = std::env::var_os("PATH")?;
        which_in(&paths, program)
    }
}

/// Search a `PATH`-style list of directories for `program`
fn which_in(paths: &OsStr, program: &str) -> Option<PathBuf> {
    std::env::split_paths(paths)
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    let exts = std::env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT".to_string());
    std::iter::once(dir.join(program))
        .chain(
            exts.split(';')
                .filter(|ext| !ext.is_empty())
                .map(|ext| dir.join(format!("{}{}", program, ext))),
        )
        .collect()
}

#[cfg(not(windows))]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// An in-memory environment
///
/// Variables, files and executables are all explicit; anything not added is
/// reported as missing. Reading a missing file fails with
/// [`io::ErrorKind::NotFound`].
///
/// # Example
///
/// ```
/// use ambient_id::{Environment, FixedEnvironment};
///
/// let env = FixedEnvironment::new()
///     .with_var("GITLAB_CI", "true")
///     .with_executable("buildkite-agent", "/usr/bin/buildkite-agent");
///
/// assert_eq!(env.var("GITLAB_CI").as_deref(), Some("true"));
/// assert!(env.which("circleci").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixedEnvironment {
    vars: HashMap<String, String>,
    files: HashMap<PathBuf, String>,
    executables: HashMap<String, PathBuf>,
}

impl FixedEnvironment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an environment variable
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Add a readable file
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// Make `program` resolvable on the search path
    pub fn with_executable(mut self, program: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(program.into(), path.into());
        self
    }
}

impl Environment for FixedEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.executables.get(program).cloned()
    }
}
