//! Targets: the addressable nodes of the build graph.
//!
//! A file target is built by the `Walkfile` found in its directory, invoked
//! once with `deps` to discover dependencies and once with `exec` to build.
//! A directory without a Walkfile makes its targets static: pre-existing
//! input files that only need to exist.

use crate::cancel::Cancel;
use crate::paths;
use crate::process::{self, Sink};
use crate::terminal;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

/// Name of the synthetic vertex that collects the requested targets.
pub const ROOT_NAME: &str = "(root)";

/// The rulefile probed for in a target's directory.
pub const RULEFILE: &str = "Walkfile";

/// The two arguments a rulefile is called with, in the plan and exec phases.
pub const PHASE_DEPS: &str = "deps";
pub const PHASE_EXEC: &str = "exec";

pub enum Target {
    File(FileTarget),
    Root(RootTarget),
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::File(t) => &t.name,
            Target::Root(_) => ROOT_NAME,
        }
    }

    pub fn dependencies(&self, cancel: &Cancel) -> anyhow::Result<Vec<String>> {
        match self {
            Target::File(t) => t.dependencies(cancel),
            Target::Root(t) => Ok(t.deps.clone()),
        }
    }

    pub fn exec(&self, cancel: &Cancel) -> anyhow::Result<()> {
        match self {
            Target::File(t) => t.exec(cancel),
            Target::Root(_) => unreachable!("the root target is never executed"),
        }
    }
}

/// Pseudo target for the root of the graph; its dependencies are the
/// targets the user asked for.
pub struct RootTarget {
    pub deps: Vec<String>,
}

/// A target backed by a file.
pub struct FileTarget {
    /// Path relative to the working directory; the target's unique name.
    name: String,

    /// The working directory dependencies are resolved against.
    wd: PathBuf,

    /// The absolute path to the file.
    path: PathBuf,

    /// The rulefile that builds this target, when one exists.
    rulefile: Option<PathBuf>,

    /// Working directory for rulefile invocations.
    dir: PathBuf,

    stdout: Option<Sink>,
    stderr: Option<Sink>,

    /// Print the target's name in green after a successful build.
    announce: bool,
    color: bool,
}

impl FileTarget {
    pub fn new(wd: &Path, name: &str) -> FileTarget {
        let path = paths::absolute(wd, Path::new(name));
        let rulefile = rule_file(&path);
        let dir = match &rulefile {
            Some(_) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
            None => PathBuf::new(),
        };
        FileTarget {
            name: name.to_string(),
            wd: wd.to_path_buf(),
            path,
            rulefile,
            dir,
            stdout: None,
            stderr: None,
            announce: false,
            color: false,
        }
    }

    /// Attach output sinks for the rulefile's stdout and stderr.
    pub fn with_streams(
        mut self,
        stdout: Option<Box<dyn Write + Send>>,
        stderr: Option<Box<dyn Write + Send>>,
    ) -> FileTarget {
        self.stdout = stdout.map(Mutex::new);
        self.stderr = stderr.map(Mutex::new);
        self
    }

    /// Print the target name after a successful build, as the CLI does.
    pub fn announcing(mut self, color: bool) -> FileTarget {
        self.announce = true;
        self.color = color;
        self
    }

    pub fn rulefile(&self) -> Option<&Path> {
        self.rulefile.as_deref()
    }

    /// Build the target, or for a static target assert that it exists.
    pub fn exec(&self, cancel: &Cancel) -> anyhow::Result<()> {
        let result = match &self.rulefile {
            None => std::fs::metadata(&self.path)
                .map(|_| ())
                .map_err(|err| anyhow::anyhow!("stat {}: {}", self.path.display(), err)),
            Some(_) => process::run(
                self.command(PHASE_EXEC),
                self.stdout.as_ref(),
                self.stderr.as_ref(),
                cancel,
            ),
        };
        match result {
            Ok(()) => {
                if self.announce && self.rulefile.is_some() {
                    println!("{}", terminal::ansi(self.color, "32", &self.name));
                }
                Ok(())
            }
            Err(err) => Err(BuildError {
                name: self.name.clone(),
                rulefile: self.rulefile.clone(),
                err,
            }
            .into()),
        }
    }

    /// Ask the rulefile for this target's dependencies, one name per line,
    /// resolved relative to the working directory.
    pub fn dependencies(&self, cancel: &Cancel) -> anyhow::Result<Vec<String>> {
        // No rulefile, meaning it's a static dependency.
        if self.rulefile.is_none() {
            return Ok(Vec::new());
        }

        let out = process::capture(self.command(PHASE_DEPS), self.stderr.as_ref(), cancel)?;
        let out = String::from_utf8_lossy(&out);

        let mut deps = Vec::new();
        for line in out.lines() {
            if line.is_empty() {
                continue;
            }
            let path = paths::relative(&self.wd, &self.dir.join(line));
            deps.push(path.to_string_lossy().into_owned());
        }
        Ok(deps)
    }

    fn command(&self, phase: &str) -> Command {
        let rulefile = self.rulefile.as_ref().expect("target has a rulefile");
        let mut cmd = Command::new(rulefile);
        cmd.arg(phase);
        cmd.arg(self.path.file_name().unwrap_or(self.path.as_os_str()));
        cmd.current_dir(&self.dir);
        cmd
    }
}

/// Returns the rulefile that builds the target at `path`: a `Walkfile` in
/// the target's directory, or nothing for a static target.
fn rule_file(path: &Path) -> Option<PathBuf> {
    let rulefile = path.parent()?.join(RULEFILE);
    if rulefile.exists() {
        Some(rulefile)
    } else {
        None
    }
}

/// Error from building one target, carrying enough context to be printed
/// on its own line.
#[derive(Debug)]
pub struct BuildError {
    name: String,
    rulefile: Option<PathBuf>,
    err: anyhow::Error,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error performing {}", self.name)?;
        if let Some(rulefile) = &self.rulefile {
            write!(f, " (using {})", rulefile.display())?;
        }
        write!(f, ": {}", self.err)
    }
}

impl std::error::Error for BuildError {}
