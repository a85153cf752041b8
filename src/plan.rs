//! Flattened, ordered step lists for a target and its prerequisites.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::settings::BuildSettings;
use crate::target::Target;

/// An external command. `cwd` is relative to the documentation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
        }
    }

    /// Splits a configured command line like `python ../tools/x.py` on whitespace.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cwd) = &self.cwd {
            write!(f, "cd {} && ", cwd.display())?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// One unit of work. Paths are relative to the documentation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    EnsureDir(PathBuf),
    Remove(PathBuf),
    RemoveMatching { dir: PathBuf, suffix: String },
    Exec(Invocation),
    Symlink { target: PathBuf, link: PathBuf },
    HardLink { src: PathBuf, dst_dir: PathBuf },
    CopyTree { src: PathBuf, dst: PathBuf },
    Zip { src: PathBuf, dst: PathBuf },
    Echo(String),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::EnsureDir(path) => write!(f, "mkdir -p {}", path.display()),
            Step::Remove(path) => write!(f, "rm -rf {}", path.display()),
            Step::RemoveMatching { dir, suffix } => {
                write!(f, "rm -f {}", dir.join(format!("*{suffix}")).display())
            }
            Step::Exec(invocation) => write!(f, "{invocation}"),
            Step::Symlink { target, link } => {
                write!(f, "ln -s {} {}", target.display(), link.display())
            }
            Step::HardLink { src, dst_dir } => {
                write!(f, "ln {} {}", src.display(), dst_dir.display())
            }
            Step::CopyTree { src, dst } => {
                write!(f, "cp -a {}/* {}", src.display(), dst.display())
            }
            Step::Zip { src, dst } => write!(f, "zip -r {} {}", dst.display(), src.display()),
            Step::Echo(message) => write!(f, "echo {message:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub target: Target,
    pub step: Step,
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub target: Target,
    pub steps: Vec<PlannedStep>,
}

impl Plan {
    /// Expands prerequisites depth-first; a target reached twice runs once.
    pub fn for_target(target: Target, settings: &BuildSettings) -> Self {
        let mut visited = HashSet::new();
        let mut steps = Vec::new();
        Self::expand(target, settings, &mut visited, &mut steps);

        Self { target, steps }
    }

    fn expand(
        target: Target,
        settings: &BuildSettings,
        visited: &mut HashSet<Target>,
        steps: &mut Vec<PlannedStep>,
    ) {
        if !visited.insert(target) {
            return;
        }

        for prerequisite in target.prerequisites() {
            Self::expand(*prerequisite, settings, visited, steps);
        }

        steps.extend(
            target
                .recipe(settings)
                .into_iter()
                .map(|step| PlannedStep { target, step }),
        );
    }

    /// Targets in the order their recipes run, skipping those with empty recipes.
    pub fn target_order(&self) -> Vec<Target> {
        let mut order: Vec<Target> = Vec::new();
        for planned in &self.steps {
            if order.last() != Some(&planned.target) {
                order.push(planned.target);
            }
        }
        order
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}
