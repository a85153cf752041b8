use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::StepError;
use crate::plan::{Invocation, Plan, Step};
use crate::report::{RunReport, StepOutcome};

/// Runs external commands. Tests substitute a recording stand-in.
pub trait Launcher {
    fn launch(&mut self, invocation: &Invocation, cwd: &Path) -> Result<(), StepError>;
}

/// Spawns real processes; their output passes through untouched.
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&mut self, invocation: &Invocation, cwd: &Path) -> Result<(), StepError> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(cwd)
            .status()
            .map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound
                    || source.kind() == io::ErrorKind::PermissionDenied
                {
                    StepError::MissingTool {
                        program: invocation.program.clone(),
                        source,
                    }
                } else {
                    StepError::io("failed to spawn", &invocation.program, source)
                }
            })?;

        if status.success() {
            return Ok(());
        }

        match status.code() {
            Some(code) => Err(StepError::ToolFailed {
                program: invocation.program.clone(),
                code,
            }),
            None => Err(StepError::Interrupted {
                program: invocation.program.clone(),
            }),
        }
    }
}

pub struct Executor<L: Launcher> {
    root: PathBuf,
    launcher: L,
    dry_run: bool,
}

/// Result of a run: the report is always produced, the error only on failure.
pub struct RunOutcome {
    pub report: RunReport,
    pub error: Option<StepError>,
}

impl RunOutcome {
    pub fn into_result(self) -> Result<RunReport, StepError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.report),
        }
    }
}

impl<L: Launcher> Executor<L> {
    pub fn new(root: impl AsRef<Path>, launcher: L) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            launcher,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Executes steps in order. The first failure stops the run; nothing is rolled back.
    pub fn run(&mut self, plan: &Plan) -> RunOutcome {
        let mut report = RunReport::new(plan.target, self.dry_run);

        for planned in &plan.steps {
            let description = planned.step.to_string();

            if self.dry_run {
                println!("{description}");
                report.record(planned.target, description, StepOutcome::Skipped);
                continue;
            }

            tracing::debug!(target_name = %planned.target.name(), step = %description, "running step");

            match self.execute(&planned.step) {
                Ok(()) => report.record(planned.target, description, StepOutcome::Succeeded),
                Err(err) => {
                    tracing::error!(target_name = %planned.target.name(), step = %description, "step failed: {err}");
                    report.record(
                        planned.target,
                        description,
                        StepOutcome::Failed(err.to_string()),
                    );
                    return RunOutcome {
                        report,
                        error: Some(err),
                    };
                }
            }
        }

        RunOutcome {
            report,
            error: None,
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn execute(&mut self, step: &Step) -> Result<(), StepError> {
        match step {
            Step::EnsureDir(path) => {
                let path = self.resolve(path);
                fs::create_dir_all(&path)
                    .map_err(|e| StepError::io("failed to create directory", path, e))
            }
            Step::Remove(path) => {
                remove_tolerant(&self.resolve(path));
                Ok(())
            }
            Step::RemoveMatching { dir, suffix } => {
                remove_matching(&self.resolve(dir), suffix);
                Ok(())
            }
            Step::Exec(invocation) => {
                let cwd = match &invocation.cwd {
                    Some(dir) => self.resolve(dir),
                    None => self.root.clone(),
                };
                self.launcher.launch(invocation, &cwd)
            }
            Step::Symlink { target, link } => {
                let link = self.resolve(link);
                if fs::symlink_metadata(&link).is_ok() {
                    tracing::debug!(link = %link.display(), "link already present");
                    return Ok(());
                }
                make_symlink(target, &link)
                    .map_err(|e| StepError::io("failed to create link", link, e))
            }
            Step::HardLink { src, dst_dir } => {
                let src = self.resolve(src);
                let file_name = src.file_name().ok_or_else(|| {
                    StepError::io(
                        "invalid link source",
                        &src,
                        io::Error::from(io::ErrorKind::InvalidInput),
                    )
                })?;
                let dst = self.resolve(dst_dir).join(file_name);

                if !src.exists() {
                    return Err(StepError::io(
                        "missing artifact",
                        src,
                        io::Error::from(io::ErrorKind::NotFound),
                    ));
                }
                if fs::symlink_metadata(&dst).is_ok() {
                    fs::remove_file(&dst)
                        .map_err(|e| StepError::io("failed to replace", &dst, e))?;
                }
                fs::hard_link(&src, &dst).map_err(|e| StepError::io("failed to link", dst, e))
            }
            Step::CopyTree { src, dst } => {
                let src = self.resolve(src);
                let dst = self.resolve(dst);
                copy_tree(&src, &dst)
            }
            Step::Zip { src, dst } => {
                let src = self.resolve(src);
                let dst = self.resolve(dst);
                zip_tree(&src, &dst)
            }
            Step::Echo(message) => {
                println!("{message}");
                Ok(())
            }
        }
    }
}

fn remove_tolerant(path: &Path) {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return,
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => tracing::info!("Removing {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not remove {}: {e}", path.display()),
    }
}

fn remove_matching(dir: &Path, suffix: &str) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("skipping {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_file = entry.file_type().map(|t| !t.is_dir()).unwrap_or(false);
        if is_file && entry.file_name().to_string_lossy().ends_with(suffix) {
            remove_tolerant(&path);
        }
    }
}

/// Copies the contents of `src` into `dst`, preserving the directory layout.
fn copy_tree(src: &Path, dst: &Path) -> Result<(), StepError> {
    fs::create_dir_all(dst).map_err(|e| StepError::io("failed to create directory", dst, e))?;

    let entries = fs::read_dir(src).map_err(|e| StepError::io("failed to read", src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| StepError::io("failed to read", src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| StepError::io("failed to inspect", &from, e))?;

        if file_type.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| StepError::io("failed to copy", &from, e))?;
        }
    }

    Ok(())
}

/// Prefix every archived file sits under.
const ARCHIVE_PREFIX: &str = "html_docs";

/// Packs every file under `src` into a deflated archive at `dst`, skipping `.doctrees`.
fn zip_tree(src: &Path, dst: &Path) -> Result<(), StepError> {
    if !src.is_dir() {
        return Err(StepError::io(
            "Doc directory does not exist:",
            src,
            io::Error::from(io::ErrorKind::NotFound),
        ));
    }

    let mut files = Vec::new();
    collect_files(src, Path::new(""), &mut files)?;
    files.sort();

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| StepError::io("failed to create directory", parent, e))?;
    }
    let file = fs::File::create(dst).map_err(|e| StepError::io("failed to create", dst, e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for relative in files {
        let name = archive_name(&relative);
        writer
            .start_file(name, options)
            .map_err(|e| StepError::io("failed to write", dst, io::Error::other(e)))?;

        let from = src.join(&relative);
        let mut input =
            fs::File::open(&from).map_err(|e| StepError::io("failed to read", &from, e))?;
        io::copy(&mut input, &mut writer).map_err(|e| StepError::io("failed to write", dst, e))?;
    }

    writer
        .finish()
        .map_err(|e| StepError::io("failed to write", dst, io::Error::other(e)))?;

    tracing::debug!(archive = %dst.display(), "wrote documentation archive");
    Ok(())
}

fn collect_files(root: &Path, relative: &Path, files: &mut Vec<PathBuf>) -> Result<(), StepError> {
    let dir = root.join(relative);
    let entries = fs::read_dir(&dir).map_err(|e| StepError::io("failed to read", &dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| StepError::io("failed to read", &dir, e))?;
        let child = relative.join(entry.file_name());
        if child.starts_with(".doctrees") {
            continue;
        }

        let file_type = entry
            .file_type()
            .map_err(|e| StepError::io("failed to inspect", entry.path(), e))?;
        if file_type.is_dir() {
            collect_files(root, &child, files)?;
        } else {
            files.push(child);
        }
    }

    Ok(())
}

/// Archive entry name with `/` separators regardless of platform.
fn archive_name(relative: &Path) -> String {
    let mut name = String::from(ARCHIVE_PREFIX);
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
