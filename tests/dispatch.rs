use std::fs;
use std::path::Path;

use docbuild::plan::{PlannedStep, Step};
use docbuild::report::StepOutcome;
use docbuild::{
    BuildSettings, Executor, Invocation, Launcher, Plan, StepError, SystemLauncher, Target,
};

/// Records every command and imitates the files real tools would write.
#[derive(Default)]
struct StandIn {
    calls: Vec<Invocation>,
    fail_on: Option<&'static str>,
    skip_pdf: bool,
}

impl StandIn {
    fn failing_on(token: &'static str) -> Self {
        Self {
            fail_on: Some(token),
            ..Self::default()
        }
    }

    fn programs(&self) -> Vec<String> {
        self.calls.iter().map(|call| call.to_string()).collect()
    }
}

impl Launcher for StandIn {
    fn launch(&mut self, invocation: &Invocation, cwd: &Path) -> Result<(), StepError> {
        self.calls.push(invocation.clone());

        if let Some(token) = self.fail_on {
            if invocation.program == token || invocation.args.iter().any(|arg| arg == token) {
                return Err(StepError::ToolFailed {
                    program: invocation.program.clone(),
                    code: 2,
                });
            }
        }

        match invocation.program.as_str() {
            "sphinx-build" => {
                let out = cwd.join(invocation.args.last().unwrap());
                fs::create_dir_all(out.join("_static")).unwrap();
                fs::write(out.join("index.html"), "<html/>").unwrap();
                fs::write(out.join("_static").join("basic.css"), "").unwrap();
            }
            "make" if !self.skip_pdf => {
                fs::write(cwd.join("nipy.pdf"), "%PDF-1.4").unwrap();
            }
            _ => {}
        }

        Ok(())
    }
}

fn run(
    root: &Path,
    target: Target,
    launcher: StandIn,
) -> (Executor<StandIn>, Result<(), StepError>) {
    let plan = Plan::for_target(target, &BuildSettings::new(root));
    let mut executor = Executor::new(root, launcher);
    let result = executor.run(&plan).into_result().map(|_| ());
    (executor, result)
}

#[test]
fn test_html_runs_api_then_generator_then_link() {
    let tmp = tempfile::tempdir().unwrap();
    let (executor, result) = run(tmp.path(), Target::Html, StandIn::default());

    result.unwrap();
    assert_eq!(
        executor.launcher().programs(),
        vec![
            "python ../tools/build_modref_templates.py",
            "sphinx-build -b html -d build/doctrees . build/html",
        ]
    );
    assert!(tmp.path().join("build/html/index.html").is_file());
    assert!(tmp.path().join("build/doctrees").is_dir());
    let link = fs::symlink_metadata(tmp.path().join("manual")).unwrap();
    assert!(link.file_type().is_symlink());
}

#[test]
fn test_failing_generator_aborts_remaining_steps() {
    let tmp = tempfile::tempdir().unwrap();
    let (executor, result) = run(tmp.path(), Target::Html, StandIn::failing_on("html"));

    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(executor.launcher().calls.len(), 2);
    // Directories created before the failure are left behind.
    assert!(tmp.path().join("build/html").is_dir());
    assert!(fs::symlink_metadata(tmp.path().join("manual")).is_err());
}

#[test]
fn test_all_runs_html_then_pdf_with_api_once() {
    let tmp = tempfile::tempdir().unwrap();
    let (executor, result) = run(tmp.path(), Target::All, StandIn::default());

    result.unwrap();
    assert_eq!(
        executor.launcher().programs(),
        vec![
            "python ../tools/build_modref_templates.py",
            "sphinx-build -b html -d build/doctrees . build/html",
            "sphinx-build -b latex -d build/doctrees . build/latex",
            "python ../tools/fix_longtable.py build/latex/nipy.tex",
            "cd build/latex && make all-pdf",
        ]
    );
}

#[test]
fn test_failing_api_stops_latex_before_generator() {
    let tmp = tempfile::tempdir().unwrap();
    let (executor, result) = run(
        tmp.path(),
        Target::Pdf,
        StandIn::failing_on("../tools/build_modref_templates.py"),
    );

    assert!(result.is_err());
    assert_eq!(executor.launcher().calls.len(), 1);
    assert!(!tmp.path().join("build/latex").exists());
}

#[test]
fn test_dist_collects_pdf_and_html() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("index.rst~"), "stale").unwrap();

    let (_, result) = run(tmp.path(), Target::Dist, StandIn::default());

    result.unwrap();
    let dist = tmp.path().join("dist");
    assert_eq!(fs::read_to_string(dist.join("nipy.pdf")).unwrap(), "%PDF-1.4");
    assert!(dist.join("index.html").is_file());
    assert!(dist.join("_static").join("basic.css").is_file());
    assert!(!tmp.path().join("index.rst~").exists());
}

#[test]
fn test_dist_fails_without_pdf() {
    let tmp = tempfile::tempdir().unwrap();
    let launcher = StandIn {
        skip_pdf: true,
        ..StandIn::default()
    };

    let plan = Plan::for_target(Target::Dist, &BuildSettings::new(tmp.path()));
    let mut executor = Executor::new(tmp.path(), launcher);
    let outcome = executor.run(&plan);

    let failed = outcome.report.failed_step().unwrap().clone();
    assert_eq!(failed.target, "dist");
    assert!(failed.step.starts_with("ln "));
    let err = outcome.into_result().unwrap_err();
    assert!(matches!(err, StepError::Io { .. }));
    assert_ne!(err.exit_code(), 0);
    assert!(!tmp.path().join("dist").join("index.html").exists());
}

#[test]
fn test_zip_builds_html_then_archives_it() {
    let tmp = tempfile::tempdir().unwrap();
    let (executor, result) = run(tmp.path(), Target::Zip, StandIn::default());

    result.unwrap();
    assert_eq!(executor.launcher().calls.len(), 2);

    let archive_file = fs::File::open(tmp.path().join("documentation.zip")).unwrap();
    let archive = zip::ZipArchive::new(archive_file).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, vec!["html_docs/_static/basic.css", "html_docs/index.html"]);
}

#[test]
fn test_zip_without_html_output_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let plan = Plan {
        target: Target::Zip,
        steps: vec![PlannedStep {
            target: Target::Zip,
            step: Step::Zip {
                src: "build/html".into(),
                dst: "documentation.zip".into(),
            },
        }],
    };

    let mut executor = Executor::new(tmp.path(), StandIn::default());
    let err = executor.run(&plan).into_result().unwrap_err();

    assert!(matches!(err, StepError::Io { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(!tmp.path().join("documentation.zip").exists());
}

#[test]
fn test_clean_then_build_regenerates_output() {
    let tmp = tempfile::tempdir().unwrap();
    run(tmp.path(), Target::Html, StandIn::default()).1.unwrap();
    fs::create_dir_all(tmp.path().join("api/generated")).unwrap();

    run(tmp.path(), Target::Clean, StandIn::default()).1.unwrap();
    assert!(!tmp.path().join("build").exists());
    assert!(!tmp.path().join("api/generated").exists());
    assert!(fs::symlink_metadata(tmp.path().join("manual")).is_err());

    run(tmp.path(), Target::Html, StandIn::default()).1.unwrap();
    assert!(tmp.path().join("build/html/index.html").is_file());
}

#[test]
fn test_clean_tolerates_empty_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let (executor, result) = run(tmp.path(), Target::Clean, StandIn::default());

    result.unwrap();
    assert!(executor.launcher().calls.is_empty());
}

#[test]
fn test_single_step_targets_rerun_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    for target in [Target::Linkcheck, Target::Changes, Target::Pickle, Target::Htmlhelp] {
        run(tmp.path(), target, StandIn::default()).1.unwrap();
        run(tmp.path(), target, StandIn::default()).1.unwrap();
    }
    run(tmp.path(), Target::Html, StandIn::default()).1.unwrap();
    run(tmp.path(), Target::Html, StandIn::default()).1.unwrap();

    assert!(tmp.path().join("build/linkcheck").is_dir());
    assert!(tmp.path().join("build/htmlhelp").is_dir());
}

#[test]
fn test_clean_doctest_skips_api_generation() {
    let tmp = tempfile::tempdir().unwrap();
    let (executor, result) = run(tmp.path(), Target::CleanDoctest, StandIn::default());

    result.unwrap();
    assert_eq!(
        executor.launcher().programs(),
        vec!["sphinx-build -b doctest -d build/doctrees . build/doctest"]
    );
}

#[test]
fn test_help_touches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let (executor, result) = run(tmp.path(), Target::Help, StandIn::default());

    result.unwrap();
    assert!(executor.launcher().calls.is_empty());
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    assert!(docbuild::cli::help_text().contains("clean-doctest"));
}

#[test]
fn test_dry_run_executes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let plan = Plan::for_target(Target::All, &BuildSettings::new(tmp.path()));
    let mut executor = Executor::new(tmp.path(), StandIn::default()).dry_run(true);
    let report = executor.run(&plan).into_result().unwrap();

    assert!(executor.launcher().calls.is_empty());
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    assert!(report.dry_run);
    assert!(report.steps.iter().all(|record| record.outcome == StepOutcome::Skipped));
}

#[test]
fn test_missing_generator_fails_fast() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = BuildSettings::new(tmp.path()).sphinx_build("docbuild-missing-generator");
    let plan = Plan::for_target(Target::Linkcheck, &settings);
    let mut executor = Executor::new(tmp.path(), SystemLauncher);

    let err = executor.run(&plan).into_result().unwrap_err();
    assert!(matches!(err, StepError::MissingTool { .. }));
    assert!(tmp.path().join("build/linkcheck").is_dir());
}
