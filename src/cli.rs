use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::executor::{Executor, RunOutcome, SystemLauncher};
use crate::plan::{Invocation, Plan};
use crate::settings::BuildSettings;
use crate::target::Target;

#[derive(Parser, Debug)]
#[command(name = "docbuild")]
#[command(about = "Build the project documentation: HTML, LaTeX/PDF, doctests and link checks")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Target to build
    #[arg(value_enum, default_value = "help")]
    pub target: Target,

    /// Documentation source directory
    #[arg(short = 'C', long, default_value = ".")]
    pub doc_dir: PathBuf,

    /// Documentation generator executable
    #[arg(long, env = "SPHINXBUILD", default_value = "sphinx-build")]
    pub sphinx_build: String,

    /// Paper size for LaTeX output (a4 or letter)
    #[arg(long, env = "PAPER")]
    pub paper: Option<String>,

    /// Extra options appended to every generator run
    #[arg(long, env = "SPHINXOPTS", default_value = "", allow_hyphen_values = true)]
    pub sphinx_opts: String,

    /// Directory collecting distribution artifacts
    #[arg(long, env = "DIST_DIR", default_value = "dist")]
    pub dist_dir: PathBuf,

    /// Build root holding one directory per output format
    #[arg(long, default_value = "build")]
    pub build_dir: PathBuf,

    /// Project name used for the PDF artifact and git workflow pages
    #[arg(long, default_value = "nipy")]
    pub project: String,

    /// Print the steps without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON report of the executed steps
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn settings(&self) -> BuildSettings {
        BuildSettings::new(&self.doc_dir)
            .sphinx_build(self.sphinx_build.as_str())
            .paper(self.paper.as_deref())
            .sphinx_opts(&self.sphinx_opts)
            .build_dir(self.build_dir.clone())
            .dist_dir(self.dist_dir.clone())
            .project(self.project.as_str())
    }
}

pub fn run_cli() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let settings = cli.settings();

    match cli.target {
        Target::Help => {
            print!("{}", help_text());
            Ok(())
        }
        Target::Doctor => doctor_command(&settings),
        target => build_command(target, &settings, cli.dry_run, cli.report.as_deref()),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_directive = if verbose { "docbuild=debug" } else { "docbuild=info" };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(default_directive.parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

fn build_command(
    target: Target,
    settings: &BuildSettings,
    dry_run: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    if !settings.doc_dir.is_dir() {
        return Err(anyhow!(
            "Documentation directory does not exist: {}",
            settings.doc_dir.display()
        ));
    }

    let plan = Plan::for_target(target, settings);
    if plan.is_empty() {
        tracing::info!("Nothing to be done for '{}'", target.name());
        return Ok(());
    }

    let order: Vec<String> = plan.target_order().iter().map(Target::name).collect();
    tracing::debug!(
        target_name = %target.name(),
        steps = plan.len(),
        order = ?order,
        "planned target"
    );

    let mut executor = Executor::new(&settings.doc_dir, SystemLauncher).dry_run(dry_run);
    let outcome = executor.run(&plan);

    finish_run(target, outcome, report_path)
}

/// Writes the optional report, then surfaces the first failing step.
/// A report that cannot be written never masks a step failure.
fn finish_run(target: Target, outcome: RunOutcome, report_path: Option<&Path>) -> Result<()> {
    let write_result = report_path.map(|path| outcome.report.write(path));

    if let Some(failed) = outcome.report.failed_step() {
        tracing::debug!(target_name = %failed.target, step = %failed.step, "run stopped");
    }

    match outcome.into_result() {
        Ok(_) => {
            if let Some(result) = write_result {
                result?;
            }
            Ok(())
        }
        Err(err) => {
            if let Some(Err(write_err)) = write_result {
                tracing::warn!("{write_err:#}");
            }
            Err(err).with_context(|| format!("Target '{}' failed", target.name()))
        }
    }
}

/// Listing printed by the `help` target.
pub fn help_text() -> String {
    let mut text = String::from("Please use `docbuild <target>' where <target> is one of\n");
    for target in Target::value_variants() {
        text.push_str(&format!("  {:<15} to {}\n", target.name(), target.description()));
    }
    text
}

fn doctor_command(settings: &BuildSettings) -> Result<()> {
    println!("docbuild doctor - checking documentation tools...\n");

    check_command_available(&settings.sphinx_build, "Documentation generator")?;

    let optional = [
        (
            Invocation::from_command_line(&settings.api_command),
            "API template generator (api)",
        ),
        (
            Invocation::from_command_line(&settings.longtable_fix_command),
            "LaTeX longtable fix-up (latex)",
        ),
        (Some(Invocation::new("make", Vec::new())), "make (pdf)"),
        (Some(Invocation::new("pdflatex", Vec::new())), "pdflatex (pdf)"),
    ];

    for (invocation, description) in optional {
        let Some(invocation) = invocation else {
            println!("- {description}: not configured");
            continue;
        };
        match which::which(&invocation.program) {
            Ok(path) => println!("✓ {} found at: {}", description, path.display()),
            Err(_) => println!("✗ {} not found ({})", description, invocation.program),
        }
    }

    println!("\nOutput layout:");
    println!("  build root: {}", settings.build_dir.display());
    println!("  doctrees:   {}", settings.doctree_dir().display());
    println!("  dist:       {}", settings.dist_dir.display());
    match settings.paper {
        Some(paper) => println!("  paper size: {}", paper.as_str()),
        None => println!("  paper size: generator default"),
    }

    println!("\n✓ docbuild doctor check complete");

    Ok(())
}

fn check_command_available(command: &str, description: &str) -> Result<()> {
    match which::which(command) {
        Ok(path) => {
            println!("✓ {} found at: {}", description, path.display());
            Ok(())
        }
        Err(_) => {
            println!("✗ {} not found ({})", description, command);
            Err(anyhow!("{} is required but not found in PATH", description))
        }
    }
}
