use std::path::PathBuf;

use clap::ValueEnum;

use crate::format::OutputFormat;
use crate::plan::{Invocation, Step};
use crate::settings::BuildSettings;
use crate::sphinx::SphinxInvocation;

/// A named, independently invocable sequence of build steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Target {
    Help,
    Clean,
    Api,
    #[value(name = "htmlonly")]
    HtmlOnly,
    Html,
    Latex,
    Pdf,
    All,
    Dist,
    Zip,
    Linkcheck,
    Changes,
    DoctestOnly,
    Doctest,
    CleanDoctest,
    Pickle,
    Htmlhelp,
    GitwashUpdate,
    Doctor,
}

impl Target {
    pub fn name(&self) -> String {
        self.to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default()
    }

    pub fn description(&self) -> &'static str {
        match self {
            Target::Help => "list the available targets",
            Target::Clean => "remove generated output and stray backup files",
            Target::Api => "generate API reference sources",
            Target::HtmlOnly => "make standalone HTML files (without API generation)",
            Target::Html => "make standalone HTML files, including API docs",
            Target::Latex => "make LaTeX files, you can set PAPER=a4 or PAPER=letter",
            Target::Pdf => "make PDF from the LaTeX files",
            Target::All => "make HTML and PDF",
            Target::Dist => {
                "clean, build everything and collect HTML and PDF in the dist directory"
            }
            Target::Zip => "build HTML and pack it into a zip archive",
            Target::Linkcheck => "check all external links for integrity",
            Target::Changes => "make an overview of all changed/added/deprecated items",
            Target::DoctestOnly => "run doctests in the documentation",
            Target::Doctest => "generate API sources, then run doctests",
            Target::CleanDoctest => "clean, then run doctests without generating API sources",
            Target::Pickle => "make pickle files",
            Target::Htmlhelp => "make HTML files and a HTML help project",
            Target::GitwashUpdate => "refresh the git workflow pages",
            Target::Doctor => "check that the external tools are installed",
        }
    }

    pub fn prerequisites(&self) -> &'static [Target] {
        match self {
            Target::Html => &[Target::Api, Target::HtmlOnly],
            Target::Latex => &[Target::Api],
            Target::Pdf => &[Target::Latex],
            Target::All => &[Target::Html, Target::Pdf],
            Target::Dist => &[Target::Clean, Target::All],
            Target::Zip => &[Target::Html],
            Target::Doctest => &[Target::Api, Target::DoctestOnly],
            Target::CleanDoctest => &[Target::Clean, Target::DoctestOnly],
            _ => &[],
        }
    }

    /// The target's own steps, excluding its prerequisites.
    pub fn recipe(&self, settings: &BuildSettings) -> Vec<Step> {
        match self {
            Target::Help
            | Target::Doctor
            | Target::All
            | Target::Doctest
            | Target::CleanDoctest => Vec::new(),
            Target::Clean => clean_recipe(settings),
            Target::Api => {
                let mut steps = external_command(&settings.api_command);
                steps.push(Step::Echo("Build API docs finished.".to_string()));
                steps
            }
            Target::HtmlOnly => generator_recipe(settings, OutputFormat::Html),
            Target::Html => vec![Step::Symlink {
                target: settings.build_dir.clone(),
                link: settings.manual_link.clone(),
            }],
            Target::Latex => latex_recipe(settings),
            Target::Pdf => vec![
                Step::Exec(
                    Invocation::new("make", vec!["all-pdf".to_string()])
                        .current_dir(settings.output_dir(OutputFormat::Latex)),
                ),
                Step::Echo(format!(
                    "Build finished; the PDF is {}.",
                    settings.pdf_artifact().display()
                )),
            ],
            Target::Dist => vec![
                Step::EnsureDir(settings.dist_dir.clone()),
                Step::HardLink {
                    src: settings.pdf_artifact(),
                    dst_dir: settings.dist_dir.clone(),
                },
                Step::CopyTree {
                    src: settings.output_dir(OutputFormat::Html),
                    dst: settings.dist_dir.clone(),
                },
                Step::Echo(format!(
                    "Build finished. Final docs are in {}.",
                    settings.dist_dir.display()
                )),
            ],
            Target::Zip => vec![
                Step::Zip {
                    src: settings.output_dir(OutputFormat::Html),
                    dst: settings.docs_archive.clone(),
                },
                Step::Echo(format!(
                    "Zipped HTML docs into {}.",
                    settings.docs_archive.display()
                )),
            ],
            Target::Linkcheck => generator_recipe(settings, OutputFormat::Linkcheck),
            Target::Changes => generator_recipe(settings, OutputFormat::Changes),
            Target::DoctestOnly => generator_recipe(settings, OutputFormat::Doctest),
            Target::Pickle => generator_recipe(settings, OutputFormat::Pickle),
            Target::Htmlhelp => generator_recipe(settings, OutputFormat::Htmlhelp),
            Target::GitwashUpdate => gitwash_recipe(settings),
        }
    }
}

fn external_command(command: &str) -> Vec<Step> {
    match Invocation::from_command_line(command) {
        Some(invocation) => vec![Step::Exec(invocation)],
        None => {
            tracing::warn!("empty command configured, skipping");
            Vec::new()
        }
    }
}

fn generator_steps(settings: &BuildSettings, format: OutputFormat) -> Vec<Step> {
    vec![
        Step::EnsureDir(settings.output_dir(format)),
        Step::EnsureDir(settings.doctree_dir()),
        Step::Exec(SphinxInvocation::new(settings, format).build()),
    ]
}

fn generator_recipe(settings: &BuildSettings, format: OutputFormat) -> Vec<Step> {
    let mut steps = generator_steps(settings, format);
    let output_dir = settings.output_dir(format);
    steps.push(Step::Echo(format.finished_message(&output_dir.to_string_lossy())));
    steps
}

fn latex_recipe(settings: &BuildSettings) -> Vec<Step> {
    let mut steps = generator_steps(settings, OutputFormat::Latex);

    if let Some(fix) = Invocation::from_command_line(&settings.longtable_fix_command) {
        steps.push(Step::Exec(fix.arg(settings.latex_source().to_string_lossy())));
    }

    let output_dir = settings.output_dir(OutputFormat::Latex);
    steps.push(Step::Echo(OutputFormat::Latex.finished_message(&output_dir.to_string_lossy())));
    steps
}

fn clean_recipe(settings: &BuildSettings) -> Vec<Step> {
    vec![
        Step::Remove(settings.build_dir.clone()),
        Step::Remove(settings.dist_dir.clone()),
        Step::Remove(PathBuf::from("api").join("generated")),
        Step::Remove(PathBuf::from("labs").join("generated")),
        Step::Remove(settings.manual_link.clone()),
        Step::Remove(settings.docs_archive.clone()),
        Step::RemoveMatching {
            dir: PathBuf::from("."),
            suffix: "~".to_string(),
        },
    ]
}

fn gitwash_recipe(settings: &BuildSettings) -> Vec<Step> {
    let Some(dumper) = Invocation::from_command_line(&settings.gitwash_command) else {
        tracing::warn!("empty gitwash command configured, skipping");
        return Vec::new();
    };

    vec![Step::Exec(
        dumper
            .arg("devel")
            .arg(settings.project.as_str())
            .arg(format!("--repo-name={}", settings.project))
            .arg(format!("--github-user={}", settings.github_user))
            .arg(format!("--project-url={}", settings.project_url))
            .arg(format!("--project-ml-url={}", settings.project_ml_url)),
    )]
}
