use std::path::{Path, PathBuf};

use crate::format::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paper {
    A4,
    Letter,
}

impl Paper {
    /// Recognizes `a4` and `letter`; anything else yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(Paper::A4),
            "letter" => Some(Paper::Letter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Paper::A4 => "a4",
            Paper::Letter => "letter",
        }
    }
}

/// Configuration for one invocation. Set once at start, read by every target.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub doc_dir: PathBuf,
    pub sphinx_build: String,
    pub paper: Option<Paper>,
    pub sphinx_opts: Vec<String>,
    pub build_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub project: String,
    pub api_command: String,
    pub longtable_fix_command: String,
    pub gitwash_command: String,
    pub github_user: String,
    pub project_url: String,
    pub project_ml_url: String,
    pub manual_link: PathBuf,
    pub docs_archive: PathBuf,
}

impl BuildSettings {
    pub fn new(doc_dir: impl AsRef<Path>) -> Self {
        Self {
            doc_dir: doc_dir.as_ref().to_path_buf(),
            sphinx_build: "sphinx-build".to_string(),
            paper: None,
            sphinx_opts: Vec::new(),
            build_dir: PathBuf::from("build"),
            dist_dir: PathBuf::from("dist"),
            project: "nipy".to_string(),
            api_command: "python ../tools/build_modref_templates.py".to_string(),
            longtable_fix_command: "python ../tools/fix_longtable.py".to_string(),
            gitwash_command: "python ../tools/gitwash_dumper.py".to_string(),
            github_user: "nipy".to_string(),
            project_url: "http://nipy.org/nipy".to_string(),
            project_ml_url: "http://mail.scipy.org/mailman/listinfo/nipy-devel".to_string(),
            manual_link: PathBuf::from("manual"),
            docs_archive: PathBuf::from("documentation.zip"),
        }
    }

    pub fn sphinx_build(mut self, program: impl Into<String>) -> Self {
        self.sphinx_build = program.into();
        self
    }

    /// Unrecognized paper sizes leave the option unset.
    pub fn paper(mut self, paper: Option<&str>) -> Self {
        self.paper = paper.and_then(|value| {
            let parsed = Paper::parse(value);
            if parsed.is_none() && !value.trim().is_empty() {
                tracing::debug!(paper = value, "ignoring unrecognized paper size");
            }
            parsed
        });
        self
    }

    /// Split on whitespace and appended verbatim to every generator run.
    pub fn sphinx_opts(mut self, opts: &str) -> Self {
        self.sphinx_opts = opts.split_whitespace().map(str::to_string).collect();
        self
    }

    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    pub fn dist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dist_dir = dir.into();
        self
    }

    pub fn project(mut self, name: impl Into<String>) -> Self {
        self.project = name.into();
        self
    }

    pub fn doctree_dir(&self) -> PathBuf {
        self.build_dir.join("doctrees")
    }

    pub fn output_dir(&self, format: OutputFormat) -> PathBuf {
        self.build_dir.join(format.dir_name())
    }

    pub fn latex_source(&self) -> PathBuf {
        self.output_dir(OutputFormat::Latex).join(format!("{}.tex", self.project))
    }

    pub fn pdf_artifact(&self) -> PathBuf {
        self.output_dir(OutputFormat::Latex).join(format!("{}.pdf", self.project))
    }

    /// Options shared by every generator run: doctree cache, paper size, extras.
    pub fn generator_options(&self) -> Vec<String> {
        let mut options = vec![
            "-d".to_string(),
            self.doctree_dir().to_string_lossy().into_owned(),
        ];

        if let Some(paper) = self.paper {
            options.push("-D".to_string());
            options.push(format!("latex_paper_size={}", paper.as_str()));
        }

        options.extend(self.sphinx_opts.iter().cloned());
        options
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::new(".")
    }
}
