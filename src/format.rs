#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Html,
    Latex,
    Doctest,
    Linkcheck,
    Changes,
    Pickle,
    Htmlhelp,
}

impl OutputFormat {
    pub fn all() -> &'static [OutputFormat] {
        &[
            OutputFormat::Html,
            OutputFormat::Latex,
            OutputFormat::Doctest,
            OutputFormat::Linkcheck,
            OutputFormat::Changes,
            OutputFormat::Pickle,
            OutputFormat::Htmlhelp,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Latex => "latex",
            OutputFormat::Doctest => "doctest",
            OutputFormat::Linkcheck => "linkcheck",
            OutputFormat::Changes => "changes",
            OutputFormat::Pickle => "pickle",
            OutputFormat::Htmlhelp => "htmlhelp",
        }
    }

    /// Builder name passed to the generator's `-b` flag.
    pub fn builder(&self) -> &'static str {
        self.as_str()
    }

    /// Subdirectory of the build root the generator writes into.
    pub fn dir_name(&self) -> &'static str {
        self.as_str()
    }

    /// Line printed once the generator finishes.
    pub fn finished_message(&self, output_dir: &str) -> String {
        match self {
            OutputFormat::Html => format!("Build finished. The HTML pages are in {output_dir}."),
            OutputFormat::Latex => format!(
                "Build finished; the LaTeX files are in {output_dir}.\n\
                 Run `docbuild pdf' to run these through (pdf)latex."
            ),
            OutputFormat::Doctest => format!(
                "Testing of doctests in the sources finished, look at the \
                 results in {output_dir}/output.txt."
            ),
            OutputFormat::Linkcheck => format!(
                "Link check complete; look for any errors in the above output \
                 or in {output_dir}/output.txt."
            ),
            OutputFormat::Changes => format!("The overview file is in {output_dir}."),
            OutputFormat::Pickle => {
                format!("Build finished; now you can process the pickle files in {output_dir}.")
            }
            OutputFormat::Htmlhelp => format!(
                "Build finished; now you can run HTML Help Workshop with the \
                 .hhp project file in {output_dir}."
            ),
        }
    }
}
