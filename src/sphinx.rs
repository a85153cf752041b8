use std::path::PathBuf;

use crate::format::OutputFormat;
use crate::plan::Invocation;
use crate::settings::BuildSettings;

/// Builds one generator run: `<sphinx-build> -b <builder> <options> . <outdir>`.
pub struct SphinxInvocation {
    program: String,
    format: OutputFormat,
    options: Vec<String>,
    source_dir: PathBuf,
    output_dir: PathBuf,
}

impl SphinxInvocation {
    pub fn new(settings: &BuildSettings, format: OutputFormat) -> Self {
        Self {
            program: settings.sphinx_build.clone(),
            format,
            options: settings.generator_options(),
            source_dir: PathBuf::from("."),
            output_dir: settings.output_dir(format),
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn build(&self) -> Invocation {
        let mut args = vec!["-b".to_string(), self.format.builder().to_string()];
        args.extend(self.options.iter().cloned());
        args.push(self.source_dir.to_string_lossy().into_owned());
        args.push(self.output_dir.to_string_lossy().into_owned());

        Invocation::new(self.program.clone(), args)
    }
}
