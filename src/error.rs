use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single plan step. The first one aborts the run.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{program} not found or not executable")]
    MissingTool {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with status {code}")]
    ToolFailed { program: String, code: i32 },

    #[error("{program} was terminated by a signal")]
    Interrupted { program: String },

    #[error("{action} {path}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StepError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Process exit code to report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            StepError::ToolFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
