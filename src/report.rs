use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::target::Target;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub target: String,
    pub step: String,
    pub outcome: StepOutcome,
}

/// What a run did, step by step. Written as JSON when `--report` is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub target: String,
    pub dry_run: bool,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn new(target: Target, dry_run: bool) -> Self {
        Self {
            target: target.name(),
            dry_run,
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, target: Target, step: String, outcome: StepOutcome) {
        self.steps.push(StepRecord {
            target: target.name(),
            step,
            outcome,
        });
    }

    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.steps
            .iter()
            .find(|record| matches!(record.outcome, StepOutcome::Failed(_)))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create report directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;

        fs::write(path, json)
            .with_context(|| format!("Failed to write run report to {}", path.display()))?;

        tracing::info!("Wrote run report: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_step_is_located() {
        let mut report = RunReport::new(Target::Html, false);
        report.record(Target::Api, "python x.py".to_string(), StepOutcome::Succeeded);
        report.record(
            Target::HtmlOnly,
            "sphinx-build -b html".to_string(),
            StepOutcome::Failed("sphinx-build exited with status 2".to_string()),
        );

        let failed = report.failed_step().unwrap();
        assert_eq!(failed.target, "htmlonly");
        assert_eq!(failed.step, "sphinx-build -b html");
    }

    #[test]
    fn test_report_json_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("reports").join("run.json");

        let mut report = RunReport::new(Target::Clean, true);
        report.record(Target::Clean, "rm -rf build".to_string(), StepOutcome::Skipped);
        report.write(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["target"], "clean");
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["steps"][0]["outcome"]["status"], "skipped");

        assert_eq!(value["steps"].as_array().unwrap().len(), 1);
    }
}
