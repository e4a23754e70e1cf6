//! Run command - execute test modules and report

use crate::registry;
use anyhow::Result;
use colored::*;
use std::io::Write;
use std::path::PathBuf;
use verdict_config::ResolvedSettings;
use verdict_core::{Report, TestModule, TestReporter, TestResult, TestRunner};

/// Arguments for the run command
pub struct RunArgs {
    /// Module names; empty runs every registered module
    pub modules: Vec<String>,
    /// Output in JSON format
    pub json: bool,
}

/// What one run produced
pub struct RunOutcome {
    pub results: Vec<TestResult>,
    pub artifact: Option<PathBuf>,
}

impl RunOutcome {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(TestResult::is_passed)
    }
}

/// Run the command; `Ok(false)` when any test failed.
pub fn run(args: RunArgs, settings: &ResolvedSettings) -> Result<bool> {
    let modules: Vec<TestModule> = if args.modules.is_empty() {
        registry::entries().iter().map(|m| m.build()).collect()
    } else {
        args.modules
            .iter()
            .map(|name| registry::lookup(name))
            .collect::<Result<Vec<_>, _>>()?
    };

    let runner = TestRunner::new().with_filter(settings.filter.clone());
    let stdout = std::io::stdout();
    let outcome = execute(&runner, &modules, settings, args.json, &mut stdout.lock())?;
    Ok(outcome.all_passed())
}

/// Run `modules` with `runner`, then print and persist one combined report.
pub fn execute(
    runner: &TestRunner,
    modules: &[TestModule],
    settings: &ResolvedSettings,
    json: bool,
    out: &mut dyn Write,
) -> Result<RunOutcome> {
    let mut results = Vec::new();
    for module in modules {
        log::info!("running module {}", module.name());
        results.extend(runner.run_module(module));
    }

    let report = Report::from_results(&results);
    let reporter = TestReporter::new(settings.color && !json);

    let artifact = if settings.save {
        Some(TestReporter::persist(
            &report,
            &settings.report_dir,
            &settings.report_prefix,
        )?)
    } else {
        None
    };

    if json {
        let names: Vec<_> = modules.iter().map(TestModule::name).collect();
        writeln!(
            out,
            "{}",
            serde_json::json!({
                "modules": names,
                "tests": report.summary.total,
                "passed": report.summary.passed,
                "failed": report.summary.failed,
                "duration_ms": report.summary.duration.as_millis() as u64,
                "results": results,
                "artifact": artifact.as_ref().map(|p| p.display().to_string()),
            })
        )?;
    } else {
        write!(out, "{}", reporter.render(&report))?;
        if let Some(path) = &artifact {
            let line = format!("Results saved to {}", path.display());
            if settings.color {
                writeln!(out, "{}", line.dimmed())?;
            } else {
                writeln!(out, "{}", line)?;
            }
        }
    }

    Ok(RunOutcome { results, artifact })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn plain(dir: &std::path::Path) -> ResolvedSettings {
        ResolvedSettings {
            report_dir: dir.to_path_buf(),
            color: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_execute_prints_and_persists() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let outcome = execute(
            &TestRunner::new(),
            &[registry::lookup("samples").unwrap()],
            &plain(dir.path()),
            false,
            &mut out,
        )
        .unwrap();

        assert!(outcome.all_passed());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("=== TEST RUN SUMMARY ==="));
        assert!(text.contains("Category: Knight"));

        let artifact = outcome.artifact.expect("artifact written");
        assert!(artifact.starts_with(dir.path()));
        let saved = std::fs::read_to_string(&artifact).unwrap();
        assert!(text.starts_with(&saved));
    }

    #[test]
    fn test_execute_json() {
        let dir = tempdir().unwrap();
        let settings = ResolvedSettings {
            save: false,
            ..plain(dir.path())
        };
        let mut out = Vec::new();
        let outcome = execute(
            &TestRunner::new(),
            &[registry::lookup("failures").unwrap()],
            &settings,
            true,
            &mut out,
        )
        .unwrap();

        assert!(!outcome.all_passed());
        assert!(outcome.artifact.is_none());
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["modules"][0], "failures");
        assert_eq!(value["passed"], 1);
        assert_eq!(value["failed"], 5);
        assert_eq!(value["results"][0]["name"], "FailureKinds.assertion");
        assert!(value["artifact"].is_null());
    }

    #[test]
    fn test_filter_narrows_run() {
        let dir = tempdir().unwrap();
        let settings = ResolvedSettings {
            save: false,
            ..plain(dir.path())
        };
        let runner = TestRunner::new().with_filter(Some("PositionEvaluation".to_string()));
        let outcome = execute(
            &runner,
            &[registry::lookup("samples").unwrap()],
            &settings,
            false,
            &mut Vec::new(),
        )
        .unwrap();
        assert_eq!(outcome.results.len(), 6);
        assert!(outcome
            .results
            .iter()
            .all(|r| r.name().starts_with("PositionEvaluation.")));
    }
}
