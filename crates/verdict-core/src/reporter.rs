//! Test reporter - group, render and persist results

use crate::result::TestResult;
use chrono::{DateTime, Local};
use colored::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Category used for results with a blank category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Reporter errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counts and total time for a set of results
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl Summary {
    fn of<'a>(results: impl IntoIterator<Item = &'a TestResult>) -> Self {
        results.into_iter().fold(Summary::default(), |mut s, r| {
            s.total += 1;
            if r.is_passed() {
                s.passed += 1;
            } else {
                s.failed += 1;
            }
            s.duration += r.duration();
            s
        })
    }
}

/// Results sharing one category, in display order
#[derive(Debug, Clone)]
pub struct CategoryGroup {
    pub name: String,
    pub summary: Summary,
    pub results: Vec<TestResult>,
}

/// A whole run, summarized and grouped
#[derive(Debug, Clone)]
pub struct Report {
    pub summary: Summary,
    pub groups: Vec<CategoryGroup>,
}

fn normalize_category(category: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Case-insensitive first, ordinal as a tiebreak.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Failed before passed, then higher priority first, then by name.
fn compare_results(a: &TestResult, b: &TestResult) -> Ordering {
    a.is_passed()
        .cmp(&b.is_passed())
        .then_with(|| b.priority().cmp(&a.priority()))
        .then_with(|| compare_names(a.name(), b.name()))
}

impl Report {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut by_category: HashMap<String, Vec<TestResult>> = HashMap::new();
        for result in results {
            by_category
                .entry(normalize_category(result.category()))
                .or_default()
                .push(result.clone());
        }

        let mut groups: Vec<CategoryGroup> = by_category
            .into_iter()
            .map(|(name, mut results)| {
                results.sort_by(compare_results);
                CategoryGroup {
                    summary: Summary::of(&results),
                    name,
                    results,
                }
            })
            .collect();
        groups.sort_by(|a, b| compare_names(&a.name, &b.name));

        Report {
            summary: Summary::of(results),
            groups,
        }
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total == 0
    }
}

/// `12ms`, `1.23s`, `02:15.123`, `01:02:15.123`
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_secs_f64() * 1000.0;
    if millis < 1000.0 {
        return format!("{:.0}ms", millis);
    }
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        return format!("{:.2}s", secs);
    }
    let total = d.as_secs();
    let ms = d.subsec_millis();
    if total < 3600 {
        return format!("{:02}:{:02}.{:03}", total / 60, total % 60, ms);
    }
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total / 3600,
        (total % 3600) / 60,
        total % 60,
        ms
    )
}

/// `<prefix>_<yyyyMMdd_HHmmss>.txt`
pub fn artifact_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.txt", prefix, at.format("%Y%m%d_%H%M%S"))
}

#[derive(Clone, Copy)]
enum Tone {
    Frame,
    Label,
    Title,
    Pass,
    Fail,
    Time,
    Detail,
}

/// Test reporter with output configuration
pub struct TestReporter {
    /// Apply terminal colors when rendering
    color: bool,
}

impl Default for TestReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TestReporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.color {
            return text.to_string();
        }
        match tone {
            Tone::Frame => text.bright_black().to_string(),
            Tone::Label => text.normal().to_string(),
            Tone::Title => text.white().bold().to_string(),
            Tone::Pass => text.green().bold().to_string(),
            Tone::Fail => text.red().bold().to_string(),
            Tone::Time => text.cyan().to_string(),
            Tone::Detail => text.red().dimmed().to_string(),
        }
    }

    fn key_value(&self, key: &str, value: &str, tone: Tone) -> String {
        format!("{}{}", self.paint(&format!("{}: ", key), Tone::Label), self.paint(value, tone))
    }

    fn header(&self, title: &str, lines: &mut Vec<String>) {
        let rule = "=".repeat((title.len() + 8).max(10));
        lines.push(self.paint(&rule, Tone::Frame));
        lines.push(format!(
            "{}{}{}",
            self.paint("=== ", Tone::Frame),
            self.paint(title, Tone::Title),
            self.paint(" ===", Tone::Frame)
        ));
        lines.push(self.paint(&rule, Tone::Frame));
    }

    fn group(&self, group: &CategoryGroup, lines: &mut Vec<String>) {
        lines.push(format!(
            "{}{}",
            self.paint("Category: ", Tone::Label),
            self.paint(&group.name, Tone::Title)
        ));
        let s = &group.summary;
        lines.push(format!(
            "  {}  {}  {}  {}",
            self.key_value("Total", &s.total.to_string(), Tone::Label),
            self.key_value("Passed", &s.passed.to_string(), Tone::Pass),
            self.key_value("Failed", &s.failed.to_string(), Tone::Fail),
            self.key_value("Duration", &format_duration(s.duration), Tone::Time),
        ));

        for r in &group.results {
            let status = if r.is_passed() {
                self.paint("[PASS]", Tone::Pass)
            } else {
                self.paint("[FAIL]", Tone::Fail)
            };
            lines.push(format!(
                "  {} {}  (P{})  {}  {}–{}",
                status,
                r.name(),
                r.priority(),
                format_duration(r.duration()),
                r.start_time().format("%H:%M:%S"),
                r.end_time().format("%H:%M:%S"),
            ));

            if r.is_failed() && !r.error_message().trim().is_empty() {
                for line in r.error_message().trim().lines() {
                    lines.push(format!("      {}", self.paint(line, Tone::Detail)));
                }
            }
        }
        lines.push(String::new());
    }

    /// Render the report as text, colored if enabled.
    pub fn render(&self, report: &Report) -> String {
        if report.is_empty() {
            return format!("{}\n", self.paint("No test results.", Tone::Detail));
        }

        let mut lines = Vec::new();
        self.header("TEST RUN SUMMARY", &mut lines);
        let s = &report.summary;
        lines.push(self.key_value("Total", &s.total.to_string(), Tone::Label));
        lines.push(self.key_value("Passed", &s.passed.to_string(), Tone::Pass));
        lines.push(self.key_value("Failed", &s.failed.to_string(), Tone::Fail));
        lines.push(self.key_value("Duration", &format_duration(s.duration), Tone::Time));
        lines.push(String::new());

        for group in &report.groups {
            self.group(group, &mut lines);
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Print the rendered report to stdout
    pub fn print(&self, report: &Report) {
        print!("{}", self.render(report));
    }

    /// Write the uncolored report to `dir/<prefix>_<timestamp>.txt`.
    pub fn persist(report: &Report, dir: &Path, prefix: &str) -> Result<PathBuf, ReportError> {
        Self::persist_at(report, dir, prefix, Local::now())
    }

    /// [`persist`](Self::persist) with an explicit timestamp.
    pub fn persist_at(
        report: &Report,
        dir: &Path,
        prefix: &str,
        at: DateTime<Local>,
    ) -> Result<PathBuf, ReportError> {
        let path = dir.join(artifact_name(prefix, at));
        let io_err = |source| ReportError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(dir).map_err(io_err)?;
        let content = TestReporter::new(false).render(report);
        fs::write(&path, content).map_err(io_err)?;
        log::info!("report written to {}", path.display());
        Ok(path)
    }
}
