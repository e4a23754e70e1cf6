//! Test result records

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Outcome of one executed test or expanded parameter case.
///
/// Built once by the runner; there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    name: String,
    suite: String,
    passed: bool,
    error_message: String,
    start_time: DateTime<Local>,
    end_time: DateTime<Local>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    duration: Duration,
    category: String,
    priority: i32,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
}

impl TestResult {
    /// A passing result spanning `start..end`.
    pub fn passed(name: impl Into<String>, start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self::finalize(name.into(), true, String::new(), start, end)
    }

    /// A failing result spanning `start..end`.
    pub fn failed(
        name: impl Into<String>,
        error_message: impl Into<String>,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Self {
        Self::finalize(name.into(), false, error_message.into(), start, end)
    }

    fn finalize(
        name: String,
        passed: bool,
        error_message: String,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Self {
        // Wall clocks can step backwards; a result never has negative length
        let end = end.max(start);
        let duration = (end - start).to_std().unwrap_or_default();
        Self {
            name,
            suite: String::new(),
            passed,
            error_message,
            start_time: start,
            end_time: end,
            duration,
            category: String::new(),
            priority: 0,
        }
    }

    pub fn in_suite(mut self, suite: impl Into<String>) -> Self {
        self.suite = suite.into();
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Display name: `Suite.Method` or `Suite.Method[case]`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    pub fn is_failed(&self) -> bool {
        !self.passed
    }

    /// Empty when the test passed
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Local> {
        self.end_time
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Category as declared on the suite; may be blank
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}
