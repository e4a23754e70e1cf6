//! Verdict Core - test discovery, execution and reporting
//!
//! This library provides the complete Verdict test framework including:
//! - Declarative suite metadata (suites, tests, parameter sets, lifecycle hooks)
//! - Discovery of suite descriptors from a registered module
//! - Sequential lifecycle execution of sync and async test bodies
//! - The assertion library and its distinguished failure signal
//! - A run-scoped shared context for passing data between tests
//! - Grouped, timed reporting to the console and to a text artifact
//!
//! # Example
//!
//! ```
//! use verdict_core::{assert, MethodDecl, SuiteMarker, TestModule, TestRunner, TypeDecl};
//!
//! #[derive(Default)]
//! struct Counter {
//!     value: i32,
//! }
//!
//! let module = TestModule::new("demo").declare(
//!     TypeDecl::<Counter>::new("Counter")
//!         .suite(SuiteMarker::new().category("Math"))
//!         .method(MethodDecl::sync("init", |c: &mut Counter| {
//!             c.value = 1;
//!             Ok(())
//!         }).before_all())
//!         .method(MethodDecl::sync("starts_at_one", |c: &mut Counter| {
//!             assert::are_equal(&1, &c.value, "counter")?;
//!             Ok(())
//!         }).test()),
//! );
//!
//! let results = TestRunner::new().run_module(&module);
//! assert_eq!(results.len(), 1);
//! assert!(results[0].is_passed());
//! ```

/// Verdict version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod assert;
pub mod context;
pub mod discovery;
pub mod metadata;
pub mod reporter;
pub mod result;
pub mod runner;
pub mod value;

pub use assert::AssertionFailure;
pub use context::{ContextError, ContextHandle, SharedContext, SharedContextManager};
pub use discovery::{discover, LifecycleTable, SuiteDescriptor, TestDescriptor};
pub use metadata::{
    LifecycleRole, MethodDecl, ParameterSet, SuiteMarker, TestMarker, TestModule, TypeDecl,
    TypeDeclaration,
};
pub use reporter::{CategoryGroup, Report, ReportError, Summary, TestReporter};
pub use result::TestResult;
pub use runner::TestRunner;
pub use value::{arg, ArgumentError, FromValue, Value};
