//! Test runner - execute discovered suites
//!
//! Suites run one after another, and inside a suite every expanded test
//! execution runs to completion before the next begins. Asynchronous bodies
//! are awaited inline on a current-thread tokio runtime; nothing is spawned.
//!
//! Per suite:
//! 1. one instance from the type's `Default`, plus shared-context injection
//! 2. `SuiteSetup` hooks (a failure fails every execution of the suite)
//! 3. for each execution: `PerTestSetup`, body, `PerTestTeardown` (always)
//! 4. `SuiteTeardown` hooks, once
//!
//! Setup hooks stop at the first fault. Teardown hooks all run, and every
//! fault is reported.

use crate::assert::{panic_message, AssertionFailure};
use crate::context::{ContextHandle, SharedContextManager};
use crate::discovery::{discover, HookHandle, SuiteDescriptor, TestDescriptor};
use crate::metadata::{ErasedBody, LifecycleRole, TestModule};
use crate::result::TestResult;
use crate::value::Value;
use chrono::Local;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

/// Why an invocation did not succeed
#[derive(Debug, Clone, PartialEq)]
enum Fault {
    /// An `AssertionFailure` somewhere in the error chain
    Assertion(String),
    /// Any other error
    Error(String),
    Panic(String),
}

impl Fault {
    fn classify(err: anyhow::Error) -> Self {
        match err
            .chain()
            .find_map(|cause| cause.downcast_ref::<AssertionFailure>())
        {
            Some(failure) => Fault::Assertion(failure.message().to_string()),
            None => Fault::Error(format!("{:#}", err)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Fault::Assertion(msg) => msg.clone(),
            Fault::Error(msg) => format!("Test failed with exception: {}", msg),
            Fault::Panic(msg) => format!("Test panicked: {}", msg),
        }
    }
}

/// Invoke a body with `args`, catching errors and panics.
async fn invoke(
    body: &ErasedBody,
    arity: usize,
    instance: &mut (dyn Any + 'static),
    args: &[Value],
) -> Result<(), Fault> {
    if args.len() != arity {
        return Err(Fault::Error(format!(
            "parameter count mismatch: expected {} argument{}, got {}",
            arity,
            if arity == 1 { "" } else { "s" },
            args.len()
        )));
    }

    let outcome = AssertUnwindSafe(async { body(instance, args).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(Fault::classify(err)),
        Err(payload) => Err(Fault::Panic(panic_message(payload.as_ref()))),
    }
}

/// Run every hook for `role` in order, stopping at the first fault.
async fn run_hooks(
    suite: &SuiteDescriptor,
    role: LifecycleRole,
    instance: &mut (dyn Any + 'static),
) -> Result<(), (String, Fault)> {
    for hook in suite.lifecycle.hooks(role) {
        log::debug!("{}: {} hook '{}'", suite.name, role.label(), hook.name());
        run_hook(hook, instance)
            .await
            .map_err(|fault| (hook.name().to_string(), fault))?;
    }
    Ok(())
}

/// Run every hook for `role` in order, collecting each fault.
async fn run_all_hooks(
    suite: &SuiteDescriptor,
    role: LifecycleRole,
    instance: &mut (dyn Any + 'static),
) -> Vec<(String, Fault)> {
    let mut faults = Vec::new();
    for hook in suite.lifecycle.hooks(role) {
        log::debug!("{}: {} hook '{}'", suite.name, role.label(), hook.name());
        if let Err(fault) = run_hook(hook, instance).await {
            faults.push((hook.name().to_string(), fault));
        }
    }
    faults
}

async fn run_hook(hook: &HookHandle, instance: &mut (dyn Any + 'static)) -> Result<(), Fault> {
    invoke(&hook.body, hook.arity, instance, &[]).await
}

/// Test runner with configuration
pub struct TestRunner {
    contexts: Rc<SharedContextManager>,
    /// Only run tests whose `Suite.Method` name contains this
    filter: Option<String>,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner {
    /// Create a new test runner with default settings
    pub fn new() -> Self {
        Self {
            contexts: Rc::new(SharedContextManager::new()),
            filter: None,
        }
    }

    /// Filter tests by name pattern
    pub fn with_filter(mut self, pattern: Option<String>) -> Self {
        self.filter = pattern.filter(|p| !p.is_empty());
        self
    }

    /// The context manager shared by every suite this runner executes
    pub fn contexts(&self) -> &Rc<SharedContextManager> {
        &self.contexts
    }

    /// Discover and run every suite in `module`.
    ///
    /// Blocks on a fresh current-thread tokio runtime, so it must not be
    /// called from inside another runtime; use
    /// [`run_module_async`](Self::run_module_async) there.
    pub fn run_module(&self, module: &TestModule) -> Vec<TestResult> {
        let suites = discover(module);
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.run_suites(&suites)),
            Err(e) => {
                log::error!("failed to start async runtime: {}", e);
                let message = format!("Failed to start async runtime: {}", e);
                suites
                    .iter()
                    .flat_map(|suite| self.fail_all(suite, &message))
                    .collect()
            }
        }
    }

    pub async fn run_module_async(&self, module: &TestModule) -> Vec<TestResult> {
        self.run_suites(&discover(module)).await
    }

    /// Run already-discovered suites in order.
    pub async fn run_suites(&self, suites: &[SuiteDescriptor]) -> Vec<TestResult> {
        let mut results = Vec::new();
        for suite in suites {
            results.extend(self.run_suite(suite).await);
        }
        results
    }

    fn selected<'s>(&self, suite: &'s SuiteDescriptor) -> Vec<&'s TestDescriptor> {
        suite
            .tests
            .iter()
            .filter(|t| match &self.filter {
                Some(pattern) => t.full_name.contains(pattern.as_str()),
                None => true,
            })
            .collect()
    }

    /// Run one suite through its whole lifecycle.
    pub async fn run_suite(&self, suite: &SuiteDescriptor) -> Vec<TestResult> {
        let tests = self.selected(suite);
        if tests.is_empty() && !suite.tests.is_empty() {
            log::debug!("{}: no tests match the filter", suite.name);
            return Vec::new();
        }

        log::info!("running suite {} ({} tests)", suite.name, tests.len());
        let mut instance = (suite.factory)();
        let mut results = Vec::new();

        let setup = match self.inject_context(suite, instance.as_mut()) {
            Ok(()) => run_hooks(suite, LifecycleRole::SuiteSetup, instance.as_mut()).await,
            Err(fault) => Err(("shared context".to_string(), fault)),
        };

        match setup {
            Ok(()) => {
                for test in tests {
                    for execution in test.executions() {
                        let result = self
                            .execute(
                                suite,
                                test,
                                &execution.name,
                                execution.args,
                                instance.as_mut(),
                            )
                            .await;
                        results.push(result);
                    }
                }
            }
            Err((hook, fault)) => {
                log::warn!(
                    "{}: suite setup '{}' failed: {}",
                    suite.name,
                    hook,
                    fault.describe()
                );
                let message = format!("Suite setup failed: {}", fault.describe());
                for test in tests {
                    results.extend(self.fail_test(suite, test, &message));
                }
            }
        }

        for (hook, fault) in
            run_all_hooks(suite, LifecycleRole::SuiteTeardown, instance.as_mut()).await
        {
            log::warn!(
                "{}: suite teardown '{}' failed: {}",
                suite.name,
                hook,
                fault.describe()
            );
        }

        let failed = results.iter().filter(|r| r.is_failed()).count();
        log::info!(
            "finished suite {}: {} passed, {} failed",
            suite.name,
            results.len() - failed,
            failed
        );
        results
    }

    fn inject_context(
        &self,
        suite: &SuiteDescriptor,
        instance: &mut (dyn Any + 'static),
    ) -> Result<(), Fault> {
        match &suite.shared_context {
            Some(dependency) => {
                log::debug!(
                    "{}: injecting shared context '{}'",
                    suite.name,
                    dependency.context_name()
                );
                (dependency.inject)(instance, ContextHandle::new(&self.contexts))
                    .map_err(Fault::classify)
            }
            None => Ok(()),
        }
    }

    /// One expanded execution: setup hooks, body, teardown hooks.
    async fn execute(
        &self,
        suite: &SuiteDescriptor,
        test: &TestDescriptor,
        name: &str,
        args: &[Value],
        instance: &mut (dyn Any + 'static),
    ) -> TestResult {
        let start = Local::now();
        log::debug!("running {}", name);

        let mut outcome = match run_hooks(suite, LifecycleRole::PerTestSetup, instance).await {
            Ok(()) => invoke(&test.body, test.arity, instance, args)
                .await
                .map_err(|fault| fault.describe()),
            Err((hook, fault)) => Err(format!("Setup failed ({}): {}", hook, fault.describe())),
        };

        let teardown_faults = run_all_hooks(suite, LifecycleRole::PerTestTeardown, instance).await;
        for (hook, fault) in teardown_faults {
            let teardown = format!("Teardown failed ({}): {}", hook, fault.describe());
            outcome = match outcome {
                Ok(()) => Err(teardown),
                Err(first) => Err(format!("{}\n{}", first, teardown)),
            };
        }

        let end = Local::now();
        let result = match outcome {
            Ok(()) => TestResult::passed(name, start, end),
            Err(message) => {
                log::debug!("{} failed: {}", name, message);
                TestResult::failed(name, message, start, end)
            }
        };
        self.annotate(suite, test, result)
    }

    fn annotate(
        &self,
        suite: &SuiteDescriptor,
        test: &TestDescriptor,
        result: TestResult,
    ) -> TestResult {
        result
            .in_suite(suite.name.clone())
            .in_category(suite.category.clone().unwrap_or_default())
            .with_priority(test.priority)
    }

    /// One failed result per execution of `test`, all with `message`.
    fn fail_test(
        &self,
        suite: &SuiteDescriptor,
        test: &TestDescriptor,
        message: &str,
    ) -> Vec<TestResult> {
        test.executions()
            .into_iter()
            .map(|execution| {
                let now = Local::now();
                self.annotate(
                    suite,
                    test,
                    TestResult::failed(execution.name, message, now, now),
                )
            })
            .collect()
    }

    fn fail_all(&self, suite: &SuiteDescriptor, message: &str) -> Vec<TestResult> {
        self.selected(suite)
            .into_iter()
            .flat_map(|test| self.fail_test(suite, test, message))
            .collect()
    }
}
