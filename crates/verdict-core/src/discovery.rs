//! Test discovery - turn declared types into suite descriptors

use crate::metadata::{
    ContextDependency, ErasedBody, Factory, LifecycleRole, MethodMarker, ParameterSet,
    TestModule, TypeDeclaration,
};
use crate::value::Value;
use std::collections::HashMap;

/// A lifecycle hook resolved at discovery time
#[derive(Clone)]
pub struct HookHandle {
    pub(crate) name: String,
    pub(crate) arity: usize,
    pub(crate) body: ErasedBody,
}

impl HookHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered hook handles per lifecycle role
#[derive(Clone, Default)]
pub struct LifecycleTable {
    hooks: HashMap<LifecycleRole, Vec<HookHandle>>,
}

impl LifecycleTable {
    fn push(&mut self, role: LifecycleRole, hook: HookHandle) {
        self.hooks.entry(role).or_default().push(hook);
    }

    /// Hooks attached to `role`, in declaration order.
    pub fn hooks(&self, role: LifecycleRole) -> &[HookHandle] {
        self.hooks.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(Vec::is_empty)
    }
}

/// One test unit within a suite
#[derive(Clone)]
pub struct TestDescriptor {
    /// Method name
    pub name: String,
    /// `Suite.Method`
    pub full_name: String,
    pub priority: i32,
    pub description: Option<String>,
    pub critical: bool,
    pub cases: Vec<ParameterSet>,
    pub arity: usize,
    pub is_async: bool,
    pub(crate) body: ErasedBody,
}

/// One concrete run of a test: the plain test, or one parameter set
#[derive(Debug, Clone, PartialEq)]
pub struct Execution<'a> {
    pub name: String,
    pub args: &'a [Value],
}

impl TestDescriptor {
    /// Expand into executions, in parameter-set order.
    pub fn executions(&self) -> Vec<Execution<'_>> {
        if self.cases.is_empty() {
            return vec![Execution {
                name: self.full_name.clone(),
                args: &[],
            }];
        }
        self.cases
            .iter()
            .map(|case| Execution {
                name: format!("{}[{}]", self.full_name, case.display_name()),
                args: case.values(),
            })
            .collect()
    }
}

/// A method that carried a test marker and a skip marker
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTest {
    pub name: String,
    pub reason: Option<String>,
}

/// A discovered suite
#[derive(Clone)]
pub struct SuiteDescriptor {
    pub name: String,
    pub category: Option<String>,
    pub priority: i32,
    pub tests: Vec<TestDescriptor>,
    pub skipped: Vec<SkippedTest>,
    pub lifecycle: LifecycleTable,
    pub(crate) shared_context: Option<ContextDependency>,
    pub(crate) factory: Factory,
}

impl SuiteDescriptor {
    /// Name of the declared shared-context dependency, if any
    pub fn shared_context(&self) -> Option<&str> {
        self.shared_context
            .as_ref()
            .map(ContextDependency::context_name)
    }

    /// Total executions once parameter sets are expanded
    pub fn execution_count(&self) -> usize {
        self.tests.iter().map(|t| t.cases.len().max(1)).sum()
    }
}

/// Discover every suite declared in `module`, in declaration order.
///
/// Types without a suite marker are ignored.
pub fn discover(module: &TestModule) -> Vec<SuiteDescriptor> {
    module
        .types()
        .iter()
        .filter_map(describe_suite)
        .collect()
}

fn describe_suite(decl: &TypeDeclaration) -> Option<SuiteDescriptor> {
    let marker = decl.marker.as_ref()?;

    let mut tests = Vec::new();
    let mut skipped = Vec::new();
    let mut lifecycle = LifecycleTable::default();

    for method in &decl.methods {
        let mut test_marker = None;
        let mut skip = None;
        let mut cases = Vec::new();
        let mut roles: Vec<LifecycleRole> = Vec::new();

        for m in &method.markers {
            match m {
                MethodMarker::Test(t) => test_marker = Some(t),
                MethodMarker::Skip { reason } => skip = Some(reason.clone()),
                MethodMarker::Case(case) => cases.push(case.clone()),
                MethodMarker::Role(role) => {
                    if !roles.contains(role) {
                        roles.push(*role);
                    }
                }
            }
        }

        for role in roles {
            lifecycle.push(
                role,
                HookHandle {
                    name: method.name.clone(),
                    arity: method.arity,
                    body: method.body.clone(),
                },
            );
        }

        let Some(test_marker) = test_marker else {
            continue;
        };

        if let Some(reason) = skip {
            skipped.push(SkippedTest {
                name: method.name.clone(),
                reason,
            });
            continue;
        }

        tests.push(TestDescriptor {
            name: method.name.clone(),
            full_name: format!("{}.{}", decl.name, method.name),
            priority: test_marker.priority.unwrap_or(marker.priority),
            description: test_marker.description.clone(),
            critical: test_marker.critical,
            cases,
            arity: method.arity,
            is_async: method.is_async,
            body: method.body.clone(),
        });
    }

    Some(SuiteDescriptor {
        name: decl.name.clone(),
        category: marker.category.clone(),
        priority: marker.priority,
        tests,
        skipped,
        lifecycle,
        shared_context: decl.context.clone(),
        factory: decl.factory.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MethodDecl, SuiteMarker, TestMarker, TypeDecl};
    use crate::params;

    #[derive(Default)]
    struct Knights;

    fn noop(_: &mut Knights) -> anyhow::Result<()> {
        Ok(())
    }

    fn knights_module() -> TestModule {
        TestModule::new("chess")
            .declare(
                TypeDecl::<Knights>::new("KnightMoves")
                    .suite(SuiteMarker::new().category("Knight").priority(1))
                    .method(MethodDecl::sync("reset", noop).before_each().before_each())
                    .method(MethodDecl::sync("corner", noop).test())
                    .method(
                        MethodDecl::sync("center", noop).test_with(
                            TestMarker::new().priority(5).description("d4 knight").critical(),
                        ),
                    )
                    .method(MethodDecl::sync("flaky", noop).test().skip("unstable"))
                    .method(MethodDecl::sync("helper", noop))
                    .method(
                        MethodDecl::parameterized("jumps", 2, |_: &mut Knights, _| Ok(()))
                            .test()
                            .case(params!["b1", 2])
                            .case(params!["g1", 3].named("kingside")),
                    )
                    .method(MethodDecl::sync("done", noop).after_all()),
            )
            .declare(
                TypeDecl::<Knights>::new("NotASuite").method(MethodDecl::sync("t", noop).test()),
            )
    }

    #[test]
    fn test_discover_only_marked_types() {
        let suites = discover(&knights_module());
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].name, "KnightMoves");
        assert_eq!(suites[0].category.as_deref(), Some("Knight"));
    }

    #[test]
    fn test_discover_tests_in_declaration_order() {
        let suite = &discover(&knights_module())[0];
        let names: Vec<_> = suite.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["corner", "center", "jumps"]);
        assert_eq!(suite.skipped.len(), 1);
        assert_eq!(suite.skipped[0].reason.as_deref(), Some("unstable"));
    }

    #[test]
    fn test_priority_defaults_to_suite() {
        let suite = &discover(&knights_module())[0];
        assert_eq!(suite.tests[0].priority, 1);
        assert_eq!(suite.tests[1].priority, 5);
        assert_eq!(suite.tests[1].description.as_deref(), Some("d4 knight"));
        assert!(suite.tests[1].critical);
        assert!(!suite.tests[0].critical);
    }

    #[test]
    fn test_lifecycle_roles_are_idempotent() {
        let suite = &discover(&knights_module())[0];
        assert_eq!(suite.lifecycle.hooks(LifecycleRole::PerTestSetup).len(), 1);
        assert_eq!(suite.lifecycle.hooks(LifecycleRole::SuiteTeardown)[0].name(), "done");
        assert!(suite.lifecycle.hooks(LifecycleRole::SuiteSetup).is_empty());
    }

    #[test]
    fn test_executions_expand_cases() {
        let suite = &discover(&knights_module())[0];
        let names: Vec<_> = suite.tests[2]
            .executions()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(
            names,
            vec!["KnightMoves.jumps[b1,2]", "KnightMoves.jumps[kingside]"]
        );
        assert_eq!(suite.tests[0].executions()[0].name, "KnightMoves.corner");
        assert_eq!(suite.execution_count(), 4);
    }

    #[test]
    fn test_suite_without_tests() {
        let module = TestModule::new("empty")
            .declare(TypeDecl::<Knights>::new("Empty").suite(SuiteMarker::new()));
        let suites = discover(&module);
        assert_eq!(suites.len(), 1);
        assert!(suites[0].tests.is_empty());
        assert_eq!(suites[0].execution_count(), 0);
    }
}
