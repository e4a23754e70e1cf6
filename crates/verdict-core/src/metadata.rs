//! Declarative suite metadata
//!
//! Rust has no runtime attributes, so suites are declared through static
//! registration: a [`TypeDecl`] stands for one declared type, carrying an
//! optional suite marker, an optional shared-context dependency and an
//! ordered list of [`MethodDecl`]s. Each method carries zero or more
//! markers (test, skip, parameter set, lifecycle role).
//!
//! Declarations are only data. [`crate::discovery::discover`] turns a
//! [`TestModule`] into the descriptors the runner executes.
//!
//! ```
//! use futures_util::FutureExt;
//! use verdict_core::{assert, arg, params, MethodDecl, SuiteMarker, TypeDecl};
//!
//! #[derive(Default)]
//! struct Squares {
//!     board: Vec<u8>,
//! }
//!
//! let decl = TypeDecl::<Squares>::new("Squares")
//!     .suite(SuiteMarker::new().category("Board").priority(2))
//!     .method(
//!         MethodDecl::sync("fill", |s: &mut Squares| {
//!             s.board = (0..64).collect();
//!             Ok(())
//!         })
//!         .before_each(),
//!     )
//!     .method(
//!         MethodDecl::parameterized("in_bounds", 1, |s: &mut Squares, args| {
//!             let square: usize = arg(args, 0)?;
//!             assert::is_true(square < s.board.len(), "square on board")?;
//!             Ok(())
//!         })
//!         .test()
//!         .case(params![0])
//!         .case(params![63].named("last")),
//!     )
//!     .method(
//!         MethodDecl::asynchronous("loads", |s: &mut Squares| {
//!             async move {
//!                 assert::are_equal(64, s.board.len(), "")?;
//!                 Ok(())
//!             }
//!             .boxed_local()
//!         })
//!         .test(),
//!     );
//! # let _ = decl;
//! ```

use crate::context::ContextHandle;
use crate::value::Value;
use futures_util::future::{self, LocalBoxFuture};
use futures_util::FutureExt;
use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Future returned by an invoked method body
pub type BodyFuture<'a> = LocalBoxFuture<'a, anyhow::Result<()>>;

/// Type-erased method body: suite instance plus arguments in, future out.
pub(crate) type ErasedBody =
    Rc<dyn for<'a> Fn(&'a mut (dyn Any + 'static), &'a [Value]) -> BodyFuture<'a>>;

pub(crate) type Factory = Rc<dyn Fn() -> Box<dyn Any>>;

pub(crate) type Injector =
    Rc<dyn Fn(&mut (dyn Any + 'static), ContextHandle) -> anyhow::Result<()>>;

fn erase<F>(body: F) -> ErasedBody
where
    F: for<'a> Fn(&'a mut (dyn Any + 'static), &'a [Value]) -> BodyFuture<'a> + 'static,
{
    Rc::new(body)
}

fn downcast<'a, S: 'static>(instance: &'a mut (dyn Any + 'static)) -> anyhow::Result<&'a mut S> {
    instance
        .downcast_mut::<S>()
        .ok_or_else(|| anyhow::anyhow!("suite instance is not a {}", type_name::<S>()))
}

// ============================================================================
// Markers
// ============================================================================

/// The four points in a suite's lifecycle a method can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleRole {
    /// Once, before any test in the suite
    SuiteSetup,
    /// Once, after every test in the suite
    SuiteTeardown,
    /// Before each expanded test execution
    PerTestSetup,
    /// After each expanded test execution, even when it failed
    PerTestTeardown,
}

impl LifecycleRole {
    pub const ALL: [LifecycleRole; 4] = [
        LifecycleRole::SuiteSetup,
        LifecycleRole::SuiteTeardown,
        LifecycleRole::PerTestSetup,
        LifecycleRole::PerTestTeardown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LifecycleRole::SuiteSetup => "before_all",
            LifecycleRole::SuiteTeardown => "after_all",
            LifecycleRole::PerTestSetup => "before_each",
            LifecycleRole::PerTestTeardown => "after_each",
        }
    }
}

/// Marks a declared type as a suite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteMarker {
    pub category: Option<String>,
    /// Default priority for tests that do not set their own
    pub priority: i32,
}

impl SuiteMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Marks a method as a test
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestMarker {
    pub priority: Option<i32>,
    pub description: Option<String>,
    /// Marks a test whose failure should block a release
    pub critical: bool,
}

impl TestMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

/// One set of literal arguments for a parameterized test
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    values: Vec<Value>,
    name: Option<String>,
}

impl ParameterSet {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values, name: None }
    }

    /// Explicit display name, used instead of the joined arguments.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `name` if given, else the arguments joined with `,`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Build a [`ParameterSet`] from heterogeneous literals.
///
/// ```
/// use verdict_core::params;
///
/// let case = params![12, "e2e4", true];
/// assert_eq!(case.display_name(), "12,e2e4,true");
/// ```
#[macro_export]
macro_rules! params {
    ($($value:expr),* $(,)?) => {
        $crate::ParameterSet::new(vec![$($crate::Value::from($value)),*])
    };
}

/// A marker attached to a method
#[derive(Debug, Clone, PartialEq)]
pub enum MethodMarker {
    Test(TestMarker),
    Skip { reason: Option<String> },
    Case(ParameterSet),
    Role(LifecycleRole),
}

// ============================================================================
// Method declarations
// ============================================================================

/// A method declared on suite type `S`
pub struct MethodDecl<S> {
    inner: MethodDeclaration,
    _suite: PhantomData<fn(&mut S)>,
}

/// Type-erased method declaration
#[derive(Clone)]
pub struct MethodDeclaration {
    pub(crate) name: String,
    pub(crate) markers: Vec<MethodMarker>,
    pub(crate) arity: usize,
    pub(crate) is_async: bool,
    pub(crate) body: ErasedBody,
}

impl MethodDeclaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn markers(&self) -> &[MethodMarker] {
        &self.markers
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }
}

impl<S: 'static> MethodDecl<S> {
    fn from_parts(name: impl Into<String>, arity: usize, is_async: bool, body: ErasedBody) -> Self {
        Self {
            inner: MethodDeclaration {
                name: name.into(),
                markers: Vec::new(),
                arity,
                is_async,
                body,
            },
            _suite: PhantomData,
        }
    }

    /// A synchronous method taking no arguments.
    pub fn sync<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut S) -> anyhow::Result<()> + 'static,
    {
        let body = erase(move |instance, _args| {
            let outcome = downcast::<S>(instance).and_then(|suite| body(suite));
            future::ready(outcome).boxed_local()
        });
        Self::from_parts(name, 0, false, body)
    }

    /// An asynchronous method taking no arguments. The runner awaits the
    /// returned future before moving on.
    pub fn asynchronous<F>(name: impl Into<String>, body: F) -> Self
    where
        F: for<'a> Fn(&'a mut S) -> BodyFuture<'a> + 'static,
    {
        let body = erase(move |instance, _args| match downcast::<S>(instance) {
            Ok(suite) => body(suite),
            Err(err) => future::ready(Err(err)).boxed_local(),
        });
        Self::from_parts(name, 0, true, body)
    }

    /// A synchronous method taking `arity` literal arguments.
    pub fn parameterized<F>(name: impl Into<String>, arity: usize, body: F) -> Self
    where
        F: Fn(&mut S, &[Value]) -> anyhow::Result<()> + 'static,
    {
        let body = erase(move |instance, args| {
            let outcome = downcast::<S>(instance).and_then(|suite| body(suite, args));
            future::ready(outcome).boxed_local()
        });
        Self::from_parts(name, arity, false, body)
    }

    /// An asynchronous method taking `arity` literal arguments.
    pub fn parameterized_async<F>(name: impl Into<String>, arity: usize, body: F) -> Self
    where
        F: for<'a> Fn(&'a mut S, &'a [Value]) -> BodyFuture<'a> + 'static,
    {
        let body = erase(move |instance, args| match downcast::<S>(instance) {
            Ok(suite) => body(suite, args),
            Err(err) => future::ready(Err(err)).boxed_local(),
        });
        Self::from_parts(name, arity, true, body)
    }

    fn marker(mut self, marker: MethodMarker) -> Self {
        self.inner.markers.push(marker);
        self
    }

    /// Mark as a test with the suite's default priority.
    pub fn test(self) -> Self {
        self.marker(MethodMarker::Test(TestMarker::default()))
    }

    pub fn test_with(self, marker: TestMarker) -> Self {
        self.marker(MethodMarker::Test(marker))
    }

    /// Exclude from discovery. Takes precedence over `test()`.
    pub fn skip(self, reason: impl Into<String>) -> Self {
        self.marker(MethodMarker::Skip {
            reason: Some(reason.into()),
        })
    }

    /// Add a parameter set. Cases expand in the order they are added.
    pub fn case(self, case: ParameterSet) -> Self {
        self.marker(MethodMarker::Case(case))
    }

    /// Attach a lifecycle role. Repeating a role on one method has no effect.
    pub fn role(self, role: LifecycleRole) -> Self {
        self.marker(MethodMarker::Role(role))
    }

    pub fn before_all(self) -> Self {
        self.role(LifecycleRole::SuiteSetup)
    }

    pub fn after_all(self) -> Self {
        self.role(LifecycleRole::SuiteTeardown)
    }

    pub fn before_each(self) -> Self {
        self.role(LifecycleRole::PerTestSetup)
    }

    pub fn after_each(self) -> Self {
        self.role(LifecycleRole::PerTestTeardown)
    }
}

// ============================================================================
// Type declarations
// ============================================================================

/// A shared-context dependency declared by a suite type
#[derive(Clone)]
pub struct ContextDependency {
    pub(crate) context_name: String,
    pub(crate) inject: Injector,
}

impl ContextDependency {
    pub fn context_name(&self) -> &str {
        &self.context_name
    }
}

/// One declared type whose instances are created with `S::default()`
pub struct TypeDecl<S> {
    inner: TypeDeclaration,
    _suite: PhantomData<fn() -> S>,
}

/// Type-erased declared type
#[derive(Clone)]
pub struct TypeDeclaration {
    pub(crate) name: String,
    pub(crate) marker: Option<SuiteMarker>,
    pub(crate) context: Option<ContextDependency>,
    pub(crate) methods: Vec<MethodDeclaration>,
    pub(crate) factory: Factory,
}

impl TypeDeclaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marker(&self) -> Option<&SuiteMarker> {
        self.marker.as_ref()
    }

    pub fn methods(&self) -> &[MethodDeclaration] {
        &self.methods
    }
}

impl<S: Default + 'static> TypeDecl<S> {
    pub fn new(name: impl Into<String>) -> Self {
        let factory: Factory = Rc::new(|| Box::new(S::default()) as Box<dyn Any>);
        Self {
            inner: TypeDeclaration {
                name: name.into(),
                marker: None,
                context: None,
                methods: Vec::new(),
                factory,
            },
            _suite: PhantomData,
        }
    }

    /// Attach the suite marker. Types without one are ignored by discovery.
    pub fn suite(mut self, marker: SuiteMarker) -> Self {
        self.inner.marker = Some(marker);
        self
    }

    /// Declare a shared-context dependency. `inject` runs on the fresh
    /// instance before any lifecycle hook.
    pub fn shared_context<F>(mut self, context_name: impl Into<String>, inject: F) -> Self
    where
        F: Fn(&mut S, ContextHandle) + 'static,
    {
        let inject: Injector = Rc::new(move |instance, handle| {
            let suite = downcast::<S>(instance)?;
            inject(suite, handle);
            Ok(())
        });
        self.inner.context = Some(ContextDependency {
            context_name: context_name.into(),
            inject,
        });
        self
    }

    /// Append a method in declaration order.
    pub fn method(mut self, method: MethodDecl<S>) -> Self {
        self.inner.methods.push(method.inner);
        self
    }

    pub fn build(self) -> TypeDeclaration {
        self.inner
    }
}

impl<S: Default + 'static> From<TypeDecl<S>> for TypeDeclaration {
    fn from(decl: TypeDecl<S>) -> Self {
        decl.build()
    }
}

/// The set of declared types that discovery inspects
#[derive(Clone, Default)]
pub struct TestModule {
    name: String,
    types: Vec<TypeDeclaration>,
}

impl TestModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn declare(mut self, decl: impl Into<TypeDeclaration>) -> Self {
        self.types.push(decl.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[TypeDeclaration] {
        &self.types
    }
}

impl fmt::Debug for TestModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<_> = self.types.iter().map(TypeDeclaration::name).collect();
        f.debug_struct("TestModule")
            .field("name", &self.name)
            .field("types", &types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        calls: u32,
    }

    #[test]
    fn test_display_name_joins_arguments() {
        let case = crate::params![1, "b", false];
        assert_eq!(case.display_name(), "1,b,false");
        assert_eq!(case.named("third").display_name(), "third");
    }

    #[test]
    fn test_empty_parameter_set_display() {
        assert_eq!(ParameterSet::new(Vec::new()).display_name(), "");
    }

    #[test]
    fn test_markers_accumulate_in_order() {
        let method = MethodDecl::<Counter>::sync("m", |_| Ok(()))
            .test()
            .case(crate::params![1])
            .before_each()
            .case(crate::params![2]);
        let markers = method.inner.markers();
        assert_eq!(markers.len(), 4);
        assert!(matches!(markers[0], MethodMarker::Test(_)));
        assert_eq!(markers[2], MethodMarker::Role(LifecycleRole::PerTestSetup));
    }

    #[test]
    fn test_type_decl_collects_methods() {
        let decl = TypeDecl::<Counter>::new("Counter")
            .suite(SuiteMarker::new().category("Unit").priority(4))
            .method(MethodDecl::sync("a", |p: &mut Counter| {
                p.calls += 1;
                Ok(())
            }))
            .method(MethodDecl::sync("b", |_: &mut Counter| Ok(())))
            .build();
        assert_eq!(decl.name(), "Counter");
        assert_eq!(decl.marker().map(|m| m.priority), Some(4));
        let names: Vec<_> = decl.methods().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_erased_body_mutates_instance() {
        let decl = TypeDecl::<Counter>::new("Counter")
            .method(MethodDecl::sync("bump", |p: &mut Counter| {
                p.calls += 1;
                Ok(())
            }))
            .build();
        let mut instance = (decl.factory)();
        let body = decl.methods()[0].body.clone();
        futures_util::FutureExt::now_or_never(body(instance.as_mut(), &[]))
            .expect("ready future")
            .unwrap();
        let counter = instance.downcast_ref::<Counter>().unwrap();
        assert_eq!(counter.calls, 1);
    }

    #[test]
    fn test_wrong_instance_type_is_an_error() {
        let method = MethodDecl::<Counter>::sync("m", |_| Ok(()));
        let mut other: Box<dyn Any> = Box::new(5_u8);
        let outcome =
            futures_util::FutureExt::now_or_never((method.inner.body)(other.as_mut(), &[]))
                .expect("ready future");
        assert!(outcome.unwrap_err().to_string().contains("suite instance is not"));
    }

    #[test]
    fn test_module_debug_lists_type_names() {
        let module = TestModule::new("chess")
            .declare(TypeDecl::<Counter>::new("Rook"))
            .declare(TypeDecl::<Counter>::new("Bishop"));
        assert_eq!(
            format!("{:?}", module),
            r#"TestModule { name: "chess", types: ["Rook", "Bishop"] }"#
        );
    }

    #[test]
    fn test_critical_marker() {
        let marker = TestMarker::new().critical();
        assert!(marker.critical);
        assert!(!TestMarker::new().critical);
    }
}
