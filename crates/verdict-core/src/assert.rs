//! Assertion primitives for Verdict tests
//!
//! Every check evaluates a predicate and returns `Ok(())` when it holds.
//! When it does not, the check returns an [`AssertionFailure`], the single
//! error type the runner classifies as "expectation violated" rather than
//! "test crashed". Test bodies return `anyhow::Result<()>`, so `?` lifts a
//! failure into the body's error chain unchanged.
//!
//! # API
//!
//! ## Boolean
//! - `is_true(condition, message)` / `is_false(condition, message)`
//!
//! ## Equality
//! - `are_equal(expected, actual, message)` / `are_not_equal(...)`
//!
//! ## Option
//! - `is_null(&option, message)` / `is_not_null(&option, message)`
//!
//! ## Errors
//! - `throws::<K>(action, message)`: action must return `Err` of kind `K`
//! - `throws_async::<K>(action, message)`: same, awaiting the action's future
//! - `does_not_throw(action, message)`: action must return `Ok`
//!
//! ## Ranges and collections
//! - `in_range(value, min, max, message)`: inclusive bounds
//! - `contains(collection, &item, message)`
//!
//! ## Unconditional
//! - `fail(message)`

use futures_util::FutureExt;
use std::any::{type_name, Any};
use std::borrow::Borrow;
use std::error::Error as StdError;
use std::fmt::{self, Debug};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// The distinguished failure signal raised by every check.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AssertionFailure {
    message: String,
    #[source]
    inner: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            inner: None,
        }
    }

    /// Failure carrying the error that caused it.
    pub fn with_inner(
        message: impl Into<String>,
        inner: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            inner: Some(inner.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.inner.as_deref()
    }
}

/// Result type returned by all checks
pub type AssertResult = Result<(), AssertionFailure>;

// ============================================================================
// Internal helpers
// ============================================================================

/// Compose `Assert.<Name> failed: <detail>. <message>`.
fn failure_text(name: &str, detail: impl fmt::Display, message: &str) -> String {
    if message.is_empty() {
        format!("Assert.{} failed: {}", name, detail)
    } else {
        format!("Assert.{} failed: {}. {}", name, detail, message)
    }
}

fn failure(name: &str, detail: impl fmt::Display, message: &str) -> AssertionFailure {
    AssertionFailure::new(failure_text(name, detail, message))
}

/// Whether `err` or any error in its source chain is a `K`.
///
/// The source chain plays the role of an error-kind hierarchy: an error
/// wrapped with `.context(..)` still counts as its underlying kind.
fn raised_kind<K: StdError + 'static>(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<K>())
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn judge_raised<K, T, E>(
    name: &str,
    outcome: std::thread::Result<Result<T, E>>,
    message: &str,
) -> AssertResult
where
    K: StdError + 'static,
    E: Into<anyhow::Error>,
{
    let expected = type_name::<K>();
    match outcome {
        Ok(Ok(_)) => Err(failure(
            name,
            format!("expected error of type {} but no error was raised", expected),
            message,
        )),
        Ok(Err(err)) => {
            let err: anyhow::Error = err.into();
            if raised_kind::<K>(&err) {
                Ok(())
            } else {
                let detail = format!("expected error of type {} but caught '{}'", expected, err);
                Err(AssertionFailure::with_inner(
                    failure_text(name, detail, message),
                    err,
                ))
            }
        }
        Err(payload) => Err(failure(
            name,
            format!(
                "expected error of type {} but the action panicked: {}",
                expected,
                panic_message(payload.as_ref())
            ),
            message,
        )),
    }
}

// ============================================================================
// Boolean
// ============================================================================

pub fn is_true(condition: bool, message: &str) -> AssertResult {
    if !condition {
        return Err(failure("IsTrue", "expected true", message));
    }
    Ok(())
}

pub fn is_false(condition: bool, message: &str) -> AssertResult {
    if condition {
        return Err(failure("IsFalse", "expected false", message));
    }
    Ok(())
}

// ============================================================================
// Equality
// ============================================================================

/// Passes when `expected == actual` under the type's own `PartialEq`.
pub fn are_equal<T: PartialEq + Debug>(expected: T, actual: T, message: &str) -> AssertResult {
    if expected != actual {
        return Err(failure(
            "AreEqual",
            format!("expected {:?}, actual {:?}", expected, actual),
            message,
        ));
    }
    Ok(())
}

pub fn are_not_equal<T: PartialEq + Debug>(expected: T, actual: T, message: &str) -> AssertResult {
    if expected == actual {
        return Err(failure(
            "AreNotEqual",
            format!("values are equal {:?}", actual),
            message,
        ));
    }
    Ok(())
}

// ============================================================================
// Option
// ============================================================================

pub fn is_null<T: Debug>(value: &Option<T>, message: &str) -> AssertResult {
    if let Some(inner) = value {
        return Err(failure(
            "IsNull",
            format!("expected null, got {:?}", inner),
            message,
        ));
    }
    Ok(())
}

pub fn is_not_null<T>(value: &Option<T>, message: &str) -> AssertResult {
    if value.is_none() {
        return Err(failure("IsNotNull", "expected a value, got null", message));
    }
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Passes iff `action` returns an error of kind `K`.
///
/// Fails when the action succeeds, when it returns an error of another
/// kind, and when it panics.
pub fn throws<K, T, E, F>(action: F, message: &str) -> AssertResult
where
    K: StdError + 'static,
    E: Into<anyhow::Error>,
    F: FnOnce() -> Result<T, E>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(action));
    judge_raised::<K, T, E>("Throws", outcome, message)
}

/// Async form of [`throws`]: awaits the future produced by `action`
/// before judging it.
pub async fn throws_async<K, T, E, F, Fut>(action: F, message: &str) -> AssertResult
where
    K: StdError + 'static,
    E: Into<anyhow::Error>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let outcome = AssertUnwindSafe(async move { action().await })
        .catch_unwind()
        .await;
    judge_raised::<K, T, E>("ThrowsAsync", outcome, message)
}

pub fn does_not_throw<T, E, F>(action: F, message: &str) -> AssertResult
where
    E: Into<anyhow::Error>,
    F: FnOnce() -> Result<T, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(action)) {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => {
            let err: anyhow::Error = err.into();
            let detail = format!("unexpected error '{}'", err);
            Err(AssertionFailure::with_inner(
                failure_text("DoesNotThrow", detail, message),
                err,
            ))
        }
        Err(payload) => Err(failure(
            "DoesNotThrow",
            format!("unexpected panic '{}'", panic_message(payload.as_ref())),
            message,
        )),
    }
}

// ============================================================================
// Ranges and collections
// ============================================================================

/// Inclusive `min <= value <= max`. Unordered values (NaN) fail.
pub fn in_range<T: PartialOrd + Debug>(value: T, min: T, max: T, message: &str) -> AssertResult {
    if !(min <= value && value <= max) {
        return Err(failure(
            "InRange",
            format!("value {:?} is not in range [{:?}, {:?}]", value, min, max),
            message,
        ));
    }
    Ok(())
}

pub fn contains<I, T>(collection: I, item: &T, message: &str) -> AssertResult
where
    I: IntoIterator,
    I::Item: Borrow<T>,
    T: PartialEq + Debug + ?Sized,
{
    if !collection.into_iter().any(|candidate| candidate.borrow() == item) {
        return Err(failure(
            "Contains",
            format!("collection does not contain {:?}", item),
            message,
        ));
    }
    Ok(())
}

pub fn fail(message: &str) -> AssertResult {
    Err(failure("Fail", "explicit failure", message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io;

    #[derive(Debug, Error)]
    #[error("board is invalid")]
    struct InvalidBoard;

    fn parse_square(s: &str) -> Result<u8, InvalidBoard> {
        match s.as_bytes() {
            [f @ b'a'..=b'h', r @ b'1'..=b'8'] => Ok((r - b'1') * 8 + (f - b'a')),
            _ => Err(InvalidBoard),
        }
    }

    #[rstest]
    #[case(is_true(true, "ok"), true)]
    #[case(is_true(false, "flag"), false)]
    #[case(is_false(false, "ok"), true)]
    #[case(is_false(true, "flag"), false)]
    #[case(are_equal(2 + 2, 4, ""), true)]
    #[case(are_equal("a", "b", ""), false)]
    #[case(are_not_equal(1, 2, ""), true)]
    #[case(are_not_equal(vec![1], vec![1], ""), false)]
    #[case(is_null(&None::<i32>, ""), true)]
    #[case(is_null(&Some(1), ""), false)]
    #[case(is_not_null(&Some(1), ""), true)]
    #[case(is_not_null(&None::<i32>, ""), false)]
    #[case(in_range(5, 1, 5, ""), true)]
    #[case(in_range(0, 1, 5, ""), false)]
    #[case(in_range(f64::NAN, 0.0, 1.0, ""), false)]
    #[case(contains(&[1, 2, 3], &2, ""), true)]
    #[case(contains(vec!["e4", "d4"], &"c4", ""), false)]
    fn test_checks(#[case] outcome: AssertResult, #[case] passes: bool) {
        assert_eq!(outcome.is_ok(), passes);
    }

    #[test]
    fn test_message_format() {
        let err = are_equal(32, 31, "piece count").unwrap_err();
        assert_eq!(
            err.message(),
            "Assert.AreEqual failed: expected 32, actual 31. piece count"
        );

        let err = is_true(false, "").unwrap_err();
        assert_eq!(err.to_string(), "Assert.IsTrue failed: expected true");
    }

    #[test]
    fn test_composite_equality() {
        #[derive(Debug, PartialEq)]
        struct Move {
            from: u8,
            to: u8,
        }
        assert!(are_equal(Move { from: 12, to: 28 }, Move { from: 12, to: 28 }, "").is_ok());
        assert!(are_equal(&[Some(1), None], &[Some(1), Some(2)], "").is_err());
    }

    #[test]
    fn test_throws_exact_kind() {
        assert!(throws::<InvalidBoard, _, _, _>(|| parse_square("z9"), "").is_ok());
    }

    #[test]
    fn test_throws_fails_without_error() {
        let err =
            throws::<InvalidBoard, _, _, _>(|| parse_square("e2"), "e2 is valid").unwrap_err();
        assert!(err.message().starts_with("Assert.Throws failed: expected error of type"));
        assert!(err.message().contains("no error was raised"));
        assert!(err.message().ends_with("e2 is valid"));
    }

    #[test]
    fn test_throws_fails_on_other_kind() {
        let err = throws::<InvalidBoard, (), _, _>(
            || Err(io::Error::new(io::ErrorKind::NotFound, "book.txt")),
            "",
        )
        .unwrap_err();
        assert!(err.message().contains("but caught 'book.txt'"));
        assert!(err.inner().is_some());
    }

    #[test]
    fn test_throws_matches_through_context() {
        use anyhow::Context;
        let outcome = throws::<InvalidBoard, _, _, _>(
            || parse_square("??").context("loading opening book"),
            "",
        );
        assert!(outcome.is_ok());
    }

    #[test]
    fn test_throws_fails_on_panic() {
        let err = throws::<InvalidBoard, (), InvalidBoard, _>(|| panic!("boom"), "").unwrap_err();
        assert!(err.message().contains("panicked: boom"));
    }

    #[test]
    fn test_does_not_throw() {
        assert!(does_not_throw(|| parse_square("a1"), "").is_ok());
        let err = does_not_throw(|| parse_square("a9"), "bad square").unwrap_err();
        assert_eq!(
            err.message(),
            "Assert.DoesNotThrow failed: unexpected error 'board is invalid'. bad square"
        );
    }

    #[tokio::test]
    async fn test_throws_async_three_way() {
        let raised = throws_async::<InvalidBoard, (), _, _, _>(
            || async { Err::<(), _>(InvalidBoard) },
            "",
        )
        .await;
        assert!(raised.is_ok());

        let completed = throws_async::<InvalidBoard, _, InvalidBoard, _, _>(
            || async { Ok(1) },
            "",
        )
        .await;
        assert!(completed.unwrap_err().message().contains("no error was raised"));

        let other = throws_async::<InvalidBoard, (), _, _, _>(
            || async { Err::<(), _>(io::Error::other("disk")) },
            "",
        )
        .await;
        let err = other.unwrap_err();
        assert!(err.message().starts_with("Assert.ThrowsAsync failed"));
        assert!(err.message().contains("but caught 'disk'"));
    }

    #[test]
    fn test_fail_is_always_an_error() {
        let err = fail("not implemented").unwrap_err();
        assert_eq!(
            err.message(),
            "Assert.Fail failed: explicit failure. not implemented"
        );
    }
}
