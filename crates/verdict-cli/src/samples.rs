//! Built-in test modules
//!
//! `samples` exercises every feature of the framework and passes. `failures`
//! shows each way a test can fail and how it is reported.

use crate::chess::{knight_moves, material, ChessError, OpeningBook};
use futures_util::FutureExt;
use std::path::Path;
use std::rc::Rc;
use verdict_core::metadata::BodyFuture;
use verdict_core::{
    arg, assert, params, ContextHandle, MethodDecl, SharedContext, SuiteMarker, TestMarker,
    TestModule, TypeDecl, Value,
};

const BOOK: &str = "\
# position = move
start = e2e4
sicilian = c7c5
french = e7e6
";

// ============================================================================
// Knight
// ============================================================================

#[derive(Default)]
struct Knights {
    moves: Vec<String>,
}

fn knight_suite() -> TypeDecl<Knights> {
    TypeDecl::<Knights>::new("KnightMoves")
        .suite(SuiteMarker::new().category("Knight").priority(2))
        .method(
            MethodDecl::sync("clear", |k: &mut Knights| {
                k.moves.clear();
                Ok(())
            })
            .before_each(),
        )
        .method(
            MethodDecl::parameterized("destination_count", 2, |k: &mut Knights, args: &[Value]| {
                let from: String = arg(args, 0)?;
                let expected: usize = arg(args, 1)?;
                k.moves = knight_moves(&from)?;
                assert::are_equal(expected, k.moves.len(), &format!("knight on {}", from))?;
                Ok(())
            })
            .test()
            .case(params!["a1", 2])
            .case(params!["b1", 3])
            .case(params!["d4", 8])
            .case(params!["h8", 2].named("far corner")),
        )
        .method(
            MethodDecl::sync("corner_targets", |k: &mut Knights| {
                k.moves = knight_moves("a1")?;
                assert::contains(k.moves.iter().map(String::as_str), "b3", "a1 reaches b3")?;
                assert::contains(k.moves.iter().map(String::as_str), "c2", "a1 reaches c2")?;
                Ok(())
            })
            .test(),
        )
        .method(
            MethodDecl::sync("rejects_off_board", |_: &mut Knights| {
                assert::throws::<ChessError, _, _, _>(|| knight_moves("z0"), "z0 is not a square")?;
                Ok(())
            })
            .test_with(TestMarker::new().priority(3)),
        )
        .method(
            MethodDecl::sync("blocked_by_own_pieces", |_: &mut Knights| Ok(()))
                .test()
                .skip("needs board occupancy"),
        )
}

// ============================================================================
// Evaluation
// ============================================================================

#[derive(Default)]
struct Evaluation;

fn evaluation_suite() -> TypeDecl<Evaluation> {
    TypeDecl::<Evaluation>::new("PositionEvaluation")
        .suite(SuiteMarker::new().category("Evaluation").priority(1))
        .method(
            MethodDecl::sync("start_is_balanced", |_: &mut Evaluation| {
                let score = material("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR")?;
                assert::are_equal(0, score, "")?;
                Ok(())
            })
            .test_with(
                TestMarker::new()
                    .priority(5)
                    .description("equal material at the start")
                    .critical(),
            ),
        )
        .method(
            MethodDecl::parameterized("piece_values", 2, |_: &mut Evaluation, args: &[Value]| {
                let pieces: String = arg(args, 0)?;
                let expected: i32 = arg(args, 1)?;
                assert::are_equal(expected, material(&pieces)?, &pieces)?;
                Ok(())
            })
            .test()
            .case(params!["Q", 900])
            .case(params!["qR", -400])
            .case(params!["Kk", 0].named("bare kings")),
        )
        .method(
            MethodDecl::sync("advantage_in_range", |_: &mut Evaluation| {
                assert::in_range(material("QRp")?, 1000, 1500, "queen and rook up")?;
                Ok(())
            })
            .test(),
        )
        .method(
            MethodDecl::sync("valid_pieces_parse", |_: &mut Evaluation| {
                assert::does_not_throw(|| material("KQkq"), "")?;
                assert::throws::<ChessError, _, _, _>(|| material("Kx"), "x is no piece")?;
                Ok(())
            })
            .test(),
        )
}

// ============================================================================
// Opening book
// ============================================================================

#[derive(Default)]
struct Book {
    book: OpeningBook,
}

fn lookup_async(b: &mut Book) -> BodyFuture<'_> {
    async move {
        let reply = b.book.lookup_async("sicilian").await;
        assert::are_equal(Some("c7c5".to_string()), reply, "async lookup")?;
        Ok(())
    }
    .boxed_local()
}

fn malformed_async(_: &mut Book) -> BodyFuture<'_> {
    async move {
        assert::throws_async::<ChessError, _, _, _, _>(
            || async { OpeningBook::parse("no separator here") },
            "line without '='",
        )
        .await?;
        Ok(())
    }
    .boxed_local()
}

fn book_suite() -> TypeDecl<Book> {
    TypeDecl::<Book>::new("OpeningBook")
        .suite(SuiteMarker::new().category("Book"))
        .method(
            MethodDecl::sync("load", |b: &mut Book| {
                b.book = OpeningBook::parse(BOOK)?;
                Ok(())
            })
            .before_all(),
        )
        .method(
            MethodDecl::sync("lookup_start", |b: &mut Book| {
                assert::are_equal(3, b.book.len(), "entries")?;
                assert::are_equal(Some("e2e4"), b.book.lookup("start"), "")?;
                assert::is_null(&b.book.lookup("nimzo"), "unknown position")?;
                Ok(())
            })
            .test(),
        )
        .method(MethodDecl::asynchronous("lookup_async", lookup_async).test())
        .method(MethodDecl::asynchronous("malformed_async", malformed_async).test())
        .method(
            MethodDecl::sync("missing_file", |_: &mut Book| {
                assert::throws::<std::io::Error, _, _, _>(
                    || OpeningBook::load(Path::new("/nonexistent/verdict/book.txt")),
                    "missing book file",
                )?;
                Ok(())
            })
            .test(),
        )
}

// ============================================================================
// Integration (shared context)
// ============================================================================

#[derive(Default)]
struct Game {
    handle: Option<ContextHandle>,
    context: Option<Rc<SharedContext>>,
}

impl Game {
    fn context(&self) -> anyhow::Result<&SharedContext> {
        self.context
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("shared context not acquired"))
    }
}

fn acquire(g: &mut Game) -> anyhow::Result<()> {
    let handle = g
        .handle
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("shared context not injected"))?;
    g.context = Some(handle.create()?);
    Ok(())
}

fn game_suite(name: &str) -> TypeDecl<Game> {
    TypeDecl::<Game>::new(name)
        .suite(SuiteMarker::new().category("Integration"))
        .shared_context("game", |g: &mut Game, handle| g.handle = Some(handle))
        .method(MethodDecl::sync("acquire", acquire).before_all())
}

fn recording_suite() -> TypeDecl<Game> {
    game_suite("GameRecording")
        .method(
            MethodDecl::sync("record_opening", |g: &mut Game| {
                let ctx = g.context()?;
                ctx.set_data("history", vec!["e2e4".to_string(), "e7e5".to_string()]);
                ctx.set_data("opened_by", "GameRecording".to_string());
                Ok(())
            })
            .test(),
        )
        .method(
            MethodDecl::sync("history_is_visible", |g: &mut Game| {
                let history = g.context()?.get_data::<Vec<String>>("history");
                assert::is_not_null(&history, "history recorded earlier")?;
                assert::are_equal(2, history.unwrap_or_default().len(), "")?;
                Ok(())
            })
            .test(),
        )
}

fn replay_suite() -> TypeDecl<Game> {
    game_suite("GameReplay")
        .method(
            MethodDecl::sync("continues_history", |g: &mut Game| {
                let ctx = g.context()?;
                let len = ctx.update_data("history", |h: &mut Vec<String>| {
                    h.push("g1f3".to_string());
                    h.len()
                });
                assert::are_equal(Some(3), len, "history carried across suites")?;
                assert::are_equal(
                    Some("GameRecording".to_string()),
                    ctx.get_data::<String>("opened_by"),
                    "",
                )?;
                Ok(())
            })
            .test(),
        )
        .method(
            MethodDecl::sync("release", |g: &mut Game| {
                g.context()?.dispose();
                Ok(())
            })
            .after_all(),
        )
}

/// Every feature, all passing
pub fn module() -> TestModule {
    TestModule::new("samples")
        .declare(knight_suite())
        .declare(evaluation_suite())
        .declare(book_suite())
        .declare(recording_suite())
        .declare(replay_suite())
}

// ============================================================================
// Failures
// ============================================================================

#[derive(Default)]
struct Demo;

fn async_failure(_: &mut Demo) -> BodyFuture<'_> {
    async move {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        assert::is_true(false, "after an await")?;
        Ok(())
    }
    .boxed_local()
}

/// One failing test per failure kind
pub fn failures() -> TestModule {
    TestModule::new("failures")
        .declare(
            TypeDecl::<Demo>::new("FailureKinds")
                .suite(SuiteMarker::new().category("Demo"))
                .method(
                    MethodDecl::sync("assertion", |_: &mut Demo| {
                        assert::are_equal(4, 2 + 3, "arithmetic")?;
                        Ok(())
                    })
                    .test(),
                )
                .method(
                    MethodDecl::sync("unexpected_error", |_: &mut Demo| {
                        knight_moves("z9")?;
                        Ok(())
                    })
                    .test(),
                )
                .method(MethodDecl::asynchronous("async_assertion", async_failure).test())
                .method(
                    MethodDecl::parameterized("wrong_arity", 2, |_: &mut Demo, _: &[Value]| Ok(()))
                        .test()
                        .case(params![1]),
                )
                .method(MethodDecl::sync("passes", |_: &mut Demo| Ok(())).test()),
        )
        .declare(
            TypeDecl::<Demo>::new("BrokenSetup")
                .suite(SuiteMarker::new().category("Demo"))
                .method(
                    MethodDecl::sync("connect", |_: &mut Demo| {
                        anyhow::bail!("engine process unavailable")
                    })
                    .before_all(),
                )
                .method(MethodDecl::sync("never_runs", |_: &mut Demo| Ok(())).test()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::{discover, TestRunner};

    #[test]
    fn test_samples_all_pass() {
        let results = TestRunner::new().run_module(&module());
        let failed: Vec<_> = results
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| format!("{}: {}", r.name(), r.error_message()))
            .collect();
        assert!(failed.is_empty(), "{:#?}", failed);
        assert_eq!(results.len(), 6 + 6 + 4 + 2 + 1);
    }

    #[test]
    fn test_samples_discover_skip() {
        let suites = discover(&module());
        assert_eq!(suites[0].skipped.len(), 1);
        assert_eq!(suites[3].shared_context(), Some("game"));
    }

    #[test]
    fn test_failures_module() {
        let results = TestRunner::new().run_module(&failures());
        let messages: Vec<_> = results.iter().map(|r| r.error_message()).collect();
        assert_eq!(
            messages,
            vec![
                "Assert.AreEqual failed: expected 4, actual 5. arithmetic",
                "Test failed with exception: invalid square 'z9'",
                "Assert.IsTrue failed: expected true. after an await",
                "Test failed with exception: parameter count mismatch: expected 2 arguments, got 1",
                "",
                "Suite setup failed: Test failed with exception: engine process unavailable",
            ]
        );
    }
}
