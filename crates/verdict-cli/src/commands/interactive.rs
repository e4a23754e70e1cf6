//! Interactive mode - read module names from stdin and run each one
//!
//! Stops at an empty line or end of input. One runner serves the whole
//! session, so the shared context survives between modules until a suite
//! disposes it.

use super::run::execute;
use crate::registry;
use anyhow::Result;
use colored::*;
use std::io::{BufRead, Write};
use verdict_config::ResolvedSettings;
use verdict_core::TestRunner;

const PROMPT: &str = "Module to run (empty line to quit): ";

/// Returns how many modules ran.
pub fn run(
    settings: &ResolvedSettings,
    json: bool,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<usize> {
    let runner = TestRunner::new().with_filter(settings.filter.clone());
    let mut ran = 0;

    loop {
        if !json {
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let name = line.trim();
        if name.is_empty() {
            break;
        }

        match registry::lookup(name) {
            Ok(module) => {
                execute(&runner, &[module], settings, json, out)?;
                ran += 1;
            }
            Err(e) => {
                log::debug!("lookup failed: {}", e);
                if settings.color {
                    writeln!(out, "{}", e.to_string().red())?;
                } else {
                    writeln!(out, "{}", e)?;
                }
            }
        }
    }

    if !json {
        writeln!(out)?;
    }
    Ok(ran)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn quiet() -> ResolvedSettings {
        ResolvedSettings {
            color: false,
            save: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_runs_until_empty_line() {
        let mut input = Cursor::new("samples\n\nfailures\n");
        let mut out = Vec::new();
        let ran = run(&quiet(), false, &mut input, &mut out).unwrap();
        assert_eq!(ran, 1);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(PROMPT).count(), 2);
        assert!(!text.contains("FailureKinds"));
    }

    #[test]
    fn test_unknown_module_keeps_going() {
        let mut input = Cursor::new("openings\nfailures");
        let mut out = Vec::new();
        let ran = run(&quiet(), false, &mut input, &mut out).unwrap();
        assert_eq!(ran, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("unknown module 'openings'"));
        assert!(text.contains("Category: Demo"));
    }

    #[test]
    fn test_shared_context_is_fresh_after_dispose() {
        // GameReplay disposes the context, so a second run starts clean
        let mut input = Cursor::new("samples\nsamples\n");
        let mut out = Vec::new();
        assert_eq!(run(&quiet(), false, &mut input, &mut out).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Failed: 0\n").count(), 2);
    }
}
