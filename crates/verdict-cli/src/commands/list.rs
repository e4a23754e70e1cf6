//! List command - show registered modules or a module's discovered suites

use crate::registry;
use anyhow::Result;
use colored::*;
use std::io::Write;
use verdict_core::{discover, LifecycleRole, SuiteDescriptor};

pub fn run(module: Option<&str>, out: &mut dyn Write) -> Result<()> {
    match module {
        None => list_modules(out),
        Some(name) => {
            let module = registry::lookup(name)?;
            writeln!(out, "{} {}", "Module:".bold(), module.name())?;
            for suite in discover(&module) {
                list_suite(&suite, out)?;
            }
            Ok(())
        }
    }
}

fn list_modules(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", "Available modules:".bold())?;
    for entry in registry::entries() {
        writeln!(out, "  {:<10} {}", entry.name.green(), entry.summary.dimmed())?;
    }
    Ok(())
}

fn plural(n: usize, word: &str) -> String {
    format!("{} {}{}", n, word, if n == 1 { "" } else { "s" })
}

fn list_suite(suite: &SuiteDescriptor, out: &mut dyn Write) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}  [{}]  (P{})  {}",
        suite.name.bold(),
        suite.category.as_deref().unwrap_or("Uncategorized").cyan(),
        suite.priority,
        plural(suite.execution_count(), "execution").dimmed()
    )?;

    if let Some(context) = suite.shared_context() {
        writeln!(out, "  shared context: {}", context)?;
    }

    for role in LifecycleRole::ALL {
        let hooks = suite.lifecycle.hooks(role);
        if hooks.is_empty() {
            continue;
        }
        let names: Vec<_> = hooks.iter().map(|h| h.name()).collect();
        writeln!(out, "  {}: {}", role.label(), names.join(", "))?;
    }

    for test in &suite.tests {
        let mut line = format!("  - {}  (P{})", test.name, test.priority);
        if !test.cases.is_empty() {
            line.push_str(&format!("  {}", plural(test.cases.len(), "case")));
        }
        if test.is_async {
            line.push_str("  async");
        }
        if test.critical {
            line.push_str("  critical");
        }
        writeln!(out, "{}", line)?;
        if let Some(description) = &test.description {
            writeln!(out, "      {}", description.dimmed())?;
        }
    }

    for skipped in &suite.skipped {
        let reason = skipped.reason.as_deref().unwrap_or("no reason given");
        writeln!(out, "  {} {}  ({})", "~".yellow(), skipped.name, reason)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(module: Option<&str>) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        run(module, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_list_modules() {
        let text = listing(None);
        assert!(text.contains("samples"));
        assert!(text.contains("failures"));
    }

    #[test]
    fn test_list_samples() {
        let text = listing(Some("samples"));
        assert!(text.contains("KnightMoves  [Knight]  (P2)  6 executions"));
        assert!(text.contains("  before_each: clear"));
        assert!(text.contains("  - destination_count  (P2)  4 cases"));
        assert!(text.contains("  - lookup_async  (P0)  async"));
        assert!(text.contains("  - start_is_balanced  (P5)  critical"));
        assert!(text.contains("      equal material at the start"));
        assert!(text.contains("blocked_by_own_pieces  (needs board occupancy)"));
        assert!(text.contains("  shared context: game"));
    }

    #[test]
    fn test_list_unknown_module() {
        let mut out = Vec::new();
        assert!(run(Some("nope"), &mut out).is_err());
    }
}
