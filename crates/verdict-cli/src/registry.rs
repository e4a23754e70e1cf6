//! Test modules the binary can run, by name

use crate::samples;
use thiserror::Error;
use verdict_core::TestModule;

#[derive(Error, Debug, PartialEq)]
#[error("unknown module '{name}' (available: {available})")]
pub struct UnknownModule {
    pub name: String,
    pub available: String,
}

pub struct ModuleEntry {
    pub name: &'static str,
    pub summary: &'static str,
    build: fn() -> TestModule,
}

impl ModuleEntry {
    pub fn build(&self) -> TestModule {
        (self.build)()
    }
}

const MODULES: &[ModuleEntry] = &[
    ModuleEntry {
        name: "samples",
        summary: "chess model suites covering every framework feature",
        build: samples::module,
    },
    ModuleEntry {
        name: "failures",
        summary: "one failing test per failure kind",
        build: samples::failures,
    },
];

pub fn entries() -> &'static [ModuleEntry] {
    MODULES
}

pub fn names() -> Vec<&'static str> {
    MODULES.iter().map(|m| m.name).collect()
}

/// Build the module registered as `name` (exact match, surrounding
/// whitespace ignored).
pub fn lookup(name: &str) -> Result<TestModule, UnknownModule> {
    let name = name.trim();
    MODULES
        .iter()
        .find(|m| m.name == name)
        .map(ModuleEntry::build)
        .ok_or_else(|| UnknownModule {
            name: name.to_string(),
            available: names().join(", "),
        })
}
