//! Runs the binding fixtures under `fixtures/`.
//!
//! Each fixture file holds a list of cases: a source document, the record it is
//! bound to, and the expected outcome. An optional regex argument filters cases
//! by name.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::Colorize;
use regex::Regex;
use serde::Deserialize;
use tree_binding::catalog::{self, Inventory, Library};
use tree_binding::{BindError, Binder, BindOptions, PropertyTree, Record};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    name: String,
    record: RecordKind,
    format: Format,
    source: String,
    expect: Expect,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RecordKind {
    Library,
    Inventory,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Format {
    Json,
    Xml,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Expect {
    /// binds and every field is valid
    Valid,
    /// binds, but some optional field stayed unset
    Incomplete,
    /// fails with the named error kind
    Error(String),
}

fn main() -> ExitCode {
    let filter = match std::env::args().nth(1).map(|src| Regex::new(&src)).transpose() {
        Ok(filter) => filter,
        Err(error) => {
            eprintln!("invalid filter: {error}");
            return ExitCode::FAILURE;
        }
    };
    let binder = Binder::new(catalog::registry(), BindOptions::default());

    let mut passed = 0;
    let mut failed = 0;
    for path in fixture_paths() {
        let file = match load_fixture(&path) {
            Ok(file) => file,
            Err(error) => {
                failed += 1;
                println!("{} {}: {error}", "✗".red(), path.display());
                continue;
            }
        };
        for case in file.cases {
            if filter.as_ref().is_some_and(|filter| !filter.is_match(&case.name)) {
                continue;
            }
            let actual = run_case(&binder, &case);
            if actual == case.expect {
                passed += 1;
                println!("{} {}", "✓".green(), case.name);
            } else {
                failed += 1;
                println!("{} {}: expected {:?}, got {actual:?}", "✗".red(), case.name, case.expect);
            }
        }
    }

    println!("{passed} passed, {failed} failed");
    if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn fixture_paths() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect()
        })
        .unwrap_or_default();
    paths.sort();
    paths
}

fn load_fixture(path: &Path) -> Result<FixtureFile, String> {
    let src = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
    let de = &mut serde_json::Deserializer::from_str(&src);
    serde_path_to_error::deserialize(de)
        .map_err(|error| format!("at JSON path {} → {}", error.path(), error.inner()))
}

fn run_case(binder: &Binder, case: &Case) -> Expect {
    let tree = match case.format {
        Format::Xml => PropertyTree::from_xml(&case.source),
        Format::Json => PropertyTree::from_json_str(&case.source),
    };
    let tree = match tree {
        Ok(tree) => tree,
        Err(_) => return Expect::Error("document".to_string()),
    };
    match case.record {
        RecordKind::Library => outcome(binder.parse::<Library>(&tree)),
        RecordKind::Inventory => outcome(binder.parse::<Inventory>(&tree)),
    }
}

fn outcome<R: Record>(result: Result<R, BindError>) -> Expect {
    match result {
        Ok(record) if record.is_valid() => Expect::Valid,
        Ok(_) => Expect::Incomplete,
        Err(BindError::Cardinality { .. }) => Expect::Error("cardinality".to_string()),
        Err(BindError::Conversion { .. }) => Expect::Error("conversion".to_string()),
        Err(other) => Expect::Error(other.to_string()),
    }
}
