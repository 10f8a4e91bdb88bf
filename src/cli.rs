//! Command line front end: bind documents to the catalog records and report,
//! re-emit or archive them.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;
use tree_binding::catalog::{self, Book, Inventory, Item, Library};
use tree_binding::{BindError, BindOptions, Binder, Grid, HeaderIndex, PropertyTree, Record};

use crate::jq_exec::JqSelector;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// bind XML or JSON documents to typed records and check, rewrite or archive them
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// JSON file with binding options (path delimiter, document-root handling, column delimiter)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// bind every document and report validity or the binding error
    Check(BindOut),
    /// bind every document and write it back out through the record
    Write(WriteOut),
    /// bind each data row of a delimited table
    Table(TableOut),
    /// bind every document and print its archive form
    Archive(BindOut),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Xml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RecordKind {
    /// `Library` (XML sample)
    Library,
    /// `Inventory` (JSON sample)
    Inventory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RowKind {
    /// `Item` columns: sku, quantity, price, restocked
    Item,
    /// `Book` columns: title, pages, genre
    Book,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/inventory)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// document format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct BindOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// record type the documents are bound to
    #[arg(long, value_enum)]
    record: RecordKind,
}

#[derive(clap::Parser, Debug)]
struct WriteOut {
    #[command(flatten)]
    bind: BindOut,

    /// output format (input format if omitted)
    #[arg(long, value_enum)]
    to: Option<Format>,

    /// output directory, one file per document (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct TableOut {
    /// delimited text files whose first row names the columns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// record type each data row is bound to
    #[arg(long, value_enum, default_value_t = RowKind::Item)]
    record: RowKind,

    /// cell delimiter (overrides the configured one)
    #[arg(long)]
    delimiter: Option<char>,
}

/// One loaded document, labelled by where it came from.
struct Document {
    label: String,
    tree: PropertyTree,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(String, PropertyTree)) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|error| anyhow!("failed to resolve input file paths: {error}"))?;
        let selector = self.jq_expr.as_deref().map(JqSelector::compile).transpose()?;
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            match self.format {
                Format::Xml => {
                    if self.json_pointer.is_some() || self.jq_expr.is_some() {
                        tracing::warn!(path = %source_path_str, "JSON selectors are ignored for XML input");
                    }
                    let tree = PropertyTree::from_xml(&source)
                        .with_context(|| format!("failed to parse XML source file ({source_path_str})"))?;
                    apply(source_path_str, tree);
                }
                Format::Json => {
                    let values = self.json_documents(&source, &source_path_str, selector.as_ref())?;
                    let many = values.len() > 1;
                    for (index, value) in values.into_iter().enumerate() {
                        let label = if many {
                            format!("{source_path_str}#{index}")
                        } else {
                            source_path_str.clone()
                        };
                        apply(label, PropertyTree::from_json(&value));
                    }
                }
            }
        }
        Ok(())
    }

    fn json_documents(
        &self,
        source: &str,
        source_path_str: &str,
        selector: Option<&JqSelector>,
    ) -> Result<Vec<Value>> {
        let raw: Vec<Value> = if self.ndjson {
            source
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str::<Value>)
                .collect::<Result<_, _>>()
        } else {
            serde_json::from_str::<Value>(source).map(|value| vec![value])
        }
        .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;

        let selected = match self.json_pointer.as_deref() {
            None => raw,
            Some(pointer) => raw
                .iter()
                .map(|value| {
                    value.pointer(pointer).cloned().ok_or_else(|| {
                        anyhow!("JSON pointer {pointer} selects nothing in {source_path_str}")
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        };
        match selector {
            None => Ok(selected),
            Some(selector) => selector.select_all(&selected).with_context(|| {
                format!("failed to apply jq expression to source file ({source_path_str})")
            }),
        }
    }

    fn load_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        self.load_process(|label, tree| documents.push(Document { label, tree }))?;
        tracing::debug!(count = documents.len(), "loaded documents");
        Ok(documents)
    }
}

impl Format {
    fn render(self, tree: &PropertyTree) -> Result<String> {
        match self {
            Format::Json => Ok(serde_json::to_string_pretty(&tree.to_json())?),
            Format::Xml => Ok(tree.to_xml()),
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        let options = match self.config.as_ref() {
            Some(path) => BindOptions::load(path)?,
            None => BindOptions::default(),
        };
        let binder = Binder::new(catalog::registry(), options);
        match &self.cmd {
            Command::Check(target) => match target.record {
                RecordKind::Library => check::<Library>(&binder, target),
                RecordKind::Inventory => check::<Inventory>(&binder, target),
            },
            Command::Write(target) => match target.bind.record {
                RecordKind::Library => write::<Library>(&binder, target),
                RecordKind::Inventory => write::<Inventory>(&binder, target),
            },
            Command::Archive(target) => match target.record {
                RecordKind::Library => archive::<Library>(&binder, target),
                RecordKind::Inventory => archive::<Inventory>(&binder, target),
            },
            Command::Table(target) => match target.record {
                RowKind::Item => table::<Item>(&binder, target),
                RowKind::Book => table::<Book>(&binder, target),
            },
        }
    }
}

fn check<R: Record + Send>(binder: &Binder, target: &BindOut) -> Result<()> {
    let documents = target.input_settings.load_documents()?;
    let results = bind_all::<R>(binder, &documents);
    let mut failed = 0;
    for (document, result) in documents.iter().zip(&results) {
        match result {
            Ok(record) => {
                let mark = if record.is_valid() { "✓".green() } else { "~".yellow() };
                println!(
                    "{mark} {} {}: valid={} leaves={} mandatory={}",
                    R::NAME.bold(),
                    document.label,
                    record.is_valid(),
                    record.is_leaf_valid(),
                    record.is_mandatory_leaf_valid(),
                );
            }
            Err(error) => {
                failed += 1;
                println!("{} {} {}: {error}", "✗".red(), R::NAME.bold(), document.label);
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} documents failed to bind", documents.len());
    }
    Ok(())
}

fn write<R: Record + Send>(binder: &Binder, target: &WriteOut) -> Result<()> {
    let settings = &target.bind.input_settings;
    let format = target.to.unwrap_or(settings.format);
    let documents = settings.load_documents()?;
    let results = bind_all::<R>(binder, &documents);
    if let Some(out) = target.out.as_ref() {
        std::fs::create_dir_all(out)
            .with_context(|| format!("failed to create output directory {}", out.display()))?;
    }
    for (index, (document, result)) in documents.iter().zip(results).enumerate() {
        let record = result.with_context(|| format!("failed to bind {}", document.label))?;
        let rendered = format.render(&binder.write(&record)?)?;
        match target.out.as_ref() {
            Some(out) => {
                let path = output_path(out, &document.label, index, format);
                std::fs::write(&path, rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            None => println!("{rendered}"),
        }
    }
    Ok(())
}

fn archive<R: Record + Send>(binder: &Binder, target: &BindOut) -> Result<()> {
    let documents = target.input_settings.load_documents()?;
    let results = bind_all::<R>(binder, &documents);
    for (document, result) in documents.iter().zip(results) {
        let record = result.with_context(|| format!("failed to bind {}", document.label))?;
        let archive = record.save_archive(binder)?;
        println!("{}", tree_binding::archive::to_json(&archive)?);
    }
    Ok(())
}

fn table<R: Record + Send>(binder: &Binder, target: &TableOut) -> Result<()> {
    let delimiter = target.delimiter.unwrap_or(binder.options().column_delimiter);
    let source_paths = resolve_file_path_patterns(&target.input)
        .map_err(|error| anyhow!("failed to resolve input file paths: {error}"))?;
    for source_path in source_paths {
        let source = std::fs::read_to_string(&source_path)
            .with_context(|| format!("failed to read table {}", source_path.display()))?;
        let grid = Grid::from_delimited(&source, delimiter);
        let (columns, rows) = HeaderIndex::from_grid(&grid);
        let mut out = Vec::new();
        for row in rows {
            let record: R = binder
                .parse_table(&grid, &columns, row..row + 1)
                .with_context(|| format!("{} row {row}", source_path.display()))?;
            out.push(binder.write(&record)?.to_json());
        }
        println!("{}", serde_json::to_string_pretty(&Value::Array(out))?);
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn bind_all<R: Record + Send>(binder: &Binder, documents: &[Document]) -> Vec<Result<R, BindError>> {
    documents
        .par_iter()
        .map(|document| binder.parse::<R>(&document.tree))
        .collect()
}

fn output_path(dir: &Path, label: &str, index: usize, format: Format) -> PathBuf {
    let stem = Path::new(label)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("document-{index}"));
    dir.join(format!("{stem}-{index}.{}", format.extension()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                match entry {
                    Ok(p) => {
                        matched_any = true;
                        out.push(p);
                    }
                    Err(e) => return Err(Box::new(e)),
                }
            }
            if !matched_any {
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
