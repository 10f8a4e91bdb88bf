//! The binding context passed to every parse, write and archive pass.
use crate::config::BindOptions;
use crate::convert::ConversionRegistry;
use crate::error::BindError;
use crate::record::Record;
use crate::table::{ColumnResolver, Grid, RowRange};
use crate::tree::{PropertyTree, Tree};

/// Conversion registry plus binding options.
///
/// Immutable once built, so one binder can serve many documents in parallel.
#[derive(Debug, Default)]
pub struct Binder {
    registry: ConversionRegistry,
    options: BindOptions,
}

impl Binder {
    pub fn new(registry: ConversionRegistry, options: BindOptions) -> Self {
        Self { registry, options }
    }

    /// Standard converters with default options.
    pub fn standard() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    pub fn delimiter(&self) -> char {
        self.options.path_delimiter
    }

    /// A fresh `R` bound from `tree`.
    pub fn parse<R: Record>(&self, tree: &dyn Tree) -> Result<R, BindError> {
        let mut record = R::default();
        record.parse_tree(tree, self)?;
        Ok(record)
    }

    /// A fresh `R` bound from `rows` of `table`.
    pub fn parse_table<R: Record>(
        &self,
        table: &Grid,
        columns: &dyn ColumnResolver,
        rows: RowRange,
    ) -> Result<R, BindError> {
        tracing::debug!(record = R::NAME, ?rows, "binding record from table");
        let mut record = R::default();
        record.parse_table(table, columns, rows, self)?;
        Ok(record)
    }

    /// `record` written into a new document.
    pub fn write<R: Record>(&self, record: &R) -> Result<PropertyTree, BindError> {
        let mut document = PropertyTree::document();
        record.write_tree(&mut document, self)?;
        Ok(document)
    }
}
