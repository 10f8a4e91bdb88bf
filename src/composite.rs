//! Composite fields: a single nested record, or an ordered collection of them.
use std::any::{Any, type_name};
use std::ops::Deref;

use crate::archive::{ArchiveEntry, unexpected_entry};
use crate::binder::Binder;
use crate::cardinality::Cardinality;
use crate::error::BindError;
use crate::field::{FieldDescriptor, FieldHeader, FieldKind, same_kind};
use crate::record::Record;
use crate::table::{ColumnResolver, Grid, RowRange};
use crate::tree::Tree;

/// Children are looked up by the field name, or by the element record's
/// name when the field is declared without one.
fn lookup_path<R: Record>(header: &FieldHeader) -> &'static str {
    if header.name.is_empty() { R::NAME } else { header.name }
}

/// Field bound to exactly one nested record.
///
/// Declare it `exactly(1)` (the `record!` default) or optional. A looser
/// cardinality still binds only the first match; use [`Children`] to keep all
/// of them.
#[derive(Debug, Clone)]
pub struct Child<R> {
    header: FieldHeader,
    value: Box<R>,
}

impl<R: Record> Child<R> {
    pub const DEFAULT_REQUIRED: Cardinality = Cardinality::Exactly(1);

    pub fn new(name: &'static str, required: Cardinality) -> Self {
        Self {
            header: FieldHeader::new(name, required, FieldKind::SingleSubrecord),
            value: Box::default(),
        }
    }

    pub fn get(&self) -> Option<&R> {
        self.header.validity.then_some(&*self.value)
    }

    pub fn set(&mut self, record: R) {
        *self.value = record;
        self.header.validity = true;
    }

    pub fn is_valid(&self) -> bool {
        self.header.validity
    }
}

impl<R> Deref for Child<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.value
    }
}

impl<R: Record> FieldDescriptor for Child<R> {
    fn header(&self) -> &FieldHeader {
        &self.header
    }

    fn value(&self) -> &dyn Any {
        &*self.value
    }

    fn value_mut(&mut self) -> &mut dyn Any {
        &mut *self.value
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn field_type_name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn reset(&mut self) {
        self.value.reset();
        self.header.validity = false;
    }

    fn compare(&self, rhs: &dyn FieldDescriptor) -> bool {
        rhs.downcast_ref::<Self>()
            .is_some_and(|rhs| self.value.same_valid_fields(&rhs.value))
    }

    fn copy_from(&mut self, rhs: &dyn FieldDescriptor) -> Result<(), BindError> {
        let rhs = same_kind::<Self>(rhs)?;
        self.value.clone_from(&rhs.value);
        self.header.validity = rhs.header.validity;
        Ok(())
    }

    fn parse_tree(&mut self, tree: &dyn Tree, binder: &Binder) -> Result<(), BindError> {
        self.reset();
        let path = lookup_path::<R>(&self.header);
        let nodes = tree.children_at(path, binder.delimiter());
        tracing::trace!(field = path, matches = nodes.len(), "binding subrecord");
        self.header.check_count(path, nodes.len())?;
        if let Some(node) = nodes.first() {
            self.value.bind_node(*node, binder)?;
            self.header.validity = true;
        }
        Ok(())
    }

    fn parse_table(
        &mut self,
        table: &Grid,
        columns: &dyn ColumnResolver,
        rows: RowRange,
        binder: &Binder,
    ) -> Result<(), BindError> {
        self.reset();
        self.value.parse_table(table, columns, rows, binder)?;
        self.header.validity = self.value.contains_valid_field();
        Ok(())
    }

    fn write_tree(&self, tree: &mut dyn Tree, binder: &Binder) -> Result<(), BindError> {
        if !self.header.validity {
            return Ok(());
        }
        let node = tree.add_child(lookup_path::<R>(&self.header), binder.delimiter());
        self.value.write_node(node, binder)
    }

    fn save(&self, binder: &Binder) -> Result<ArchiveEntry, BindError> {
        Ok(ArchiveEntry::Record {
            valid: self.header.validity,
            fields: self.value.save_fields(binder)?,
        })
    }

    fn load(&mut self, entry: &ArchiveEntry, binder: &Binder) -> Result<(), BindError> {
        let ArchiveEntry::Record { valid, fields } = entry else {
            return Err(unexpected_entry(lookup_path::<R>(&self.header), "record", entry));
        };
        self.reset();
        self.value.load_fields(fields, binder)?;
        self.header.validity = *valid;
        Ok(())
    }
}

/// Repeated-subrecord collection: nested records in document order.
#[derive(Debug, Clone)]
pub struct Children<R> {
    header: FieldHeader,
    items: Vec<R>,
}

impl<R: Record> Children<R> {
    pub const DEFAULT_REQUIRED: Cardinality = Cardinality::MoreThanZero;

    pub fn new(name: &'static str, required: Cardinality) -> Self {
        Self {
            header: FieldHeader::new(name, required, FieldKind::RepeatedSubrecord),
            items: Vec::new(),
        }
    }

    /// Appends a record and marks the collection valid.
    pub fn push(&mut self, record: R) {
        self.items.push(record);
        self.header.validity = true;
    }

    pub fn is_valid(&self) -> bool {
        self.header.validity
    }

    pub fn into_vec(self) -> Vec<R> {
        self.items
    }
}

impl<R> Deref for Children<R> {
    type Target = Vec<R>;

    fn deref(&self) -> &Vec<R> {
        &self.items
    }
}

impl<R: Record> FieldDescriptor for Children<R> {
    fn header(&self) -> &FieldHeader {
        &self.header
    }

    fn value(&self) -> &dyn Any {
        &self.items
    }

    fn value_mut(&mut self) -> &mut dyn Any {
        &mut self.items
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn field_type_name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn reset(&mut self) {
        self.items.clear();
        self.header.validity = false;
    }

    fn compare(&self, rhs: &dyn FieldDescriptor) -> bool {
        rhs.downcast_ref::<Self>().is_some_and(|rhs| {
            self.items.len() == rhs.items.len()
                && self.items.iter().zip(&rhs.items).all(|(a, b)| a.same_valid_fields(b))
        })
    }

    fn copy_from(&mut self, rhs: &dyn FieldDescriptor) -> Result<(), BindError> {
        let rhs = same_kind::<Self>(rhs)?;
        self.items.clone_from(&rhs.items);
        self.header.validity = rhs.header.validity;
        Ok(())
    }

    fn parse_tree(&mut self, tree: &dyn Tree, binder: &Binder) -> Result<(), BindError> {
        self.reset();
        let path = lookup_path::<R>(&self.header);
        let nodes = tree.children_at(path, binder.delimiter());
        tracing::trace!(field = path, matches = nodes.len(), "binding subrecord collection");
        self.header.check_count(path, nodes.len())?;
        for node in nodes {
            let mut item = R::default();
            item.bind_node(node, binder)?;
            self.items.push(item);
        }
        self.header.validity = true;
        Ok(())
    }

    fn parse_table(
        &mut self,
        table: &Grid,
        columns: &dyn ColumnResolver,
        rows: RowRange,
        binder: &Binder,
    ) -> Result<(), BindError> {
        self.reset();
        let end = rows.end.min(table.row_count());
        let rows = rows.start.min(end)..end;
        self.header.check_count(lookup_path::<R>(&self.header), rows.len())?;
        for row in rows {
            let mut item = R::default();
            item.parse_table(table, columns, row..row + 1, binder)?;
            self.items.push(item);
        }
        self.header.validity = true;
        Ok(())
    }

    fn write_tree(&self, tree: &mut dyn Tree, binder: &Binder) -> Result<(), BindError> {
        if !self.header.validity {
            return Ok(());
        }
        let path = lookup_path::<R>(&self.header);
        for item in &self.items {
            let node = tree.add_child(path, binder.delimiter());
            item.write_node(node, binder)?;
        }
        Ok(())
    }

    fn save(&self, binder: &Binder) -> Result<ArchiveEntry, BindError> {
        let items = self
            .items
            .iter()
            .map(|item| item.save_fields(binder))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ArchiveEntry::Records { valid: self.header.validity, items })
    }

    fn load(&mut self, entry: &ArchiveEntry, binder: &Binder) -> Result<(), BindError> {
        let ArchiveEntry::Records { valid, items } = entry else {
            return Err(unexpected_entry(lookup_path::<R>(&self.header), "records", entry));
        };
        self.reset();
        for fields in items {
            let mut item = R::default();
            item.load_fields(fields, binder)?;
            self.items.push(item);
        }
        self.header.validity = *valid;
        Ok(())
    }
}
