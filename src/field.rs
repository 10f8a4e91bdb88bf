//! Field descriptors: the type-erased capability set every record field offers,
//! and the leaf field that binds a single convertible value.
//!
//! Composite fields live in [`crate::composite`]. A record exposes its fields as
//! an ordered directory of `&dyn FieldDescriptor`, which is what the whole-record
//! passes walk.
use std::any::{Any, type_name};
use std::fmt;
use std::ops::Deref;

use crate::archive::{ArchiveEntry, unexpected_entry};
use crate::binder::Binder;
use crate::cardinality::Cardinality;
use crate::error::BindError;
use crate::table::{ColumnResolver, Grid, RowRange};
use crate::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Leaf,
    SingleSubrecord,
    RepeatedSubrecord,
}

/// Fixed part shared by every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub name: &'static str,
    pub required: Cardinality,
    /// Set by a successful parse or an explicit assignment, cleared by reset.
    pub validity: bool,
    pub kind: FieldKind,
}

impl FieldHeader {
    pub const fn new(name: &'static str, required: Cardinality, kind: FieldKind) -> Self {
        Self { name, required, validity: false, kind }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == FieldKind::Leaf
    }

    /// Fails unless `actual` matches at `path` satisfy the required cardinality.
    pub fn check_count(&self, path: &'static str, actual: usize) -> Result<(), BindError> {
        if self.required.admits(actual) {
            return Ok(());
        }
        Err(BindError::Cardinality { field: path, required: self.required, actual })
    }
}

/// Capability set of a declared field, independent of its value type.
pub trait FieldDescriptor: fmt::Debug + 'static {
    fn header(&self) -> &FieldHeader;

    /// Opaque handle to the owned value.
    fn value(&self) -> &dyn Any;
    fn value_mut(&mut self) -> &mut dyn Any;

    fn as_any(&self) -> &dyn Any;

    /// Concrete field type, used in mismatch errors.
    fn field_type_name(&self) -> &'static str;

    /// Clears validity and restores the default value.
    fn reset(&mut self);

    /// Value equality against a field of the same concrete type.
    fn compare(&self, rhs: &dyn FieldDescriptor) -> bool;

    /// Copies value and validity from a field of the same concrete type.
    fn copy_from(&mut self, rhs: &dyn FieldDescriptor) -> Result<(), BindError>;

    fn parse_tree(&mut self, tree: &dyn Tree, binder: &Binder) -> Result<(), BindError>;

    fn parse_table(
        &mut self,
        table: &Grid,
        columns: &dyn ColumnResolver,
        rows: RowRange,
        binder: &Binder,
    ) -> Result<(), BindError>;

    /// Writes the value below `tree`; invalid fields write nothing.
    fn write_tree(&self, tree: &mut dyn Tree, binder: &Binder) -> Result<(), BindError>;

    fn save(&self, binder: &Binder) -> Result<ArchiveEntry, BindError>;
    fn load(&mut self, entry: &ArchiveEntry, binder: &Binder) -> Result<(), BindError>;

    fn name(&self) -> &'static str {
        self.header().name
    }

    fn validity(&self) -> bool {
        self.header().validity
    }

    fn is_leaf(&self) -> bool {
        self.header().is_leaf()
    }

    fn required(&self) -> Cardinality {
        self.header().required
    }

    /// Equality with the unset-field wildcard: if either side is invalid the
    /// fields match regardless of content.
    fn matches(&self, rhs: &dyn FieldDescriptor) -> bool {
        if !self.validity() || !rhs.validity() {
            return true;
        }
        self.compare(rhs)
    }
}

impl<'a> dyn FieldDescriptor + 'a {
    pub fn downcast_ref<F: FieldDescriptor>(&self) -> Option<&F> {
        self.as_any().downcast_ref::<F>()
    }
}

/// `rhs` as the concrete field type `F`, or a type mismatch.
pub(crate) fn same_kind<'r, F: FieldDescriptor>(
    rhs: &'r dyn FieldDescriptor,
) -> Result<&'r F, BindError> {
    rhs.as_any().downcast_ref::<F>().ok_or(BindError::TypeMismatch {
        expected: type_name::<F>(),
        found: rhs.field_type_name(),
    })
}

// ——————————————————————————————————————————————————————————————————————————
// LEAF FIELD
// ——————————————————————————————————————————————————————————————————————————

/// Value types a [`Field`] can hold. Converters are looked up in the binder's registry.
pub trait LeafValue: Clone + Default + PartialEq + fmt::Debug + 'static {}

impl<T> LeafValue for T where T: Clone + Default + PartialEq + fmt::Debug + 'static {}

/// Leaf field owning one separately allocated value.
///
/// Only the first match is bound; the cardinality still counts every match.
#[derive(Debug, Clone)]
pub struct Field<T> {
    header: FieldHeader,
    value: Box<T>,
}

impl<T: LeafValue> Field<T> {
    /// Cardinality used by `record!` when none is given.
    pub const DEFAULT_REQUIRED: Cardinality = Cardinality::MoreThanZero;

    pub fn new(name: &'static str, required: Cardinality) -> Self {
        Self {
            header: FieldHeader::new(name, required, FieldKind::Leaf),
            value: Box::default(),
        }
    }

    /// The value if the field is valid.
    pub fn get(&self) -> Option<&T> {
        self.header.validity.then_some(&*self.value)
    }

    /// Assigns the value and marks the field valid.
    pub fn set(&mut self, value: T) {
        *self.value = value;
        self.header.validity = true;
    }

    pub fn is_valid(&self) -> bool {
        self.header.validity
    }

    fn bind_text(&mut self, text: &str, binder: &Binder) -> Result<(), BindError> {
        let value = binder
            .registry()
            .from_text::<T>(text)
            .map_err(|source| BindError::conversion(self.header.name, source))?;
        self.set(value);
        Ok(())
    }

    fn render(&self, binder: &Binder) -> Result<String, BindError> {
        binder
            .registry()
            .to_text::<T>(&self.value)
            .map_err(|source| BindError::conversion(self.header.name, source))
    }
}

impl<T> Deref for Field<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: LeafValue> FieldDescriptor for Field<T> {
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
        *self.value = T::default();
        self.header.validity = false;
    }

    fn compare(&self, rhs: &dyn FieldDescriptor) -> bool {
        rhs.downcast_ref::<Self>().is_some_and(|rhs| self.value == rhs.value)
    }

    fn copy_from(&mut self, rhs: &dyn FieldDescriptor) -> Result<(), BindError> {
        let rhs = same_kind::<Self>(rhs)?;
        self.value.clone_from(&rhs.value);
        self.header.validity = rhs.header.validity;
        Ok(())
    }

    fn parse_tree(&mut self, tree: &dyn Tree, binder: &Binder) -> Result<(), BindError> {
        self.reset();
        let name = self.header.name;
        let nodes = tree.children_at(name, binder.delimiter());
        tracing::trace!(field = name, matches = nodes.len(), "binding leaf");
        self.header.check_count(name, nodes.len())?;
        match nodes.first() {
            Some(node) => self.bind_text(node.value(), binder),
            None => Ok(()),
        }
    }

    fn parse_table(
        &mut self,
        table: &Grid,
        columns: &dyn ColumnResolver,
        rows: RowRange,
        binder: &Binder,
    ) -> Result<(), BindError> {
        self.reset();
        let name = self.header.name;
        let cells = match columns.column(name) {
            Some(column) => table.column_values(column, rows),
            None => Vec::new(),
        };
        tracing::trace!(field = name, matches = cells.len(), "binding leaf from table");
        self.header.check_count(name, cells.len())?;
        match cells.first() {
            Some(text) => self.bind_text(text, binder),
            None => Ok(()),
        }
    }

    fn write_tree(&self, tree: &mut dyn Tree, binder: &Binder) -> Result<(), BindError> {
        if !self.header.validity {
            return Ok(());
        }
        let text = self.render(binder)?;
        tree.put_value(self.header.name, binder.delimiter(), text);
        Ok(())
    }

    fn save(&self, binder: &Binder) -> Result<ArchiveEntry, BindError> {
        let text = if self.header.validity { Some(self.render(binder)?) } else { None };
        Ok(ArchiveEntry::Leaf { valid: self.header.validity, text })
    }

    fn load(&mut self, entry: &ArchiveEntry, binder: &Binder) -> Result<(), BindError> {
        let ArchiveEntry::Leaf { valid, text } = entry else {
            return Err(unexpected_entry(self.header.name, "leaf", entry));
        };
        self.reset();
        if let Some(text) = text {
            self.bind_text(text, binder)?;
        }
        self.header.validity = *valid && text.is_some();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::PropertyTree;
    use pretty_assertions::assert_eq;

    fn node(pairs: &[(&str, &str)]) -> PropertyTree {
        let mut tree = PropertyTree::new();
        for (name, value) in pairs {
            tree.push_child(*name, PropertyTree::with_data(*value));
        }
        tree
    }

    #[test]
    fn leaf_binds_first_match() {
        let binder = Binder::standard();
        let mut field = Field::<i64>::new("n", Cardinality::MANDATORY);
        field.parse_tree(&node(&[("n", "4"), ("n", "5")]), &binder).unwrap();
        assert_eq!(field.get(), Some(&4));
    }

    #[test]
    fn exact_count_is_enforced() {
        let binder = Binder::standard();
        let mut field = Field::<String>::new("s", Cardinality::exactly(2));
        let err = field.parse_tree(&node(&[("s", "a")]), &binder).unwrap_err();
        assert_eq!(
            err,
            BindError::Cardinality { field: "s", required: Cardinality::exactly(2), actual: 1 }
        );
        assert!(!field.is_valid());
        field.parse_tree(&node(&[("s", "a"), ("s", "b")]), &binder).unwrap();
        assert_eq!(field.get().map(String::as_str), Some("a"));
    }

    #[test]
    fn optional_miss_leaves_field_invalid() {
        let binder = Binder::standard();
        let mut field = Field::<i64>::new("n", Cardinality::OPTIONAL);
        field.set(3);
        field.parse_tree(&node(&[]), &binder).unwrap();
        assert!(!field.is_valid());
        assert_eq!(*field, 0);
    }

    #[test]
    fn conversion_errors_name_the_field() {
        let binder = Binder::standard();
        let mut field = Field::<i64>::new("n", Cardinality::MANDATORY);
        let err = field.parse_tree(&node(&[("n", "-4")]), &binder).unwrap_err();
        assert!(matches!(err, BindError::Conversion { field: "n", .. }), "{err}");
        assert!(!field.is_valid());
    }

    #[test]
    fn wildcard_equality_ignores_unset_sides() {
        let mut a = Field::<i64>::new("n", Cardinality::MANDATORY);
        let mut b = Field::<i64>::new("n", Cardinality::MANDATORY);
        a.set(1);
        assert!(a.matches(&b));
        b.set(2);
        assert!(!a.matches(&b));
        b.set(1);
        assert!(a.matches(&b));
    }

    #[test]
    fn copy_requires_the_same_field_type() {
        let mut target = Field::<i64>::new("n", Cardinality::MANDATORY);
        let mut source = Field::<i64>::new("m", Cardinality::OPTIONAL);
        source.set(9);
        target.copy_from(&source).unwrap();
        assert_eq!(target.get(), Some(&9));

        let other = Field::<String>::new("s", Cardinality::MANDATORY);
        let err = target.copy_from(&other).unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { .. }));
        assert_eq!(target.get(), Some(&9));
    }

    #[test]
    fn write_skips_invalid_fields() {
        let binder = Binder::standard();
        let mut tree = PropertyTree::new();
        let mut field = Field::<u32>::new("<xmlattr>/n", Cardinality::MANDATORY);
        field.write_tree(&mut tree, &binder).unwrap();
        assert!(tree.is_empty());
        field.set(12);
        field.write_tree(&mut tree, &binder).unwrap();
        assert_eq!(tree.get_child("<xmlattr>/n").map(PropertyTree::data), Some("12"));
    }

    #[test]
    fn table_cells_bind_like_tree_matches() {
        let binder = Binder::standard();
        let grid = Grid::from_delimited("n,s\n1,\n2,x\n", ',');
        let columns = |name: &str| match name {
            "n" => Some(0_usize),
            "s" => Some(1),
            _ => None,
        };
        let mut n = Field::<i64>::new("n", Cardinality::exactly(2));
        n.parse_table(&grid, &columns, 1..3, &binder).unwrap();
        assert_eq!(n.get(), Some(&1));

        let mut s = Field::<String>::new("s", Cardinality::exactly(2));
        let err = s.parse_table(&grid, &columns, 1..3, &binder).unwrap_err();
        assert!(matches!(err, BindError::Cardinality { actual: 1, .. }));

        let mut missing = Field::<String>::new("missing", Cardinality::OPTIONAL);
        missing.parse_table(&grid, &columns, 1..3, &binder).unwrap();
        assert!(!missing.is_valid());
    }
}
