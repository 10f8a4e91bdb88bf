//! Records: fixed, ordered sets of fields bound to one structured node type.
//!
//! A record hands out its fields as a [`Directory`], an ordered list of field
//! handles in declaration order. Every whole-record pass (parse, write, reset,
//! compare, copy, archive) walks that directory through the
//! [`FieldDescriptor`] capability set, so it never needs the concrete field types.
//!
//! Records are usually declared with [`record!`](crate::record!).
use std::any::Any;
use std::fmt;
use std::ops::Index;

use crate::archive::{ArchiveDocument, ArchiveEntry};
use crate::binder::Binder;
use crate::error::BindError;
use crate::field::FieldDescriptor;
use crate::table::{ColumnResolver, Grid, RowRange};
use crate::tree::Tree;

// ——————————————————————————————————————————————————————————————————————————
// FIELD DIRECTORY
// ——————————————————————————————————————————————————————————————————————————

/// Ordered, read-only view of a record's fields.
#[derive(Debug)]
pub struct Directory<'a> {
    fields: Vec<&'a dyn FieldDescriptor>,
}

impl<'a> Directory<'a> {
    pub fn new(fields: Vec<&'a dyn FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a dyn FieldDescriptor> {
        self.fields.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a dyn FieldDescriptor> + '_ {
        self.fields.iter().copied()
    }
}

impl<'a> Index<usize> for Directory<'a> {
    type Output = dyn FieldDescriptor;

    fn index(&self, index: usize) -> &Self::Output {
        self.fields[index]
    }
}

impl<'a> IntoIterator for Directory<'a> {
    type Item = &'a dyn FieldDescriptor;
    type IntoIter = std::vec::IntoIter<&'a dyn FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Ordered, mutable view of a record's fields.
#[derive(Debug)]
pub struct DirectoryMut<'a> {
    fields: Vec<&'a mut dyn FieldDescriptor>,
}

impl<'a> DirectoryMut<'a> {
    pub fn new(fields: Vec<&'a mut dyn FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut dyn FieldDescriptor> {
        self.fields.get_mut(index).map(|field| &mut **field)
    }
}

impl<'a> IntoIterator for DirectoryMut<'a> {
    type Item = &'a mut dyn FieldDescriptor;
    type IntoIter = std::vec::IntoIter<&'a mut dyn FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

// ——————————————————————————————————————————————————————————————————————————
// RECORD
// ——————————————————————————————————————————————————————————————————————————

pub trait Record: Default + Clone + fmt::Debug + 'static {
    /// Node name of this record type in a document.
    const NAME: &'static str;

    fn fields(&self) -> Directory<'_>;
    fn fields_mut(&mut self) -> DirectoryMut<'_>;

    fn len(&self) -> usize {
        self.fields().len()
    }

    fn field(&self, index: usize) -> Option<&dyn FieldDescriptor> {
        self.fields().get(index)
    }

    fn field_named(&self, name: &str) -> Option<&dyn FieldDescriptor> {
        self.fields().into_iter().find(|field| field.name() == name)
    }

    /// Owned value of the field at `index`, if it holds a `T`.
    fn value<T: Any>(&self, index: usize) -> Option<&T> {
        self.field(index)?.value().downcast_ref::<T>()
    }

    /// Name of the first declared field.
    fn key_field_name(&self) -> Option<&'static str> {
        self.field(0).map(|field| field.name())
    }

    /// Binds every field from `tree`, in declaration order.
    ///
    /// Stops at the first failing field. Fields bound before the failure keep
    /// their values, so a record from a failed parse should be discarded.
    fn parse_tree(&mut self, tree: &dyn Tree, binder: &Binder) -> Result<(), BindError> {
        let node = if binder.options().unwrap_document_root && tree.is_document_root() {
            tree.document_element().unwrap_or(tree)
        } else {
            tree
        };
        self.bind_node(node, binder)?;
        tracing::debug!(record = Self::NAME, valid = self.is_valid(), "parsed record");
        Ok(())
    }

    /// Binds every field from `node` without document-root handling.
    fn bind_node(&mut self, node: &dyn Tree, binder: &Binder) -> Result<(), BindError> {
        for field in self.fields_mut() {
            field.parse_tree(node, binder)?;
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
        for field in self.fields_mut() {
            field.parse_table(table, columns, rows.clone(), binder)?;
        }
        Ok(())
    }

    /// Writes valid fields below `tree`. A document root first gets this
    /// record's own element.
    fn write_tree(&self, tree: &mut dyn Tree, binder: &Binder) -> Result<(), BindError> {
        if binder.options().unwrap_document_root && tree.is_document_root() {
            let node = tree.add_child(Self::NAME, binder.delimiter());
            return self.write_node(node, binder);
        }
        self.write_node(tree, binder)
    }

    fn write_node(&self, node: &mut dyn Tree, binder: &Binder) -> Result<(), BindError> {
        for field in self.fields() {
            field.write_tree(node, binder)?;
        }
        tracing::debug!(record = Self::NAME, "wrote record");
        Ok(())
    }

    fn reset(&mut self) {
        for field in self.fields_mut() {
            field.reset();
        }
    }

    fn is_valid(&self) -> bool {
        self.fields().iter().all(|field| field.validity())
    }

    fn contains_valid_field(&self) -> bool {
        self.fields().iter().any(|field| field.validity())
    }

    /// Composite fields are ignored.
    fn is_leaf_valid(&self) -> bool {
        self.fields()
            .iter()
            .filter(|field| field.is_leaf())
            .all(|field| field.validity())
    }

    /// Only leaves whose cardinality is not optional are checked.
    fn is_mandatory_leaf_valid(&self) -> bool {
        self.fields()
            .iter()
            .filter(|field| field.is_leaf() && !field.required().is_optional())
            .all(|field| field.validity())
    }

    /// Field-wise equality where an unset field on either side matches anything.
    fn same_valid_fields(&self, other: &Self) -> bool {
        self.fields()
            .iter()
            .zip(other.fields().iter())
            .all(|(lhs, rhs)| lhs.matches(rhs))
    }

    /// Overwrites every leaf field with the one at the same position in
    /// `source`. Composite fields are left untouched.
    fn copy_leaf_fields(&mut self, source: &Self) -> Result<(), BindError> {
        let sources = source.fields();
        for (target, origin) in self.fields_mut().into_iter().zip(sources.iter()) {
            if origin.is_leaf() {
                target.copy_from(origin)?;
            }
        }
        Ok(())
    }

    /// Copies the field called `name` from `source`.
    fn copy_field_named(&mut self, source: &Self, name: &str) -> Result<(), BindError> {
        let not_found = || BindError::NotFound { record: Self::NAME, lookup: format!("name `{name}`") };
        let origin = source.field_named(name).ok_or_else(not_found)?;
        let target = self
            .fields_mut()
            .into_iter()
            .find(|field| field.name() == name)
            .ok_or_else(not_found)?;
        target.copy_from(origin)
    }

    /// First field whose concrete type equals `template`'s.
    ///
    /// Only meaningful when no two fields of this record share a type; prefer
    /// [`Record::field_named`] or [`Record::field`].
    fn find_field_by_runtime_type(
        &self,
        template: &dyn FieldDescriptor,
    ) -> Result<&dyn FieldDescriptor, BindError> {
        let wanted = Any::type_id(template.as_any());
        self.fields()
            .into_iter()
            .find(|field| Any::type_id(field.as_any()) == wanted)
            .ok_or_else(|| BindError::NotFound {
                record: Self::NAME,
                lookup: format!("type `{}`", template.field_type_name()),
            })
    }

    fn save_fields(&self, binder: &Binder) -> Result<Vec<ArchiveEntry>, BindError> {
        self.fields().iter().map(|field| field.save(binder)).collect()
    }

    fn load_fields(&mut self, entries: &[ArchiveEntry], binder: &Binder) -> Result<(), BindError> {
        let mut fields = self.fields_mut();
        if fields.len() != entries.len() {
            return Err(BindError::Archive(format!(
                "record `{}` has {} fields, archive holds {}",
                Self::NAME,
                fields.len(),
                entries.len()
            )));
        }
        for (index, entry) in entries.iter().enumerate() {
            if let Some(field) = fields.get_mut(index) {
                field.load(entry, binder)?;
            }
        }
        Ok(())
    }

    fn save_archive(&self, binder: &Binder) -> Result<ArchiveDocument, BindError> {
        Ok(ArchiveDocument { record: Self::NAME.to_string(), fields: self.save_fields(binder)? })
    }

    fn load_archive(&mut self, document: &ArchiveDocument, binder: &Binder) -> Result<(), BindError> {
        if document.record != Self::NAME {
            return Err(BindError::Archive(format!(
                "expected record `{}`, archive holds `{}`",
                Self::NAME,
                document.record
            )));
        }
        self.load_fields(&document.fields, binder)
    }
}

/// Declares a record type: the struct, its field names and cardinalities, the
/// [`Record`] directory and wildcard `PartialEq`.
///
/// Fields without an explicit cardinality take their type's `DEFAULT_REQUIRED`:
/// one or more for leaves and collections, exactly one for a [`Child`](crate::Child).
///
/// ```
/// use tree_binding::{Cardinality, Children, Field, record};
///
/// record! {
///     pub struct Track as "Track" {
///         pub title: Field<String> = "<xmlattr>/title";
///         pub seconds: Field<u32> = "<xmlattr>/seconds", Cardinality::OPTIONAL;
///     }
/// }
///
/// record! {
///     pub struct Album as "Album" {
///         pub name: Field<String> = "<xmlattr>/name";
///         pub tracks: Children<Track> = "";
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (@required $field_ty:ty, $required:expr) => {
        $required
    };
    (@required $field_ty:ty) => {
        <$field_ty>::DEFAULT_REQUIRED
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $ty:ident as $node:literal {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty = $name:literal $(, $required:expr)?
            );* $(;)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $ty {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl ::core::default::Default for $ty {
            fn default() -> Self {
                Self {
                    $( $field: <$field_ty>::new($name, $crate::record!(@required $field_ty $(, $required)?)), )*
                }
            }
        }

        impl $crate::Record for $ty {
            const NAME: &'static str = $node;

            fn fields(&self) -> $crate::Directory<'_> {
                $crate::Directory::new(::std::vec![
                    $( &self.$field as &dyn $crate::FieldDescriptor, )*
                ])
            }

            fn fields_mut(&mut self) -> $crate::DirectoryMut<'_> {
                $crate::DirectoryMut::new(::std::vec![
                    $( &mut self.$field as &mut dyn $crate::FieldDescriptor, )*
                ])
            }
        }

        impl ::core::cmp::PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::Record::same_valid_fields(self, other)
            }
        }
    };
}
