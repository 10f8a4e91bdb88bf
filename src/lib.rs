//! Declarative binding between typed records and hierarchical trees or tables.
//!
//! A record type lists its fields once (name, value type, required number of
//! matches). Every field is a [`FieldDescriptor`], so parsing, writing,
//! comparing, copying and archiving walk the record's [`Directory`] uniformly.
//!
//! ```
//! use tree_binding::{Binder, Cardinality, Children, Field, PropertyTree, record};
//!
//! record! {
//!     pub struct Leaf as "Leaf" {
//!         pub id: Field<u32> = "<xmlattr>/id";
//!     }
//! }
//!
//! record! {
//!     pub struct Root as "Root" {
//!         pub label: Field<String> = "<xmlattr>/label", Cardinality::OPTIONAL;
//!         pub leaves: Children<Leaf> = "";
//!     }
//! }
//!
//! let document = PropertyTree::from_xml(r#"<Root><Leaf id="1"/><Leaf id="2"/></Root>"#).unwrap();
//! let root: Root = Binder::standard().parse(&document).unwrap();
//! assert!(!root.label.is_valid());
//! assert_eq!(root.leaves.iter().map(|leaf| *leaf.id).collect::<Vec<_>>(), vec![1, 2]);
//! ```
pub mod archive;
pub mod binder;
pub mod cardinality;
pub mod catalog;
pub mod composite;
pub mod config;
pub mod convert;
pub mod error;
pub mod field;
pub mod json;
pub mod path_de;
pub mod record;
pub mod table;
pub mod tree;
pub mod xml;

pub use archive::{ArchiveDocument, ArchiveEntry};
pub use binder::Binder;
pub use cardinality::Cardinality;
pub use composite::{Child, Children};
pub use config::{BindOptions, ConfigError};
pub use convert::{ConversionRegistry, Integer, Real};
pub use error::{BindError, ConversionError, DocumentError, ParseError};
pub use field::{Field, FieldDescriptor, FieldHeader, FieldKind, LeafValue};
pub use record::{Directory, DirectoryMut, Record};
pub use table::{ColumnResolver, Grid, HeaderIndex, RowRange};
pub use tree::{PropertyTree, Tree};
