//! Sample record sets used by the command line tool and the tests.
//!
//! `Library` is read from XML: attributes carry the scalars and nested elements
//! are found by record name. `Inventory` is read from JSON, where nested records
//! are found by key.
use chrono::NaiveDate;

use crate::cardinality::Cardinality;
use crate::composite::Children;
use crate::convert::{ConversionRegistry, Integer, Real};
use crate::field::Field;
use crate::record;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Genre {
    #[default]
    Fiction,
    Poetry,
    Reference,
}

impl Genre {
    pub const TABLE: [(&'static str, Genre); 3] = [
        ("FICTION", Genre::Fiction),
        ("POETRY", Genre::Poetry),
        ("REFERENCE", Genre::Reference),
    ];
}

/// Standard converters plus the catalog's enums.
pub fn registry() -> ConversionRegistry {
    let mut registry = ConversionRegistry::standard();
    registry.register_table(&Genre::TABLE);
    registry
}

record! {
    /// Innermost element: a single book on a shelf.
    pub struct Book as "Book" {
        pub title: Field<String> = "<xmlattr>/title";
        pub pages: Field<u32> = "<xmlattr>/pages";
        pub genre: Field<Genre> = "<xmlattr>/genre", Cardinality::OPTIONAL;
    }
}

record! {
    /// A shelf always holds exactly two books.
    pub struct Shelf as "Shelf" {
        pub number: Field<u32> = "<xmlattr>/number";
        pub books: Children<Book> = "", Cardinality::exactly(2);
    }
}

record! {
    pub struct Library as "Library" {
        pub name: Field<String> = "<xmlattr>/name";
        pub shelves: Children<Shelf> = "";
    }
}

record! {
    pub struct Item as "Item" {
        pub sku: Field<String> = "sku";
        pub quantity: Field<Integer> = "quantity";
        pub price: Field<Real> = "price", Cardinality::OPTIONAL;
        pub restocked: Field<NaiveDate> = "restocked", Cardinality::OPTIONAL;
    }
}

record! {
    pub struct Inventory as "Inventory" {
        pub name: Field<String> = "name";
        pub items: Children<Item> = "items", Cardinality::OPTIONAL;
    }
}
