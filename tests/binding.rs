use pretty_assertions::assert_eq;
use tree_binding::catalog::{self, Book, Genre, Inventory, Item, Library, Shelf};
use tree_binding::{
    BindError, BindOptions, Binder, Cardinality, Child, Children, Field, FieldDescriptor,
    PropertyTree, Real, Record, Tree, record,
};

const NESTED_XML: &str = r#"
<RootElement StringAttrName="StringValue">
    <NestedElement IntegerAttrName="22">
        <MostNestedElement StringAttrName="StringValue1" IntegerAttrName="1" EnumAttrName="ENUM2"/>
        <MostNestedElement StringAttrName="StringValue5" IntegerAttrName="11"/>
    </NestedElement>
</RootElement>
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Level {
    #[default]
    One,
    Two,
    Three,
}

record! {
    struct MostNested as "MostNestedElement" {
        text: Field<String> = "<xmlattr>/StringAttrName";
        number: Field<i32> = "<xmlattr>/IntegerAttrName";
        level: Field<Level> = "<xmlattr>/EnumAttrName", Cardinality::OPTIONAL;
    }
}

record! {
    struct Nested as "NestedElement" {
        number: Field<i32> = "<xmlattr>/IntegerAttrName";
        children: Children<MostNested> = "", Cardinality::exactly(2);
    }
}

record! {
    struct RootElement as "RootElement" {
        text: Field<String> = "<xmlattr>/StringAttrName";
        children: Children<Nested> = "";
    }
}

fn nested_binder() -> Binder {
    let mut registry = tree_binding::ConversionRegistry::standard();
    registry.register_table(&[("ENUM1", Level::One), ("ENUM2", Level::Two), ("ENUM3", Level::Three)]);
    Binder::new(registry, BindOptions::default())
}

fn library_binder() -> Binder {
    Binder::new(catalog::registry(), BindOptions::default())
}

fn book(title: &str, pages: u32, genre: Option<Genre>) -> Book {
    let mut book = Book::default();
    book.title.set(title.to_string());
    book.pages.set(pages);
    if let Some(genre) = genre {
        book.genre.set(genre);
    }
    book
}

fn sample_library() -> Library {
    let mut shelf = Shelf::default();
    shelf.number.set(4);
    shelf.books.push(book("Dune", 412, Some(Genre::Fiction)));
    shelf.books.push(book("Odes", 96, None));
    let mut library = Library::default();
    library.name.set("Central".to_string());
    library.shelves.push(shelf);
    library
}

fn most_nested(text: &str, number: i32, level: Option<Level>) -> MostNested {
    let mut element = MostNested::default();
    element.text.set(text.to_string());
    element.number.set(number);
    if let Some(level) = level {
        element.level.set(level);
    }
    element
}

#[test]
fn nested_xml_binds_every_level() {
    let binder = nested_binder();
    let document = PropertyTree::from_xml(NESTED_XML).unwrap();
    let root: RootElement = binder.parse(&document).unwrap();

    let expected = |last_number: i32| {
        let mut nested = Nested::default();
        nested.number.set(22);
        nested.children.push(most_nested("StringValue1", 1, Some(Level::Two)));
        nested.children.push(most_nested("StringValue5", last_number, None));
        let mut root = RootElement::default();
        root.text.set("StringValue".to_string());
        root.children.push(nested);
        root
    };
    assert_eq!(root, expected(11));
    assert!(root != expected(12));

    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].children.len(), 2);
    let first = &root.children[0].children[0];
    let second = &root.children[0].children[1];
    assert_eq!(first.level.get(), Some(&Level::Two));
    assert!(!second.level.is_valid());
    assert!(!second.is_valid());
    assert!(second.is_mandatory_leaf_valid());
}

#[test]
fn exact_cardinality_rejects_one_more_and_one_less() {
    let binder = nested_binder();
    let element = r#"<MostNestedElement StringAttrName="s" IntegerAttrName="1"/>"#;
    for count in [1, 3] {
        let xml = format!(
            r#"<RootElement StringAttrName="x"><NestedElement IntegerAttrName="1">{}</NestedElement></RootElement>"#,
            element.repeat(count)
        );
        let document = PropertyTree::from_xml(&xml).unwrap();
        let err = binder.parse::<RootElement>(&document).unwrap_err();
        assert_eq!(
            err,
            BindError::Cardinality {
                field: "MostNestedElement",
                required: Cardinality::exactly(2),
                actual: count,
            }
        );
        assert_eq!(
            err.to_string(),
            format!(
                "invalid number of children in node `MostNestedElement`: required 2, present {count}"
            )
        );
    }
}

#[test]
fn mandatory_collections_need_at_least_one_element() {
    let binder = nested_binder();
    let document = PropertyTree::from_xml(r#"<RootElement StringAttrName="x"/>"#).unwrap();
    let err = binder.parse::<RootElement>(&document).unwrap_err();
    assert!(err.to_string().contains("required more than 0, present 0"), "{err}");
}

#[test]
fn conversion_failures_name_the_field() {
    let binder = nested_binder();
    let xml = NESTED_XML.replace(r#"IntegerAttrName="22""#, r#"IntegerAttrName="-22""#);
    let document = PropertyTree::from_xml(&xml).unwrap();
    let err = binder.parse::<RootElement>(&document).unwrap_err();
    assert!(
        matches!(err, BindError::Conversion { field: "<xmlattr>/IntegerAttrName", .. }),
        "{err}"
    );
}

#[test]
fn write_then_parse_is_equal_and_stable() {
    let binder = library_binder();
    let library = sample_library();

    let document = binder.write(&library).unwrap();
    let xml = document.to_xml();
    let reparsed: Library = binder.parse(&PropertyTree::from_xml(&xml).unwrap()).unwrap();
    assert_eq!(reparsed, library);
    assert_eq!(binder.write(&reparsed).unwrap(), document);
    assert!(xml.contains(r#"<Book title="Odes" pages="96"/>"#), "{xml}");
}

#[test]
fn unset_fields_match_anything() {
    let mut lhs = book("Dune", 412, Some(Genre::Fiction));
    let rhs = book("Dune", 412, None);
    assert_eq!(lhs, rhs);
    assert_eq!(rhs, lhs);
    lhs.pages.set(413);
    assert!(lhs != rhs);

    let mut blank = Book::default();
    blank.reset();
    assert_eq!(blank, lhs);
}

#[test]
fn reset_restores_defaults_recursively() {
    let mut library = sample_library();
    library.reset();
    assert!(!library.contains_valid_field());
    assert!(library.shelves.is_empty());
    assert_eq!(library.name.as_str(), "");
    assert!(library.name.get().is_none());
}

#[test]
fn copy_leaf_fields_keeps_composites() {
    let source = sample_library();
    let mut target = Library::default();
    target.copy_leaf_fields(&source).unwrap();
    assert_eq!(target.name.get().map(String::as_str), Some("Central"));
    assert!(!target.shelves.is_valid());
    assert!(target.shelves.is_empty());

    target.copy_field_named(&source, "").unwrap();
    assert_eq!(target.shelves.len(), 1);
}

#[test]
fn copy_leaf_fields_overwrites_leaves_of_a_populated_target() {
    let mut source = sample_library();
    source.name.set("Annex".to_string());
    source.shelves.reset();
    let mut target = sample_library();
    target.name.reset();
    target.copy_leaf_fields(&source).unwrap();
    assert_eq!(target.name.get().map(String::as_str), Some("Annex"));
    assert_eq!(target.shelves.len(), 1);
    assert_eq!(*target.shelves[0].number, 4);
}

record! {
    struct Notes as "Notes" {
        first: Field<String> = "first", Cardinality::OPTIONAL;
        second: Field<u32> = "second", Cardinality::OPTIONAL;
    }
}

#[test]
fn optional_leaves_without_matches() {
    let binder = Binder::standard();
    let notes: Notes = binder.parse(&PropertyTree::from_json_str("{}").unwrap()).unwrap();
    assert!(!notes.first.is_valid());
    assert!(!notes.is_leaf_valid());
    assert!(notes.is_mandatory_leaf_valid());
    assert!(!notes.is_valid());
}

#[test]
fn copy_between_different_field_types_is_a_mismatch() {
    let mut target = Field::<String>::new("a", Cardinality::MANDATORY);
    let source = Field::<u32>::new("a", Cardinality::MANDATORY);
    let err = target.copy_from(&source).unwrap_err();
    assert!(matches!(err, BindError::TypeMismatch { .. }), "{err}");
}

#[test]
fn fields_are_found_by_type_name_and_position() {
    let library = sample_library();
    let template = Children::<Shelf>::new("any", Cardinality::OPTIONAL);
    let found = library.find_field_by_runtime_type(&template).unwrap();
    assert_eq!(found.name(), "");
    assert!(found.validity());

    let missing = Child::<Shelf>::new("any", Cardinality::OPTIONAL);
    assert!(matches!(
        library.find_field_by_runtime_type(&missing),
        Err(BindError::NotFound { record: "Library", .. })
    ));

    assert_eq!(library.key_field_name(), Some("<xmlattr>/name"));
    assert_eq!(library.value::<String>(0).map(String::as_str), Some("Central"));
    assert_eq!(library.value::<Vec<Shelf>>(1).map(Vec::len), Some(1));
}

#[test]
fn json_inventory_binds_nested_arrays() {
    let binder = library_binder();
    let tree = PropertyTree::from_json_str(
        r#"{"name": "depot", "items": [
            {"sku": "A-1", "quantity": 3, "price": 2.5},
            {"sku": "B-2", "quantity": 0, "restocked": "2024-02-29"}
        ]}"#,
    )
    .unwrap();
    let inventory: Inventory = binder.parse(&tree).unwrap();
    assert_eq!(inventory.name.as_str(), "depot");
    let skus: Vec<&str> = inventory.items.iter().map(|item| item.sku.as_str()).collect();
    assert_eq!(skus, vec!["A-1", "B-2"]);
    assert_eq!(inventory.items[0].price.get(), Some(&Real::from(2.5)));
    assert!(!inventory.items[0].restocked.is_valid());
    assert_eq!(*inventory.items[1].quantity, 0);

    let rendered = binder.write(&inventory).unwrap().to_json();
    let again: Inventory = binder.parse(&PropertyTree::from_json(&rendered)).unwrap();
    assert_eq!(again, inventory);
}

#[test]
fn document_root_unwrapping_can_be_disabled() {
    let options = BindOptions { unwrap_document_root: false, ..BindOptions::default() };
    let binder = Binder::new(catalog::registry(), options);
    let document = PropertyTree::from_xml(r#"<Library name="x"><Shelf number="1"/></Library>"#).unwrap();
    assert!(binder.parse::<Library>(&document).is_err());

    let element = document.document_element().unwrap();
    let library = binder.parse::<Library>(element);
    assert!(matches!(library, Err(BindError::Cardinality { field: "Book", .. })));
}

#[test]
fn custom_path_delimiter() {
    let options = BindOptions { path_delimiter: '.', ..BindOptions::default() };
    let binder = Binder::new(catalog::registry(), options);

    record! {
        struct Dotted as "Dotted" {
            value: Field<u32> = "outer.inner";
        }
    }

    let tree = PropertyTree::from_json_str(r#"{"outer": {"inner": 5}}"#).unwrap();
    let dotted: Dotted = binder.parse(&tree).unwrap();
    assert_eq!(*dotted.value, 5);
}

#[test]
fn table_rows_bind_items() {
    let binder = library_binder();
    let grid = tree_binding::Grid::from_delimited("sku,quantity,price\nA,1,\nB,2,9.5\n", ',');
    let (columns, rows) = tree_binding::HeaderIndex::from_grid(&grid);
    let items: Vec<Item> = rows
        .map(|row| binder.parse_table(&grid, &columns, row..row + 1).unwrap())
        .collect();
    assert_eq!(items.len(), 2);
    assert!(!items[0].price.is_valid());
    assert_eq!(items[1].price.get(), Some(&Real::from(9.5)));

    let err = binder.parse_table::<Inventory>(&grid, &columns, 1..3).unwrap_err();
    assert!(matches!(err, BindError::Cardinality { field: "name", actual: 0, .. }));
}

record! {
    struct Tag as "Tag" {
        text: Field<String> = "";
    }
}

record! {
    struct Tagged as "Tagged" {
        tags: Children<Tag> = "", Cardinality::exactly(2);
    }
}

#[test]
fn empty_leaf_path_binds_the_element_text() {
    let binder = Binder::standard();
    let mut tagged = Tagged::default();
    for text in ["a", "b"] {
        let mut tag = Tag::default();
        tag.text.set(text.to_string());
        tagged.tags.push(tag);
    }

    let document = binder.write(&tagged).unwrap();
    let xml = document.to_xml();
    assert!(xml.contains("<Tag>a</Tag>"), "{xml}");
    assert_eq!(binder.parse::<Tagged>(&document).unwrap(), tagged);

    let parsed: Tagged = binder
        .parse(&PropertyTree::from_xml("<Tagged><Tag>a</Tag><Tag>b</Tag></Tagged>").unwrap())
        .unwrap();
    let texts: Vec<&str> = parsed.tags.iter().map(|tag| tag.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "b"]);
    assert_eq!(parsed, tagged);
}
