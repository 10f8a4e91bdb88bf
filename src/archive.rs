//! Archive form of a record: every field with its validity, nested records
//! included, stored as JSON.
use serde::{Deserialize, Serialize};

use crate::error::BindError;

/// Saved state of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArchiveEntry {
    Leaf {
        valid: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Record {
        valid: bool,
        fields: Vec<ArchiveEntry>,
    },
    Records {
        valid: bool,
        items: Vec<Vec<ArchiveEntry>>,
    },
}

impl ArchiveEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Leaf { .. } => "leaf",
            Self::Record { .. } => "record",
            Self::Records { .. } => "records",
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Self::Leaf { valid, .. } | Self::Record { valid, .. } | Self::Records { valid, .. } => {
                *valid
            }
        }
    }
}

/// A whole record, tagged with its node name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveDocument {
    pub record: String,
    pub fields: Vec<ArchiveEntry>,
}

pub(crate) fn unexpected_entry(field: &str, expected: &str, entry: &ArchiveEntry) -> BindError {
    BindError::Archive(format!(
        "field `{field}` expects a {expected} entry, found {}",
        entry.kind()
    ))
}

pub fn to_json(document: &ArchiveDocument) -> Result<String, BindError> {
    serde_json::to_string_pretty(document).map_err(|err| BindError::Archive(err.to_string()))
}

pub fn from_json(src: &str) -> Result<ArchiveDocument, BindError> {
    crate::path_de::from_str_with_path(src).map_err(|err| BindError::Archive(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Binder;
    use crate::record::Record;
    use crate::{Cardinality, Child, Children, Field};
    use pretty_assertions::assert_eq;

    crate::record! {
        struct Point as "point" {
            x: Field<i64> = "x";
            y: Field<i64> = "y", Cardinality::OPTIONAL;
        }
    }

    crate::record! {
        struct Shape as "shape" {
            label: Field<String> = "label";
            origin: Child<Point> = "origin", Cardinality::OPTIONAL;
            corners: Children<Point> = "corner", Cardinality::OPTIONAL;
        }
    }

    fn shape() -> Shape {
        let mut shape = Shape::default();
        shape.label.set("tri".into());
        for x in [1, 2, 3] {
            let mut corner = Point::default();
            corner.x.set(x);
            shape.corners.push(corner);
        }
        shape
    }

    #[test]
    fn save_and_load_preserve_validity() {
        let binder = Binder::standard();
        let shape = shape();
        let document = shape.save_archive(&binder).unwrap();
        assert_eq!(document.record, "shape");
        assert!(!document.fields[1].is_valid());

        let text = to_json(&document).unwrap();
        let mut restored = Shape::default();
        restored.load_archive(&from_json(&text).unwrap(), &binder).unwrap();
        assert_eq!(restored, shape);
        assert!(!restored.origin.is_valid());
        assert_eq!(restored.corners.len(), 3);
        assert!(!restored.corners[2].y.is_valid());
        assert_eq!(*restored.corners[2].x, 3);
    }

    #[test]
    fn mismatched_archives_are_rejected() {
        let binder = Binder::standard();
        let mut point = Point::default();
        let document = shape().save_archive(&binder).unwrap();
        assert!(matches!(point.load_archive(&document, &binder), Err(BindError::Archive(_))));

        let wrong_shape = ArchiveDocument { record: "point".into(), fields: document.fields.clone() };
        let err = point.load_archive(&wrong_shape, &binder).unwrap_err();
        assert!(err.to_string().contains("has 2 fields"), "{err}");

        let swapped = ArchiveDocument {
            record: "point".into(),
            fields: vec![ArchiveEntry::Records { valid: true, items: vec![] }, document.fields[0].clone()],
        };
        let err = point.load_archive(&swapped, &binder).unwrap_err();
        assert!(err.to_string().contains("expects a leaf entry, found records"), "{err}");
    }

    #[test]
    fn entries_are_tagged_by_kind() {
        let entry = ArchiveEntry::Leaf { valid: false, text: None };
        assert_eq!(serde_json::to_string(&entry).unwrap(), r#"{"kind":"leaf","valid":false}"#);
        assert!(from_json(r#"{"record": "x", "fields": [{"kind": "tree"}]}"#).is_err());
    }
}
