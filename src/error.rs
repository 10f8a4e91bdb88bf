//! Error types raised while binding records to trees, tables and archives.
use thiserror::Error;

use crate::cardinality::Cardinality;

/// A text value does not fit the lexical grammar of its target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("cannot convert `{text}` to {target}")]
    Malformed { text: String, target: &'static str },
    #[error("no text conversion registered for {target}")]
    Unregistered { target: &'static str },
}

impl ConversionError {
    pub fn malformed<T: ?Sized>(text: &str) -> Self {
        Self::Malformed { text: text.to_string(), target: std::any::type_name::<T>() }
    }
    pub fn unregistered<T: ?Sized>() -> Self {
        Self::Unregistered { target: std::any::type_name::<T>() }
    }
}

/// Failure of a parse, write, copy or archive pass.
///
/// Conversion and cardinality errors describe malformed input documents.
/// Type mismatches and failed lookups are declaration bugs in the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("field `{field}`: {source}")]
    Conversion {
        field: &'static str,
        #[source]
        source: ConversionError,
    },
    #[error("invalid number of children in node `{field}`: required {required}, present {actual}")]
    Cardinality {
        field: &'static str,
        required: Cardinality,
        actual: usize,
    },
    #[error("type mismatch: cannot assign `{found}` to `{expected}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("record `{record}` has no field with {lookup}")]
    NotFound {
        record: &'static str,
        lookup: String,
    },
    #[error("archive: {0}")]
    Archive(String),
}

/// The error surface of a parse pass.
pub type ParseError = BindError;

impl BindError {
    pub fn conversion(field: &'static str, source: ConversionError) -> Self {
        Self::Conversion { field, source }
    }
}

/// Failure to turn source text into a [`crate::PropertyTree`].
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
