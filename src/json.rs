//! JSON adapter for [`PropertyTree`].
//!
//! Object keys become children, array elements become repeated children under
//! the array's key, scalars become node text. Rendering groups repeated keys
//! back into arrays. Scalars are rendered as strings since the tree does not
//! keep JSON types.
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::DocumentError;
use crate::tree::PropertyTree;

impl PropertyTree {
    /// The node for `value`; a top-level object is the record node itself.
    pub fn from_json(value: &Value) -> PropertyTree {
        let mut node = PropertyTree::new();
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    push_json(&mut node, key, child);
                }
            }
            Value::Array(items) => {
                for item in items {
                    push_json(&mut node, "", item);
                }
            }
            scalar => node.set_data(scalar_text(scalar)),
        }
        node
    }

    pub fn from_json_str(src: &str) -> Result<PropertyTree, DocumentError> {
        let value: Value = serde_json::from_str(src)?;
        Ok(Self::from_json(&value))
    }

    /// Renders the tree as JSON. A document root renders its top element.
    pub fn to_json(&self) -> Value {
        if self.is_document() {
            return match self.children().last() {
                Some((_, element)) => element.to_json(),
                None => Value::Null,
            };
        }
        if self.is_empty() {
            return Value::String(self.data().to_string());
        }
        let mut grouped: IndexMap<&str, Vec<Value>> = IndexMap::new();
        for (name, child) in self.children() {
            grouped.entry(name).or_default().push(child.to_json());
        }
        let object: Map<String, Value> = grouped
            .into_iter()
            .map(|(name, mut values)| {
                let value = if values.len() == 1 { values.remove(0) } else { Value::Array(values) };
                (name.to_string(), value)
            })
            .collect();
        Value::Object(object)
    }
}

fn push_json(parent: &mut PropertyTree, key: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                push_json(parent, key, item);
            }
        }
        other => {
            parent.push_child(key, PropertyTree::from_json(other));
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
