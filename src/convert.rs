//! Text conversions for leaf fields.
//!
//! A [`ConversionRegistry`] holds one converter pair per leaf type, keyed by the
//! type's `TypeId`. Fields look their converter up through their static type
//! parameter, so there is no name-based dispatch at parse time.
//!
//! Integer grammar is strict on purpose: a non-empty run of ASCII decimal digits,
//! no sign, no surrounding whitespace.
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;

use crate::error::ConversionError;

/// Integer leaf type used by the sample records.
pub type Integer = i64;

/// Totally ordered floating point leaf type.
pub type Real = OrderedFloat<f64>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

static DECIMAL_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("digits pattern is valid"));

/// True iff `text` is a non-empty run of ASCII decimal digits.
pub fn is_decimal_digits(text: &str) -> bool {
    DECIMAL_DIGITS.is_match(text)
}

// ------------------------------ Converters -------------------------------- //

type FromText<T> = Box<dyn Fn(&str) -> Result<T, ConversionError> + Send + Sync>;
type ToText<T> = Box<dyn Fn(&T) -> Result<String, ConversionError> + Send + Sync>;

struct Converter<T> {
    from_text: FromText<T>,
    to_text: Option<ToText<T>>,
}

struct Entry {
    type_name: &'static str,
    converter: Box<dyn Any + Send + Sync>,
}

/// Converter pairs for every leaf type a binder knows about.
///
/// Built once, then shared by reference with every parse and write pass.
pub struct ConversionRegistry {
    entries: IndexMap<TypeId, Entry>,
}

impl ConversionRegistry {
    /// A registry without any converters.
    pub fn empty() -> Self {
        Self { entries: IndexMap::new() }
    }

    /// Integers, strings, booleans, floats and ISO dates.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry
            .register_integer::<i64>()
            .register_integer::<i32>()
            .register_integer::<u8>()
            .register_integer::<u16>()
            .register_integer::<u32>()
            .register_integer::<u64>()
            .register_integer::<usize>()
            .register(|text: &str| Ok(text.to_string()), |value: &String| Ok(value.clone()))
            .register(parse_bool, |value: &bool| Ok(value.to_string()))
            .register(
                |text: &str| text.parse::<f64>().map_err(|_| ConversionError::malformed::<f64>(text)),
                |value: &f64| Ok(value.to_string()),
            )
            .register(
                |text: &str| {
                    text.parse::<f64>()
                        .map(OrderedFloat)
                        .map_err(|_| ConversionError::malformed::<Real>(text))
                },
                |value: &Real| Ok(value.0.to_string()),
            )
            .register(
                |text: &str| {
                    NaiveDate::parse_from_str(text, DATE_FORMAT)
                        .map_err(|_| ConversionError::malformed::<NaiveDate>(text))
                },
                |value: &NaiveDate| Ok(value.format(DATE_FORMAT).to_string()),
            );
        registry
    }

    /// Registers (or replaces) the converter pair for `T`.
    pub fn register<T: Any>(
        &mut self,
        from_text: impl Fn(&str) -> Result<T, ConversionError> + Send + Sync + 'static,
        to_text: impl Fn(&T) -> Result<String, ConversionError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.insert(Converter { from_text: Box::new(from_text), to_text: Some(Box::new(to_text)) })
    }

    /// Registers a parse-only converter; writing a `T` fails with
    /// [`ConversionError::Unregistered`].
    pub fn register_from_text<T: Any>(
        &mut self,
        from_text: impl Fn(&str) -> Result<T, ConversionError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.insert(Converter::<T> { from_text: Box::new(from_text), to_text: None })
    }

    /// Registers a digits-only integer converter.
    pub fn register_integer<T>(&mut self) -> &mut Self
    where
        T: FromStr + fmt::Display + Any,
    {
        self.register(
            |text: &str| {
                if !is_decimal_digits(text) {
                    return Err(ConversionError::malformed::<T>(text));
                }
                text.parse::<T>().map_err(|_| ConversionError::malformed::<T>(text))
            },
            |value: &T| Ok(value.to_string()),
        )
    }

    /// Registers a bidirectional lookup table, typically for enums.
    pub fn register_table<T>(&mut self, table: &[(&str, T)]) -> &mut Self
    where
        T: Clone + PartialEq + Send + Sync + Any,
    {
        let forward: Vec<(String, T)> =
            table.iter().map(|(text, value)| (text.to_string(), value.clone())).collect();
        let backward = forward.clone();
        self.register(
            move |text: &str| {
                forward
                    .iter()
                    .find(|(key, _)| key == text)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| ConversionError::malformed::<T>(text))
            },
            move |value: &T| {
                backward
                    .iter()
                    .find(|(_, candidate)| candidate == value)
                    .map(|(key, _)| key.clone())
                    .ok_or_else(ConversionError::unregistered::<T>)
            },
        )
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Names of the registered types, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.values().map(|entry| entry.type_name)
    }

    pub fn from_text<T: Any>(&self, text: &str) -> Result<T, ConversionError> {
        let converter = self.converter::<T>().ok_or_else(ConversionError::unregistered::<T>)?;
        (converter.from_text)(text)
    }

    pub fn to_text<T: Any>(&self, value: &T) -> Result<String, ConversionError> {
        let to_text = self
            .converter::<T>()
            .and_then(|converter| converter.to_text.as_ref())
            .ok_or_else(ConversionError::unregistered::<T>)?;
        to_text(value)
    }

    fn insert<T: Any>(&mut self, converter: Converter<T>) -> &mut Self {
        self.entries.insert(
            TypeId::of::<T>(),
            Entry { type_name: type_name::<T>(), converter: Box::new(converter) },
        );
        self
    }

    fn converter<T: Any>(&self) -> Option<&Converter<T>> {
        self.entries.get(&TypeId::of::<T>())?.converter.downcast_ref::<Converter<T>>()
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.type_names()).finish()
    }
}

fn parse_bool(text: &str) -> Result<bool, ConversionError> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConversionError::malformed::<bool>(text)),
    }
}
