//! Typed attribute storage for image metadata.
//!
//! The XML extension block stores every metadata value as text plus the
//! name of the type it should be restored to. This module holds the two
//! halves of that round trip:
//!
//! - [`AttrValue`] / [`Attrs`] - typed values keyed by field name
//! - [`TypeRegistry`] - declared type name -> string-to-value transform
//!
//! # Example
//!
//! ```rust
//! use vips_io::attrs::{Attrs, AttrValue, TypeRegistry};
//!
//! let registry = TypeRegistry::default();
//! let value = registry.transform("gdouble", " 2.5 ").unwrap().unwrap();
//!
//! let mut attrs = Attrs::new();
//! attrs.set("gamma", value);
//! assert_eq!(attrs.get_f64("gamma"), Some(2.5));
//!
//! // Unknown types are not an error, they simply have no transform.
//! assert!(registry.transform("VipsBlob", "...").is_none());
//! ```

mod value;

pub use value::AttrValue;

use std::collections::HashMap;

/// Attribute container: field name -> typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    map: HashMap<String, AttrValue>,
}

impl Attrs {
    /// Creates an empty container.
    #[inline]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Inserts or replaces a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.map.insert(key.into(), value.into());
    }

    /// Looks up a value.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    /// String value of a `Str` entry.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_str)
    }

    /// Integer value of any integer entry.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(AttrValue::as_i64)
    }

    /// Numeric value of any numeric entry.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttrValue::as_f64)
    }

    /// Removes a value, returning it.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.map.remove(key)
    }

    /// True if the key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Iterates over entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.map.iter()
    }

    /// Entries sorted by key, for stable display.
    pub fn sorted(&self) -> Vec<(&String, &AttrValue)> {
        let mut entries: Vec<_> = self.map.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

// === Type registry ===

/// Converts the saved text form into a typed value.
pub type TransformFn = fn(&str) -> Result<AttrValue, String>;

/// Registry of declared type names that can be restored from text.
///
/// The default registry knows the scalar types the save path writes:
///
/// | Type name | Value |
/// |-----------|-------|
/// | `gboolean` | `Bool` |
/// | `gint` | `Int` |
/// | `guint` | `UInt` |
/// | `gint64` | `Int64` |
/// | `gfloat` | `Float` |
/// | `gdouble` | `Double` |
/// | `gchararray`, `VipsRefString` | `Str` |
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    transforms: HashMap<String, TransformFn>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("gboolean", parse_bool);
        registry.register("gint", |s| parse_num(s).map(AttrValue::Int));
        registry.register("guint", |s| parse_num(s).map(AttrValue::UInt));
        registry.register("gint64", |s| parse_num(s).map(AttrValue::Int64));
        registry.register("gfloat", |s| parse_num(s).map(AttrValue::Float));
        registry.register("gdouble", |s| parse_num(s).map(AttrValue::Double));
        registry.register("gchararray", |s| Ok(AttrValue::Str(s.to_string())));
        registry.register("VipsRefString", |s| Ok(AttrValue::Str(s.to_string())));
        registry
    }
}

impl TypeRegistry {
    /// Registry with no known types.
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Adds or replaces the transform for `type_name`.
    pub fn register(&mut self, type_name: impl Into<String>, transform: TransformFn) {
        self.transforms.insert(type_name.into(), transform);
    }

    /// True if `type_name` can be restored from text.
    pub fn is_transformable(&self, type_name: &str) -> bool {
        self.transforms.contains_key(type_name)
    }

    /// Restores `text` as `type_name`.
    ///
    /// `None` if the type is unknown; `Some(Err)` if the type is known but
    /// the text does not convert.
    pub fn transform(&self, type_name: &str, text: &str) -> Option<Result<AttrValue, String>> {
        self.transforms.get(type_name).map(|f| f(text))
    }
}

fn parse_num<T: std::str::FromStr>(text: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| format!("\"{}\": {}", text.trim(), e))
}

fn parse_bool(text: &str) -> Result<AttrValue, String> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(AttrValue::Bool(true)),
        "false" | "0" | "no" => Ok(AttrValue::Bool(false)),
        other => Err(format!("\"{}\" is not a boolean", other)),
    }
}
