//! Attribute value type for image metadata.
//!
//! [`AttrValue`] holds one typed metadata entry restored from the XML
//! extension block. The variant set mirrors the scalar types the save
//! format can carry as text.

use std::fmt;

/// Typed metadata value.
///
/// # Example
///
/// ```rust
/// use vips_io::attrs::AttrValue;
///
/// let v = AttrValue::Int(42);
/// assert_eq!(v.as_i64(), Some(42));
/// assert_eq!(v.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum AttrValue {
    /// Boolean value.
    Bool(bool),
    /// Signed 32-bit integer.
    Int(i32),
    /// Unsigned 32-bit integer.
    UInt(u32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    Str(String),
}

impl AttrValue {
    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int32",
            AttrValue::UInt(_) => "uint32",
            AttrValue::Int64(_) => "int64",
            AttrValue::Float(_) => "float",
            AttrValue::Double(_) => "double",
            AttrValue::Str(_) => "string",
        }
    }

    /// String slice if this is a `Str`.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Bool if this is a `Bool`.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer variant widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v as i64),
            AttrValue::UInt(v) => Some(*v as i64),
            AttrValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric variant as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v as f64),
            AttrValue::Double(v) => Some(*v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::UInt(v) => write!(f, "{}", v),
            AttrValue::Int64(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Double(v) => write!(f, "{}", v),
            AttrValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Double(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(AttrValue::UInt(7).as_i64(), Some(7));
        assert_eq!(AttrValue::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(AttrValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(AttrValue::from("x").as_str(), Some("x"));
        assert_eq!(AttrValue::Bool(true).as_bool(), Some(true));
        assert_eq!(AttrValue::Str("1".into()).as_i64(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(AttrValue::Double(2.5).to_string(), "2.5");
        assert_eq!(AttrValue::Str("hello".into()).to_string(), "hello");
        assert_eq!(AttrValue::Bool(false).type_name(), "bool");
    }
}
