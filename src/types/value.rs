//! BOSS value types.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::StructValue;

/// A value in the BOSS format.
///
/// The wire format is closed over exactly these kinds. Cacheable kinds
/// (`Text`, `Binary`, `List`, `Map`) are held behind `Arc`: cloning a `Value`
/// preserves its identity, and the write-side reference cache deduplicates by
/// that identity — the same allocation written twice becomes a back-reference,
/// while two equal but separately-built values are encoded literally.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    /// Integers that fit a machine word.
    Integer(i64),
    /// Integers that do not fit `i64`. Decoders always produce the smallest
    /// fitting variant; `From<BigInt>` normalizes the same way.
    BigInteger(BigInt),
    Double(f64),
    Text(Arc<str>),
    Binary(Arc<[u8]>),
    /// Seconds since the Unix epoch, second resolution.
    Timestamp(i64),
    List(Arc<Vec<Value>>),
    Map(Arc<StructValue>),
}

impl Value {
    /// Returns the value as a string reference, if it is a `Text` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an `Integer` variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as an f64, if it is a `Double` variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&StructValue> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Epoch seconds, if this is a `Timestamp`.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Self::Timestamp(secs) => Some(*secs),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Widens either integer variant to a `BigInt`.
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Self::Integer(i) => Some(BigInt::from(*i)),
            Self::BigInteger(b) => Some(b.clone()),
            _ => None,
        }
    }

    /// Identity token of a cacheable value: the address of its `Arc`
    /// allocation. `None` for scalar kinds, which are never cached.
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Self::Text(s) => Some(Arc::as_ptr(s) as *const u8 as usize),
            Self::Binary(b) => Some(Arc::as_ptr(b) as *const u8 as usize),
            Self::List(items) => Some(Arc::as_ptr(items) as usize),
            Self::Map(map) => Some(Arc::as_ptr(map) as usize),
            _ => None,
        }
    }
}

// -- Conversions --

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(i: $t) -> Self {
                Self::Integer(i64::from(i))
            }
        }
    )*};
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Self::Integer(i),
            Err(_) => Self::BigInteger(BigInt::from(u)),
        }
    }
}

impl From<BigInt> for Value {
    fn from(b: BigInt) -> Self {
        // Keep the smallest fitting representation.
        match b.to_i64() {
            Some(i) => Self::Integer(i),
            None => Self::BigInteger(b),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Double(f64::from(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(Arc::from(b))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Binary(Arc::from(b))
    }
}

impl From<Arc<[u8]>> for Value {
    fn from(b: Arc<[u8]>) -> Self {
        Self::Binary(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(Arc::new(items))
    }
}

impl From<Arc<Vec<Value>>> for Value {
    fn from(items: Arc<Vec<Value>>) -> Self {
        Self::List(items)
    }
}

impl From<StructValue> for Value {
    fn from(map: StructValue) -> Self {
        Self::Map(Arc::new(map))
    }
}

impl From<Arc<StructValue>> for Value {
    fn from(map: Arc<StructValue>) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

// -- Diagnostics --

/// Renders a binary payload as a bounded hex preview: the first 7 bytes,
/// then the total length when longer. Diagnostics only, not a wire artifact.
pub(crate) fn fmt_binary(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    write!(f, "|")?;
    for (i, b) in data.iter().take(7).enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{b:02X}")?;
    }
    if data.len() > 7 {
        write!(f, "…({})", data.len())?;
    }
    write!(f, "|")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::BigInteger(b) => write!(f, "{b}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Binary(b) => fmt_binary(f, b),
            Self::Timestamp(secs) => write!(f, "time({secs})"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => write!(f, "{map}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bigint_from_normalizes() {
        assert_eq!(Value::from(BigInt::from(42)), Value::Integer(42));
        let big: BigInt = "97152833356252188945".parse().unwrap();
        assert!(matches!(Value::from(big), Value::BigInteger(_)));
    }

    #[test]
    fn u64_promotes_past_i64() {
        assert_eq!(Value::from(7u64), Value::Integer(7));
        assert!(matches!(Value::from(u64::MAX), Value::BigInteger(_)));
    }

    #[test]
    fn clone_preserves_identity() {
        let a: Value = "shared".into();
        let b = a.clone();
        assert_eq!(a.identity(), b.identity());

        let c: Value = "shared".into();
        assert_ne!(a.identity(), c.identity());
        assert_eq!(a, c);
    }

    #[test]
    fn scalars_have_no_identity() {
        assert_eq!(Value::Integer(5).identity(), None);
        assert_eq!(Value::Double(1.5).identity(), None);
        assert_eq!(Value::Null.identity(), None);
    }

    #[test]
    fn binary_preview_is_bounded() {
        let short = Value::from(vec![0u8, 1, 2]);
        assert_eq!(short.to_string(), "|00 01 02|");

        let long = Value::from((0u8..20).collect::<Vec<_>>());
        assert_eq!(long.to_string(), "|00 01 02 03 04 05 06…(20)|");
    }

    #[test]
    fn display_nested() {
        let v = Value::from(vec![Value::Integer(1), "two".into(), Value::Null]);
        assert_eq!(v.to_string(), "[1, \"two\", null]");
    }
}
