//! Read-only state inspection.
//!
//! A component answers queries by dotted path (`d0`, `flags.z`, `fpu.fp3`).
//! Queries never change emulation state.

use std::fmt;

/// A dynamically-typed query result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I32(i32),
    /// Host approximation of a floating-point register.
    F64(f64),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    /// Unsigned integer view, if the value is one.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(u64::from(v)),
            Value::U16(v) => Some(u64::from(v)),
            Value::U32(v) => Some(u64::from(v)),
            Value::U64(v) => Some(v),
            Value::Bool(v) => Some(u64::from(v)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U32(v) => write!(f, "{v:#010X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v:e}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

value_from! {
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i32 => I32,
    f64 => F64,
    String => String,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A component whose state can be inspected.
pub trait Observable {
    /// Query one property by dotted path. `None` if the path is unknown.
    fn query(&self, path: &str) -> Option<Value>;

    /// Every path [`query`](Self::query) answers.
    fn query_paths(&self) -> &'static [&'static str];

    /// Snapshot of every known path, in `query_paths` order.
    fn snapshot(&self) -> Vec<(&'static str, Value)> {
        self.query_paths()
            .iter()
            .filter_map(|&path| self.query(path).map(|v| (path, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);

    impl Observable for Counter {
        fn query(&self, path: &str) -> Option<Value> {
            match path {
                "count" => Some(self.0.into()),
                "odd" => Some((self.0 & 1 != 0).into()),
                _ => None,
            }
        }

        fn query_paths(&self) -> &'static [&'static str] {
            &["count", "odd", "missing"]
        }
    }

    #[test]
    fn snapshot_skips_unanswered_paths() {
        let snap = Counter(3).snapshot();
        assert_eq!(snap, vec![("count", Value::U32(3)), ("odd", Value::Bool(true))]);
    }

    #[test]
    fn display_formats_hex_by_width() {
        assert_eq!(Value::U16(0x2700).to_string(), "0x2700");
        assert_eq!(Value::U32(0xFC_0000).to_string(), "0x00FC0000");
        assert_eq!(Value::I32(-3).to_string(), "-3");
        assert_eq!(Value::Array(vec![Value::U8(1), Value::Bool(false)]).to_string(), "[0x01, false]");
    }

    #[test]
    fn integer_view() {
        assert_eq!(Value::U16(7).as_u64(), Some(7));
        assert_eq!(Value::F64(1.0).as_u64(), None);
    }
}
