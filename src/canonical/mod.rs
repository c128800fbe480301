//! Deterministic canonical encoding.
//!
//! Everything that gets hashed, signed, or sent goes through here. A value is
//! first projected into a structural tree (see [Canonical::to_struct]) and the
//! tree is then packed as msgpack. The projection rules are what make the
//! bytes reproducible by other implementations:
//!
//! - records become a list of `[fieldName, value]` pairs, sorted by field
//!   name (never declaration order)
//! - enumerations become the variant's name
//! - sequences stay sequences, in order
//! - mappings become a list of `[key, value]` pairs sorted by key
//! - dates become `YYYY-MM-DD` text
//! - byte strings and text strings are separate wire types, always
//!
//! Decoding runs the other way and is driven entirely by the target type:
//! records pull their fields by name, and anything missing, duplicated, or
//! unexpected is an error.
//!
//! There's no reflection involved. Each type says how it projects itself,
//! usually via the [canonical_record!] and [canonical_enum!] macros.

use crate::error::{Error, Result};
use std::cmp::Ordering;

mod impls;
mod record;

pub use record::{RecordBuilder, RecordReader};
pub use rmpv::Value;

/// A type with a canonical structural projection.
pub trait Canonical: Sized {
    /// Project this value into its structural tree.
    fn to_struct(&self) -> Value;

    /// Rebuild a value from its structural tree.
    fn from_struct(value: Value) -> Result<Self>;

    /// Pack this value into canonical bytes.
    fn pack(&self) -> Result<Vec<u8>> {
        pack(self)
    }

    /// Unpack canonical bytes into this type.
    fn unpack(bytes: &[u8]) -> Result<Self> {
        unpack(bytes)
    }
}

/// Turn any canonical value into its packed bytes.
pub fn pack<T: Canonical>(obj: &T) -> Result<Vec<u8>> {
    pack_struct(&obj.to_struct())
}

/// Pack an already-projected tree.
pub fn pack_struct(tree: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, tree).map_err(|e| Error::SerializeMsgPack(e.to_string()))?;
    Ok(buf)
}

/// Unpack canonical bytes into the given type. The whole input must be
/// consumed by exactly one value.
pub fn unpack<T: Canonical>(bytes: &[u8]) -> Result<T> {
    T::from_struct(unpack_struct(bytes)?)
}

/// Unpack bytes into a raw tree without interpreting it.
pub fn unpack_struct(bytes: &[u8]) -> Result<Value> {
    let mut reader = bytes;
    let tree = rmpv::decode::read_value(&mut reader).map_err(|e| Error::Deserialize(e.to_string()))?;
    if !reader.is_empty() {
        Err(Error::EncodingTrailingBytes)?;
    }
    Ok(tree)
}

/// A short name for the wire type of a tree node, for error messages.
pub(crate) fn kind_of(value: &Value) -> String {
    let kind = match value {
        Value::Nil => "nil",
        Value::Boolean(_) => "bool",
        Value::Integer(_) => "int",
        Value::F32(_) | Value::F64(_) => "float",
        Value::String(_) => "str",
        Value::Binary(_) => "bytes",
        Value::Array(_) => "list",
        Value::Map(_) => "map",
        Value::Ext(..) => "ext",
    };
    String::from(kind)
}

pub(crate) fn mismatch(expected: &'static str, found: &Value) -> Error {
    Error::EncodingTypeMismatch {
        expected,
        found: kind_of(found),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Nil => 0,
        Value::Boolean(_) => 1,
        Value::Integer(_) => 2,
        Value::F32(_) | Value::F64(_) => 3,
        Value::String(_) => 4,
        Value::Binary(_) => 5,
        Value::Array(_) => 6,
        Value::Map(_) => 7,
        Value::Ext(..) => 8,
    }
}

fn int_key(int: &rmpv::Integer) -> i128 {
    int.as_i64()
        .map(i128::from)
        .or_else(|| int.as_u64().map(i128::from))
        .unwrap_or_default()
}

/// The total order used to sort mapping keys.
///
/// Values compare *structurally*: text against text, bytes against bytes,
/// numbers numerically, lists element by element. Values of different wire
/// types order by type. Comparing packed bytes instead would put `"b"` before
/// `"aa"` (the length lives in the header), which isn't what anyone else does.
pub fn cmp_struct(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Integer(x), Value::Integer(y)) => int_key(x).cmp(&int_key(y)),
        (Value::F32(_) | Value::F64(_), Value::F32(_) | Value::F64(_)) => {
            let x = a.as_f64().unwrap_or_default();
            let y = b.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Value::Binary(x), Value::Binary(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xv, yv) in x.iter().zip(y.iter()) {
                match cmp_struct(xv, yv) {
                    Ordering::Equal => {}
                    ord => return ord,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Map(x), Value::Map(y)) => {
            for ((xk, xv), (yk, yv)) in x.iter().zip(y.iter()) {
                match cmp_struct(xk, yk).then_with(|| cmp_struct(xv, yv)) {
                    Ordering::Equal => {}
                    ord => return ord,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Ext(xt, xd), Value::Ext(yt, yd)) => xt.cmp(yt).then_with(|| xd.cmp(yd)),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Build a two-element `[a, b]` list, the building block of both records and
/// mappings.
pub(crate) fn pair(a: Value, b: Value) -> Value {
    Value::Array(vec![a, b])
}

/// Split a two-element list back apart.
pub(crate) fn unpair(value: Value) -> Result<(Value, Value)> {
    match value {
        Value::Array(items) if items.len() == 2 => {
            let mut iter = items.into_iter();
            match (iter.next(), iter.next()) {
                (Some(a), Some(b)) => Ok((a, b)),
                _ => Err(Error::BadLength),
            }
        }
        other => Err(mismatch("pair", &other)),
    }
}

/// Implements [Canonical] for a record type by listing its fields and their
/// wire names. Field order in the macro doesn't matter; the encoder sorts by
/// wire name.
///
/// ```ignore
/// canonical_record! {
///     AssertionMetadata {
///         meta_salt: "MetaSalt",
///         meta_value: "MetaValue",
///     }
/// }
/// ```
#[macro_export]
macro_rules! canonical_record {
    (
        $name:ident {
            $($field:ident : $wire:literal),+ $(,)?
        }
    ) => {
        impl $crate::canonical::Canonical for $name {
            fn to_struct(&self) -> $crate::canonical::Value {
                $crate::canonical::RecordBuilder::new()
                    $( .field($wire, &self.$field) )+
                    .build()
            }

            fn from_struct(value: $crate::canonical::Value) -> $crate::error::Result<Self> {
                let mut record = $crate::canonical::RecordReader::new(stringify!($name), value)?;
                let decoded = Self {
                    $( $field: record.take($wire)?, )+
                };
                record.finish()?;
                Ok(decoded)
            }
        }
    };
}

/// Gives a fieldless enum stable variant names, and (unless asked for names
/// only) a [Canonical] impl that encodes the enum as its variant name.
#[macro_export]
macro_rules! canonical_enum {
    (
        @names $name:ident {
            $($variant:ident),+ $(,)?
        }
    ) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// The stable name of this variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )+
                }
            }

            /// Look a variant up by its stable name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( stringify!($variant) => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };

    (
        $name:ident {
            $($variant:ident),+ $(,)?
        }
    ) => {
        $crate::canonical_enum! { @names $name { $($variant),+ } }

        impl $crate::canonical::Canonical for $name {
            fn to_struct(&self) -> $crate::canonical::Value {
                $crate::canonical::Value::from(self.as_str())
            }

            fn from_struct(value: $crate::canonical::Value) -> $crate::error::Result<Self> {
                let name = <String as $crate::canonical::Canonical>::from_struct(value)?;
                Self::from_name(&name).ok_or($crate::error::Error::EncodingUnknownVariant {
                    enumeration: stringify!($name),
                    variant: name,
                })
            }
        }
    };
}
