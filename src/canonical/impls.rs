//! Projections for the primitive and container types.

use super::{cmp_struct, mismatch, pair, unpair, Canonical, Value};
use crate::{
    error::{Error, Result},
    util::{
        ser::{Binary, BinaryVec},
        Date,
    },
};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::str::FromStr;

impl Canonical for String {
    fn to_struct(&self) -> Value {
        Value::from(self.as_str())
    }

    fn from_struct(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => s.into_str().ok_or_else(|| Error::Deserialize(String::from("text is not utf8"))),
            other => Err(mismatch("str", &other)),
        }
    }
}

impl Canonical for bool {
    fn to_struct(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_struct(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

macro_rules! canonical_int {
    ($($ty:ty),+) => {
        $(
            impl Canonical for $ty {
                fn to_struct(&self) -> Value {
                    Value::from(*self)
                }

                fn from_struct(value: Value) -> Result<Self> {
                    let int = match value {
                        Value::Integer(ref int) => int
                            .as_i64()
                            .map(i128::from)
                            .or_else(|| int.as_u64().map(i128::from)),
                        _ => None,
                    };
                    match int {
                        Some(n) => <$ty>::try_from(n).map_err(|_| Error::EncodingTypeMismatch {
                            expected: stringify!($ty),
                            found: format!("int {}", n),
                        }),
                        None => Err(mismatch("int", &value)),
                    }
                }
            }
        )+
    };
}

canonical_int! { u8, u16, u32, u64, i8, i16, i32, i64 }

impl Canonical for f64 {
    fn to_struct(&self) -> Value {
        Value::F64(*self)
    }

    fn from_struct(value: Value) -> Result<Self> {
        match value {
            Value::F64(f) => Ok(f),
            Value::F32(f) => Ok(f64::from(f)),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl<T: Canonical> Canonical for Option<T> {
    fn to_struct(&self) -> Value {
        match self {
            Some(val) => val.to_struct(),
            None => Value::Nil,
        }
    }

    fn from_struct(value: Value) -> Result<Self> {
        match value {
            Value::Nil => Ok(None),
            other => Ok(Some(T::from_struct(other)?)),
        }
    }
}

impl<T: Canonical> Canonical for Vec<T> {
    fn to_struct(&self) -> Value {
        Value::Array(self.iter().map(|x| x.to_struct()).collect())
    }

    fn from_struct(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_struct).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}

/// Sort projected pairs by key, which is what makes mappings deterministic.
fn sorted_pairs<'a, K, V, I>(iter: I) -> Value
where
    K: Canonical + 'a,
    V: Canonical + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let mut pairs = iter.map(|(k, v)| (k.to_struct(), v.to_struct())).collect::<Vec<_>>();
    pairs.sort_by(|a, b| cmp_struct(&a.0, &b.0));
    Value::Array(pairs.into_iter().map(|(k, v)| pair(k, v)).collect())
}

/// Walk a list of `[key, value]` pairs, handing each decoded pair to `insert`,
/// which reports whether the key was new.
fn read_pairs<K, V, F>(value: Value, mut insert: F) -> Result<()>
where
    K: Canonical,
    V: Canonical,
    F: FnMut(K, V) -> bool,
{
    let items = match value {
        Value::Array(items) => items,
        other => Err(mismatch("mapping", &other))?,
    };
    for item in items {
        let (k, v) = unpair(item)?;
        let key_desc = k.to_string();
        if !insert(K::from_struct(k)?, V::from_struct(v)?) {
            Err(Error::EncodingDuplicate(key_desc))?;
        }
    }
    Ok(())
}

impl<K: Canonical + Ord, V: Canonical> Canonical for BTreeMap<K, V> {
    fn to_struct(&self) -> Value {
        sorted_pairs(self.iter())
    }

    fn from_struct(value: Value) -> Result<Self> {
        let mut map = BTreeMap::new();
        read_pairs(value, |k, v| map.insert(k, v).is_none())?;
        Ok(map)
    }
}

impl<K: Canonical + Eq + Hash, V: Canonical> Canonical for HashMap<K, V> {
    fn to_struct(&self) -> Value {
        sorted_pairs(self.iter())
    }

    fn from_struct(value: Value) -> Result<Self> {
        let mut map = HashMap::new();
        read_pairs(value, |k, v| map.insert(k, v).is_none())?;
        Ok(map)
    }
}

impl Canonical for Date {
    fn to_struct(&self) -> Value {
        Value::from(self.to_iso())
    }

    fn from_struct(value: Value) -> Result<Self> {
        let text = String::from_struct(value)?;
        Date::from_str(&text).map_err(|_| Error::EncodingBadDate(text))
    }
}

impl Canonical for BinaryVec {
    fn to_struct(&self) -> Value {
        Value::Binary(self.to_vec())
    }

    fn from_struct(value: Value) -> Result<Self> {
        match value {
            Value::Binary(bytes) => Ok(BinaryVec::from(bytes)),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl<const N: usize> Canonical for Binary<N> {
    fn to_struct(&self) -> Value {
        Value::Binary(self.as_ref().to_vec())
    }

    fn from_struct(value: Value) -> Result<Self> {
        let bytes = BinaryVec::from_struct(value)?;
        Binary::try_from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{pack, unpack};
    use proptest::prelude::*;

    #[test]
    fn ints_are_minimal() {
        assert_eq!(pack(&5u64).unwrap(), vec![0x05]);
        assert_eq!(pack(&200u32).unwrap(), vec![0xcc, 0xc8]);
        assert_eq!(pack(&-1i64).unwrap(), vec![0xff]);
        assert_eq!(pack(&-100i32).unwrap(), vec![0xd0, 0x9c]);
        // range checked on the way back in
        let res: Result<u8> = unpack(&pack(&300u32).unwrap());
        assert!(matches!(res, Err(Error::EncodingTypeMismatch { expected: "u8", .. })));
        let res: Result<u32> = unpack(&pack(&-1i32).unwrap());
        assert!(res.is_err());
    }

    #[test]
    fn text_lengths_use_smallest_header() {
        let short = "x".repeat(31);
        let medium = "x".repeat(32);
        assert_eq!(pack(&short).unwrap()[0], 0xbf);
        assert_eq!(&pack(&medium).unwrap()[0..2], &[0xd9, 32]);
    }

    #[test]
    fn absent_is_nil() {
        let none: Option<String> = None;
        assert_eq!(pack(&none).unwrap(), vec![0xc0]);
        assert_eq!(pack(&Some(String::from("a"))).unwrap(), vec![0xa1, b'a']);
        let back: Option<String> = unpack(&[0xc0]).unwrap();
        assert_eq!(back, None);
    }

    #[test]
    fn dates_are_iso_text() {
        let date = Date::from_ymd(2018, 1, 1).unwrap();
        let packed = pack(&date).unwrap();
        assert_eq!(packed[0], 0xaa);
        assert_eq!(&packed[1..], b"2018-01-01");
        assert_eq!(unpack::<Date>(&packed).unwrap(), date);
        let bad = pack(&String::from("2018-13-01")).unwrap();
        assert_eq!(
            unpack::<Date>(&bad).err(),
            Some(Error::EncodingBadDate(String::from("2018-13-01")))
        );
    }

    #[test]
    fn fixed_binary_length_checked() {
        let packed = pack(&BinaryVec::from(vec![1, 2, 3])).unwrap();
        assert_eq!(unpack::<Binary<3>>(&packed).unwrap().as_ref(), &[1, 2, 3]);
        assert_eq!(unpack::<Binary<4>>(&packed).err(), Some(Error::BadLength));
    }

    proptest! {
        #[test]
        fn mapping_bytes_ignore_insertion_order(entries in proptest::collection::vec((".{0,12}", any::<i64>()), 0..24)) {
            let mut forward = HashMap::new();
            let mut backward = HashMap::new();
            for (k, v) in entries.iter() {
                forward.insert(k.clone(), *v);
            }
            for (k, _) in entries.iter().rev() {
                backward.insert(k.clone(), forward[k]);
            }
            prop_assert_eq!(pack(&forward).unwrap(), pack(&backward).unwrap());
            let back: HashMap<String, i64> = unpack(&pack(&forward).unwrap()).unwrap();
            prop_assert_eq!(back, forward);
        }

        #[test]
        fn nested_lists_survive(lists in proptest::collection::vec(proptest::collection::vec(any::<u32>(), 0..8), 0..8)) {
            let back: Vec<Vec<u32>> = unpack(&pack(&lists).unwrap()).unwrap();
            prop_assert_eq!(back, lists);
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = unpack::<Vec<String>>(&bytes);
            let _ = unpack::<BTreeMap<String, BinaryVec>>(&bytes);
        }
    }
}
