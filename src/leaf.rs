//! Leaf field types: everything a record field can hold that is not itself a
//! record.
//!
//! [`Leaf`] ties a Rust type to its [`Kind`] and to the [`Value`] variant it is
//! written from. [`Slot`] is the object-safe face of the same thing, handed to
//! visitors as `&mut dyn Slot` so the walker can check and assign values
//! without knowing the concrete field type.
//!
//! Implement [`Leaf`] for your own types when they should be configurable
//! from a string source, e.g. a string-backed enum:
//!
//! ```
//! use copre::{Kind, Leaf, Value};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! enum Level { #[default] Info, Debug }
//!
//! impl Leaf for Level {
//!     fn kind() -> Kind { Kind::String }
//!     fn from_value(value: &Value) -> Option<Self> {
//!         match value {
//!             Value::String(s) if s == "info" => Some(Level::Info),
//!             Value::String(s) if s == "debug" => Some(Level::Debug),
//!             _ => None,
//!         }
//!     }
//!     fn is_zero(&self) -> bool { *self == Level::Info }
//!     fn to_value(&self) -> Option<Value> {
//!         let name = match self { Level::Info => "info", Level::Debug => "debug" };
//!         Some(Value::String(name.into()))
//!     }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;
use std::time::Duration;

use ipnet::IpNet;

use crate::value::{Ipv4Mask, Kind, Value};

/// A type that can be the target of a single configuration assignment.
pub trait Leaf: Sized {
    /// The declared type, as reported to callbacks and in mismatch errors.
    fn kind() -> Kind;

    /// Build from a value, or `None` if the value does not fit this type.
    fn from_value(value: &Value) -> Option<Self>;

    /// Whether this is the zero/empty value. Zero leaves never override
    /// during a merge.
    fn is_zero(&self) -> bool;

    /// Export the current value. `None` means there is nothing to export.
    fn to_value(&self) -> Option<Value>;
}

/// Object-safe access to one leaf field.
pub trait Slot {
    fn kind(&self) -> Kind;

    /// Overwrite the field with `value`. Returns `false`, leaving the field
    /// untouched, when the value does not fit.
    fn assign(&mut self, value: &Value) -> bool;

    fn is_zero(&self) -> bool;

    fn value(&self) -> Option<Value>;
}

impl<T: Leaf> Slot for T {
    fn kind(&self) -> Kind {
        T::kind()
    }

    fn assign(&mut self, value: &Value) -> bool {
        match T::from_value(value) {
            Some(v) => {
                *self = v;
                true
            }
            None => false,
        }
    }

    fn is_zero(&self) -> bool {
        Leaf::is_zero(self)
    }

    fn value(&self) -> Option<Value> {
        self.to_value()
    }
}

macro_rules! scalar_leaf {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl Leaf for $ty {
            fn kind() -> Kind {
                Kind::$variant
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn is_zero(&self) -> bool {
                *self == <$ty>::default()
            }

            fn to_value(&self) -> Option<Value> {
                Some(Value::$variant(self.clone()))
            }
        }
    )*};
}

scalar_leaf! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => String,
    Duration => Duration,
}

/// Network values have no empty form: `0.0.0.0`, `::`, the `/0` mask and
/// `0.0.0.0/0` are all real settings. Wrap the field in `Option` to tell
/// "unset" apart.
impl Leaf for Ipv4Mask {
    fn kind() -> Kind {
        Kind::IpMask
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::IpMask(mask) => Some(*mask),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        false
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::IpMask(*self))
    }
}

impl Leaf for PathBuf {
    fn kind() -> Kind {
        Kind::String
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(PathBuf::from(s)),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        self.as_os_str().is_empty()
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::String(self.to_string_lossy().into_owned()))
    }
}

impl Leaf for IpAddr {
    fn kind() -> Kind {
        Kind::Ip
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Ip(ip) => Some(*ip),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        false
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Ip(*self))
    }
}

impl Leaf for Ipv4Addr {
    fn kind() -> Kind {
        Kind::Ip
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Ip(IpAddr::V4(ip)) => Some(*ip),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        false
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Ip(IpAddr::V4(*self)))
    }
}

impl Leaf for Ipv6Addr {
    fn kind() -> Kind {
        Kind::Ip
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Ip(IpAddr::V6(ip)) => Some(*ip),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        false
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Ip(IpAddr::V6(*self)))
    }
}

impl Leaf for IpNet {
    fn kind() -> Kind {
        Kind::Cidr
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Cidr(net) => Some(*net),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        false
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Cidr(*self))
    }
}

/// `None` is the zero value. `Some(0)` is not: it was set.
impl<T: Leaf> Leaf for Option<T> {
    fn kind() -> Kind {
        T::kind()
    }

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(Leaf::to_value)
    }
}

/// Sequences accept a [`Value::List`] of matching elements, or raw
/// [`Value::Bytes`] when the element type is written from `u8` values.
impl<T: Leaf> Leaf for Vec<T> {
    fn kind() -> Kind {
        Kind::list(T::kind())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            Value::Bytes(bytes) => bytes
                .iter()
                .map(|b| T::from_value(&Value::U8(*b)))
                .collect(),
            _ => None,
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Option<Value> {
        self.iter()
            .map(Leaf::to_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::List)
    }
}

fn map_entries<K: Leaf, V: Leaf>(value: &Value) -> Option<impl Iterator<Item = Option<(K, V)>>> {
    match value {
        Value::Map(entries) => Some(
            entries
                .iter()
                .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?))),
        ),
        _ => None,
    }
}

fn export_entries<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> Option<Value>
where
    K: Leaf + 'a,
    V: Leaf + 'a,
{
    entries
        .map(|(k, v)| Some((k.to_value()?, v.to_value()?)))
        .collect::<Option<Vec<_>>>()
        .map(Value::Map)
}

impl<K: Leaf + Eq + Hash, V: Leaf> Leaf for HashMap<K, V> {
    fn kind() -> Kind {
        Kind::map(K::kind(), V::kind())
    }

    fn from_value(value: &Value) -> Option<Self> {
        map_entries(value)?.collect()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Option<Value> {
        export_entries(self.iter())
    }
}

impl<K: Leaf + Ord, V: Leaf> Leaf for BTreeMap<K, V> {
    fn kind() -> Kind {
        Kind::map(K::kind(), V::kind())
    }

    fn from_value(value: &Value) -> Option<Self> {
        map_entries(value)?.collect()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Option<Value> {
        export_entries(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign<T: Leaf + Default>(value: Value) -> Option<T> {
        let mut slot = T::default();
        Slot::assign(&mut slot, &value).then_some(slot)
    }

    #[test]
    fn scalars_require_exact_variant() {
        assert_eq!(assign::<u16>(Value::U16(8080)), Some(8080));
        assert_eq!(assign::<u16>(Value::I32(8080)), None);
        assert_eq!(assign::<u16>(Value::U8(80)), None);
        assert_eq!(assign::<String>(Value::String("x".into())), Some("x".into()));
        assert_eq!(assign::<bool>(Value::String("true".into())), None);
    }

    #[test]
    fn failed_assign_leaves_field_untouched() {
        let mut port: u16 = 443;
        assert!(!Slot::assign(&mut port, &Value::String("80".into())));
        assert_eq!(port, 443);
    }

    #[test]
    fn byte_vectors_accept_raw_bytes() {
        assert_eq!(
            assign::<Vec<u8>>(Value::Bytes(vec![0xde, 0xad])),
            Some(vec![0xde, 0xad])
        );
        assert_eq!(
            assign::<Vec<u8>>(Value::List(vec![Value::U8(1), Value::U8(0)])),
            Some(vec![1, 0])
        );
        assert_eq!(assign::<Vec<u16>>(Value::Bytes(vec![1])), None);
    }

    #[test]
    fn list_with_one_bad_element_is_rejected() {
        let value = Value::List(vec![Value::U8(1), Value::String("x".into())]);
        assert_eq!(assign::<Vec<u8>>(value), None);
    }

    #[test]
    fn maps_collect_entries() {
        let value = Value::Map(vec![
            (Value::U64(0), Value::String("1".into())),
            (Value::U64(1), Value::String("0".into())),
        ]);
        let map = assign::<HashMap<u64, String>>(value.clone()).unwrap();
        assert_eq!(map.get(&0).map(String::as_str), Some("1"));
        assert_eq!(map.get(&1).map(String::as_str), Some("0"));
        let sorted = assign::<BTreeMap<u64, String>>(value).unwrap();
        assert_eq!(sorted.into_iter().map(|(k, _)| k).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn option_zero_is_none_only() {
        let unset: Option<u16> = None;
        let zero: Option<u16> = Some(0);
        assert!(Leaf::is_zero(&unset));
        assert!(!Leaf::is_zero(&zero));
        assert_eq!(<Option<u16> as Leaf>::kind(), Kind::U16);
        assert_eq!(assign::<Option<u16>>(Value::U16(0)), Some(Some(0)));
    }

    #[test]
    fn ip_versions_are_checked() {
        let v4 = Value::Ip("10.0.0.1".parse().unwrap());
        let v6 = Value::Ip("::1".parse().unwrap());
        assert!(assign::<Option<Ipv4Addr>>(v4.clone()).is_some());
        assert!(assign::<Option<Ipv4Addr>>(v6.clone()).is_none());
        assert!(assign::<Option<Ipv6Addr>>(v6.clone()).is_some());
        assert!(assign::<Option<IpAddr>>(v6).is_some());
    }

    #[test]
    fn kinds_describe_containers() {
        assert_eq!(<Vec<u8> as Leaf>::kind(), Kind::list(Kind::U8));
        assert_eq!(
            <HashMap<String, bool> as Leaf>::kind(),
            Kind::map(Kind::String, Kind::Bool)
        );
        assert_eq!(<PathBuf as Leaf>::kind(), Kind::String);
    }

    #[test]
    fn exported_values_round_trip() {
        let durations = vec![Duration::from_secs(1), Duration::from_millis(5)];
        let value = durations.to_value().unwrap();
        assert_eq!(assign::<Vec<Duration>>(value), Some(durations));
    }
}
