//! Typed values and the type descriptors they are checked against.
//!
//! [`Value`] is the currency passed between the converter, the loaders and the
//! record walker. Every supported leaf type has exactly one variant, plus
//! [`List`](Value::List) and [`Map`](Value::Map) for the recursive shapes.
//! [`Kind`] describes what a destination field accepts; the walker refuses to
//! write a value whose shape does not match.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use ipnet::IpNet;
use thiserror::Error;

/// A dynamically typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    String(String),
    /// Raw bytes, as produced by the hex and base64 marker kinds.
    Bytes(Vec<u8>),
    Ip(IpAddr),
    IpMask(Ipv4Mask),
    Cidr(IpNet),
    Duration(Duration),
    List(Vec<Value>),
    /// Key/value pairs. Order carries no meaning.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Whether this is the zero/empty value of its type.
    ///
    /// Zero values never override anything during a merge and are dropped
    /// when collecting flags.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Bool(v) => !v,
            Value::I8(v) => *v == 0,
            Value::I16(v) => *v == 0,
            Value::I32(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::Isize(v) => *v == 0,
            Value::U8(v) => *v == 0,
            Value::U16(v) => *v == 0,
            Value::U32(v) => *v == 0,
            Value::U64(v) => *v == 0,
            Value::Usize(v) => *v == 0,
            Value::F32(v) => *v == 0.0,
            Value::F64(v) => *v == 0.0,
            Value::String(v) => v.is_empty(),
            Value::Bytes(v) => v.is_empty(),
            Value::Ip(_) | Value::IpMask(_) | Value::Cidr(_) => false,
            Value::Duration(v) => v.is_zero(),
            Value::List(v) => v.is_empty(),
            Value::Map(v) => v.is_empty(),
        }
    }

    /// Human-readable type of this value, used in mismatch errors.
    pub fn type_name(&self) -> String {
        match self {
            Value::Bool(_) => "bool".into(),
            Value::I8(_) => "i8".into(),
            Value::I16(_) => "i16".into(),
            Value::I32(_) => "i32".into(),
            Value::I64(_) => "i64".into(),
            Value::Isize(_) => "isize".into(),
            Value::U8(_) => "u8".into(),
            Value::U16(_) => "u16".into(),
            Value::U32(_) => "u32".into(),
            Value::U64(_) => "u64".into(),
            Value::Usize(_) => "usize".into(),
            Value::F32(_) => "f32".into(),
            Value::F64(_) => "f64".into(),
            Value::String(_) => "string".into(),
            Value::Bytes(_) => "bytes".into(),
            Value::Ip(_) => "ip".into(),
            Value::IpMask(_) => "ipv4 mask".into(),
            Value::Cidr(_) => "cidr".into(),
            Value::Duration(_) => "duration".into(),
            Value::List(items) => match items.first() {
                Some(first) => format!("list<{}>", first.type_name()),
                None => "list<_>".into(),
            },
            Value::Map(entries) => match entries.first() {
                Some((k, v)) => format!("map<{}, {}>", k.type_name(), v.type_name()),
                None => "map<_, _>".into(),
            },
        }
    }
}

/// The declared type of a destination field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    String,
    /// Marker: decode the input as hexadecimal into bytes.
    HexBytes,
    /// Marker: decode the input as standard base64 into bytes.
    Base64Bytes,
    Ip,
    IpMask,
    Cidr,
    Duration,
    List(Box<Kind>),
    Map(Box<Kind>, Box<Kind>),
    /// A nested record. Never a valid conversion target.
    Record(&'static str),
}

impl Kind {
    pub fn list(elem: Kind) -> Self {
        Kind::List(Box::new(elem))
    }

    pub fn map(key: Kind, value: Kind) -> Self {
        Kind::Map(Box::new(key), Box::new(value))
    }

    /// True for byte sequences (`Vec<u8>` and friends), the only kinds that
    /// accept the hex and base64 markers.
    pub fn is_bytes(&self) -> bool {
        matches!(self, Kind::List(elem) if **elem == Kind::U8)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Bool => write!(f, "bool"),
            Kind::I8 => write!(f, "i8"),
            Kind::I16 => write!(f, "i16"),
            Kind::I32 => write!(f, "i32"),
            Kind::I64 => write!(f, "i64"),
            Kind::Isize => write!(f, "isize"),
            Kind::U8 => write!(f, "u8"),
            Kind::U16 => write!(f, "u16"),
            Kind::U32 => write!(f, "u32"),
            Kind::U64 => write!(f, "u64"),
            Kind::Usize => write!(f, "usize"),
            Kind::F32 => write!(f, "f32"),
            Kind::F64 => write!(f, "f64"),
            Kind::String => write!(f, "string"),
            Kind::HexBytes => write!(f, "hex bytes"),
            Kind::Base64Bytes => write!(f, "base64 bytes"),
            Kind::Ip => write!(f, "ip"),
            Kind::IpMask => write!(f, "ipv4 mask"),
            Kind::Cidr => write!(f, "cidr"),
            Kind::Duration => write!(f, "duration"),
            Kind::List(elem) => write!(f, "list<{elem}>"),
            Kind::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Kind::Record(name) => write!(f, "record {name}"),
        }
    }
}

/// A contiguous IPv4 subnet mask such as `255.255.255.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Mask(Ipv4Addr);

impl Ipv4Mask {
    /// Wrap `addr` if its set bits are contiguous from the top.
    pub fn new(addr: Ipv4Addr) -> Option<Self> {
        let bits = u32::from(addr);
        if bits.leading_ones() + bits.trailing_zeros() == 32 {
            Some(Self(addr))
        } else {
            None
        }
    }

    pub fn from_prefix_len(len: u8) -> Option<Self> {
        match len {
            0 => Some(Self(Ipv4Addr::UNSPECIFIED)),
            1..=32 => Some(Self(Ipv4Addr::from(u32::MAX << (32 - u32::from(len))))),
            _ => None,
        }
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.0
    }

    pub fn prefix_len(&self) -> u8 {
        // leading_ones of a u32 is at most 32
        u32::from(self.0).leading_ones() as u8
    }
}

impl Default for Ipv4Mask {
    fn default() -> Self {
        Self(Ipv4Addr::UNSPECIFIED)
    }
}

impl fmt::Display for Ipv4Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid IPv4 mask '{0}'")]
pub struct InvalidMask(String);

impl FromStr for Ipv4Mask {
    type Err = InvalidMask;

    /// Accepts dotted form (`255.255.0.0`) or eight hex digits (`ffff0000`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr = if s.len() == 8 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            u32::from_str_radix(s, 16).ok().map(Ipv4Addr::from)
        } else {
            s.parse::<Ipv4Addr>().ok()
        };
        addr.and_then(Ipv4Mask::new)
            .ok_or_else(|| InvalidMask(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values() {
        assert!(Value::Bool(false).is_zero());
        assert!(Value::U16(0).is_zero());
        assert!(Value::String(String::new()).is_zero());
        assert!(Value::List(vec![]).is_zero());
        assert!(Value::Duration(Duration::ZERO).is_zero());
        assert!(!Value::Bool(true).is_zero());
        assert!(!Value::F64(0.5).is_zero());
        assert!(!Value::List(vec![Value::U8(0)]).is_zero());
    }

    #[test]
    fn unspecified_networks_are_values() {
        assert!(!Value::Ip("0.0.0.0".parse().unwrap()).is_zero());
        assert!(!Value::Ip("::".parse().unwrap()).is_zero());
        assert!(!Value::IpMask(Ipv4Mask::default()).is_zero());
        assert!(!Value::Cidr("0.0.0.0/0".parse().unwrap()).is_zero());
    }

    #[test]
    fn type_names_describe_nesting() {
        let list = Value::List(vec![Value::U8(1)]);
        assert_eq!(list.type_name(), "list<u8>");
        let map = Value::Map(vec![(Value::U64(0), Value::String("1".into()))]);
        assert_eq!(map.type_name(), "map<u64, string>");
        assert_eq!(Value::List(vec![]).type_name(), "list<_>");
    }

    #[test]
    fn kind_display() {
        assert_eq!(Kind::list(Kind::U8).to_string(), "list<u8>");
        assert_eq!(
            Kind::map(Kind::U64, Kind::String).to_string(),
            "map<u64, string>"
        );
        assert_eq!(Kind::Record("Database").to_string(), "record Database");
    }

    #[test]
    fn bytes_kind_detection() {
        assert!(Kind::list(Kind::U8).is_bytes());
        assert!(!Kind::list(Kind::U16).is_bytes());
        assert!(!Kind::String.is_bytes());
    }

    #[test]
    fn mask_parses_dotted_and_hex() {
        let dotted: Ipv4Mask = "255.255.255.0".parse().unwrap();
        let hex: Ipv4Mask = "ffffff00".parse().unwrap();
        assert_eq!(dotted, hex);
        assert_eq!(dotted.prefix_len(), 24);
        assert_eq!(Ipv4Mask::from_prefix_len(24), Some(dotted));
    }

    #[test]
    fn mask_rejects_non_contiguous() {
        assert!("255.0.255.0".parse::<Ipv4Mask>().is_err());
        assert!("not-a-mask".parse::<Ipv4Mask>().is_err());
        assert_eq!(Ipv4Mask::from_prefix_len(33), None);
    }
}
