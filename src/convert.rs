//! String-to-value conversion for environment variables and other textual
//! sources.
//!
//! [`Converter::convert`] turns one input string into a [`Value`] of the
//! requested [`Kind`]:
//!
//! | Kind | Accepted input |
//! |------|----------------|
//! | integers | decimal, `0x` hex, `0o`/leading-`0` octal, `0b` binary, `_` separators |
//! | floats | anything `f64::from_str` accepts, range-checked for `f32` |
//! | `bool` | `1 t T TRUE true True` / `0 f F FALSE false False` |
//! | list | elements split on the list delimiter (default `,`) |
//! | map | entries split on the entry delimiter (`,`), then on `=` |
//! | ip / mask / cidr | `10.0.0.1`, `255.255.255.0` or `ffffff00`, `10.0.0.0/8` |
//! | duration | `5s`, `250ms`, `1h 30m` |
//! | hex / base64 bytes | marker kinds, decoded into raw bytes |
//!
//! Numbers are parsed at 64-bit width and then narrowed to the exact requested
//! width; narrowing that would lose information is an error.

use std::net::IpAddr;
use std::num::IntErrorKind;
use std::time::Duration;

use base64::Engine as _;
use ipnet::IpNet;

use crate::error::ConvertError;
use crate::value::{Ipv4Mask, Kind, Value};

/// Delimiter configuration for sequence and map conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converter {
    list_delimiter: String,
    map_delimiter: String,
    map_kv_delimiter: String,
}

impl Default for Converter {
    fn default() -> Self {
        Self {
            list_delimiter: ",".into(),
            map_delimiter: ",".into(),
            map_kv_delimiter: "=".into(),
        }
    }
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delimiter between list elements (default `,`).
    pub fn list_delimiter(mut self, delimiter: &str) -> Self {
        self.list_delimiter = delimiter.to_string();
        self
    }

    /// Delimiter between map entries (default `,`).
    pub fn map_delimiter(mut self, delimiter: &str) -> Self {
        self.map_delimiter = delimiter.to_string();
        self
    }

    /// Delimiter between a map key and its value (default `=`).
    pub fn map_kv_delimiter(mut self, delimiter: &str) -> Self {
        self.map_kv_delimiter = delimiter.to_string();
        self
    }

    /// Convert `input` into a value of `kind`.
    ///
    /// An empty input converts to a single-element list for list kinds: the
    /// split always yields at least one segment.
    pub fn convert(&self, kind: &Kind, input: &str) -> Result<Value, ConvertError> {
        let value = match kind {
            Kind::String => Value::String(input.to_string()),
            Kind::Bool => Value::Bool(parse_bool(input)?),
            Kind::I8 => Value::I8(narrow(parse_signed(input, kind)?, input, kind)?),
            Kind::I16 => Value::I16(narrow(parse_signed(input, kind)?, input, kind)?),
            Kind::I32 => Value::I32(narrow(parse_signed(input, kind)?, input, kind)?),
            Kind::I64 => Value::I64(parse_signed(input, kind)?),
            Kind::Isize => Value::Isize(narrow(parse_signed(input, kind)?, input, kind)?),
            Kind::U8 => Value::U8(narrow(parse_unsigned(input, kind)?, input, kind)?),
            Kind::U16 => Value::U16(narrow(parse_unsigned(input, kind)?, input, kind)?),
            Kind::U32 => Value::U32(narrow(parse_unsigned(input, kind)?, input, kind)?),
            Kind::U64 => Value::U64(parse_unsigned(input, kind)?),
            Kind::Usize => Value::Usize(narrow(parse_unsigned(input, kind)?, input, kind)?),
            Kind::F32 => Value::F32(parse_f32(input)?),
            Kind::F64 => Value::F64(parse_float(input, kind)?),
            Kind::HexBytes => Value::Bytes(hex::decode(input).map_err(|e| {
                ConvertError::Encoding {
                    input: input.to_string(),
                    encoding: "hex",
                    reason: e.to_string(),
                }
            })?),
            Kind::Base64Bytes => Value::Bytes(
                base64::engine::general_purpose::STANDARD
                    .decode(input)
                    .map_err(|e| ConvertError::Encoding {
                        input: input.to_string(),
                        encoding: "base64",
                        reason: e.to_string(),
                    })?,
            ),
            Kind::Ip => Value::Ip(composite::<IpAddr>(input, kind)?),
            Kind::IpMask => Value::IpMask(composite::<Ipv4Mask>(input, kind)?),
            Kind::Cidr => Value::Cidr(composite::<IpNet>(input, kind)?),
            Kind::Duration => Value::Duration(parse_duration(input)?),
            Kind::List(elem) => Value::List(
                input
                    .split(self.list_delimiter.as_str())
                    .map(|segment| self.convert(elem, segment))
                    .collect::<Result<_, _>>()?,
            ),
            Kind::Map(key, value) => Value::Map(self.convert_map(key, value, input)?),
            Kind::Record(_) => return Err(ConvertError::UnsupportedType(kind.clone())),
        };
        Ok(value)
    }

    fn convert_map(
        &self,
        key: &Kind,
        value: &Kind,
        input: &str,
    ) -> Result<Vec<(Value, Value)>, ConvertError> {
        input
            .split(self.map_delimiter.as_str())
            .map(|entry| {
                let parts: Vec<&str> = entry.split(self.map_kv_delimiter.as_str()).collect();
                match parts.as_slice() {
                    [k, v] => Ok((self.convert(key, k)?, self.convert(value, v)?)),
                    _ => Err(ConvertError::MalformedEntry {
                        entry: entry.to_string(),
                        delimiter: self.map_kv_delimiter.clone(),
                    }),
                }
            })
            .collect()
    }

    /// Render a value back into the textual form [`convert`](Self::convert)
    /// accepts, using this converter's delimiters. Bytes render as hex.
    pub fn render(&self, value: &Value) -> String {
        match value {
            Value::Bool(v) => v.to_string(),
            Value::I8(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::Isize(v) => v.to_string(),
            Value::U8(v) => v.to_string(),
            Value::U16(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::Usize(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Bytes(v) => hex::encode(v),
            Value::Ip(v) => v.to_string(),
            Value::IpMask(v) => v.to_string(),
            Value::Cidr(v) => v.to_string(),
            Value::Duration(v) => humantime::format_duration(*v).to_string(),
            Value::List(items) => items
                .iter()
                .map(|item| self.render(item))
                .collect::<Vec<_>>()
                .join(self.list_delimiter.as_str()),
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| format!("{}{}{}", self.render(k), self.map_kv_delimiter, self.render(v)))
                .collect::<Vec<_>>()
                .join(self.map_delimiter.as_str()),
        }
    }
}

/// Shorthand for [`Converter::convert`] with default delimiters.
pub fn convert(kind: &Kind, input: &str) -> Result<Value, ConvertError> {
    Converter::default().convert(kind, input)
}

fn parse_bool(input: &str) -> Result<bool, ConvertError> {
    match input {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ConvertError::Parse {
            input: input.to_string(),
            kind: Kind::Bool,
            reason: "expected one of 1, t, true, 0, f, false".into(),
        }),
    }
}

/// Split off the radix prefix and strip `_` separators. A separator may
/// follow the prefix directly (`0x_1F`, `0_7`); otherwise it must sit between
/// two digits.
fn digits_and_radix(body: &str) -> Option<(String, u32)> {
    let lower = body.get(..2).map(str::to_ascii_lowercase);
    let (digits, radix) = match lower.as_deref() {
        Some("0x") => (&body[2..], 16),
        Some("0o") => (&body[2..], 8),
        Some("0b") => (&body[2..], 2),
        _ if body.len() > 1 && body.starts_with('0') => (&body[1..], 8),
        _ => (body, 10),
    };
    let digits = if radix == 10 {
        digits
    } else {
        digits.strip_prefix('_').unwrap_or(digits)
    };
    if digits.is_empty()
        || digits.starts_with(['+', '-'])
        || !separated(digits, |c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some((digits.replace('_', ""), radix))
}

/// Every `_` in `s` has a digit on both sides.
fn separated(s: &str, is_digit: impl Fn(char) -> bool) -> bool {
    let chars: Vec<char> = s.chars().collect();
    chars.iter().enumerate().all(|(i, &c)| {
        c != '_'
            || (i > 0
                && is_digit(chars[i - 1])
                && chars.get(i + 1).is_some_and(|&next| is_digit(next)))
    })
}

fn parse_magnitude(body: &str, input: &str, kind: &Kind) -> Result<u64, ConvertError> {
    let syntax = || ConvertError::Parse {
        input: input.to_string(),
        kind: kind.clone(),
        reason: "invalid syntax".into(),
    };
    let (digits, radix) = digits_and_radix(body).ok_or_else(syntax)?;
    u64::from_str_radix(&digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ConvertError::OutOfRange {
            input: input.to_string(),
            kind: kind.clone(),
        },
        _ => syntax(),
    })
}

fn parse_signed(input: &str, kind: &Kind) -> Result<i64, ConvertError> {
    let (negative, body) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    let magnitude = i128::from(parse_magnitude(body, input, kind)?);
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).map_err(|_| ConvertError::OutOfRange {
        input: input.to_string(),
        kind: kind.clone(),
    })
}

fn parse_unsigned(input: &str, kind: &Kind) -> Result<u64, ConvertError> {
    if input.starts_with(['-', '+']) {
        return Err(ConvertError::Parse {
            input: input.to_string(),
            kind: kind.clone(),
            reason: "invalid syntax".into(),
        });
    }
    parse_magnitude(input, input, kind)
}

/// Narrow a natively parsed number to the requested width, exactly.
fn narrow<N, T: TryFrom<N>>(value: N, input: &str, kind: &Kind) -> Result<T, ConvertError> {
    T::try_from(value).map_err(|_| ConvertError::OutOfRange {
        input: input.to_string(),
        kind: kind.clone(),
    })
}

fn parse_float(input: &str, kind: &Kind) -> Result<f64, ConvertError> {
    if !separated(input, |c| c.is_ascii_digit()) {
        return Err(ConvertError::Parse {
            input: input.to_string(),
            kind: kind.clone(),
            reason: "misplaced '_' separator".into(),
        });
    }
    input
        .replace('_', "")
        .parse::<f64>()
        .map_err(|e| ConvertError::Parse {
            input: input.to_string(),
            kind: kind.clone(),
            reason: e.to_string(),
        })
}

fn parse_f32(input: &str) -> Result<f32, ConvertError> {
    let wide = parse_float(input, &Kind::F32)?;
    if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
        return Err(ConvertError::OutOfRange {
            input: input.to_string(),
            kind: Kind::F32,
        });
    }
    Ok(wide as f32)
}

fn composite<T>(input: &str, kind: &Kind) -> Result<T, ConvertError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    input.parse::<T>().map_err(|e| ConvertError::CompositeParse {
        input: input.to_string(),
        kind: kind.clone(),
        reason: e.to_string(),
    })
}

fn parse_duration(input: &str) -> Result<Duration, ConvertError> {
    humantime::parse_duration(input).map_err(|e| ConvertError::CompositeParse {
        input: input.to_string(),
        kind: Kind::Duration,
        reason: e.to_string(),
    })
}
