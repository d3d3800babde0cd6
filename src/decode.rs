//! Decoders turning raw file bytes into a record.
//!
//! The file loader treats decoding as an opaque capability: anything
//! implementing [`Decode`] will do, including a plain closure. [`Toml`] and
//! [`Json`] cover the common formats for records that also derive
//! `serde::Deserialize`.
//!
//! Decoders merge what they read into the destination instead of replacing
//! it, so when several files are decoded into one snapshot each file only
//! overrides the fields it actually sets.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{BoxError, CopreError};
use crate::merge::merge;
use crate::record::Record;

/// Decode `bytes` into `dst`.
pub trait Decode<R> {
    fn decode(&self, bytes: &[u8], dst: &mut R) -> Result<(), BoxError>;
}

impl<R, F> Decode<R> for F
where
    F: Fn(&[u8], &mut R) -> Result<(), BoxError>,
{
    fn decode(&self, bytes: &[u8], dst: &mut R) -> Result<(), BoxError> {
        self(bytes, dst)
    }
}

/// TOML via the `toml` crate.
///
/// In strict mode, keys the record does not consume are rejected with
/// [`CopreError::UnknownKeys`], each reported with a best-effort line number.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toml {
    strict: bool,
}

impl Toml {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl<R: Record + DeserializeOwned> Decode<R> for Toml {
    fn decode(&self, bytes: &[u8], dst: &mut R) -> Result<(), BoxError> {
        let text = std::str::from_utf8(bytes)?;
        let parsed: R = if self.strict {
            parse_strict(text)?
        } else {
            toml::from_str(text)?
        };
        merge(dst, parsed)?;
        Ok(())
    }
}

fn parse_strict<R: DeserializeOwned>(text: &str) -> Result<R, BoxError> {
    let mut unknown: Vec<String> = Vec::new();
    let parsed = serde_ignored::deserialize(toml::Deserializer::new(text), |ignored| {
        unknown.push(ignored.to_string());
    })?;
    if unknown.is_empty() {
        return Ok(parsed);
    }
    debug!(count = unknown.len(), "rejecting unknown keys");
    let errors = unknown
        .into_iter()
        .map(|key| CopreError::UnknownKey {
            line: key_line(text, &key),
            key,
        })
        .collect();
    Err(Box::new(CopreError::UnknownKeys(errors)))
}

/// 1-based line of `dotted_key` in TOML `text`, or 0 if it can not be found.
///
/// Tracks `[table]` headers and matches bare or quoted keys assigned inside
/// the right table. Dotted assignments (`a.b = 1`) and inline tables are not
/// recognised.
fn key_line(text: &str, dotted_key: &str) -> usize {
    let (table, key) = match dotted_key.rsplit_once('.') {
        Some((table, key)) => (table, key),
        None => ("", dotted_key),
    };
    let mut current = String::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if let Some(header) = line.strip_prefix('[').filter(|_| !line.starts_with("[[")) {
            let name = header.split_once(']').map_or(header, |(name, _)| name);
            current = name
                .split('.')
                .map(|segment| segment.trim().trim_matches('"'))
                .collect::<Vec<_>>()
                .join(".");
            continue;
        }
        if current != table {
            continue;
        }
        let Some((lhs, _)) = line.split_once('=') else {
            continue;
        };
        if lhs.trim().trim_matches('"') == key {
            return index + 1;
        }
    }
    0
}

/// JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl<R: Record + DeserializeOwned> Decode<R> for Json {
    fn decode(&self, bytes: &[u8], dst: &mut R) -> Result<(), BoxError> {
        let parsed: R = serde_json::from_slice(bytes)?;
        merge(dst, parsed)?;
        Ok(())
    }
}
