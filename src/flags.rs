//! Command-line flags as a configuration source.
//!
//! The flag parser itself lives outside this crate. Anything that can list its
//! flags as [`Flag`]s implements [`FlagStore`]; [`MemoryFlags`] is a plain
//! in-memory store and, with the `clap` feature, `ClapFlags` adapts parsed
//! clap matches.
//!
//! Only fields annotated with `flag:"<name>"` are looked up. By default flags
//! the user did not pass are ignored so their defaults do not count as
//! configuration; zero and empty values are always ignored.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::CopreError;
use crate::loader::Loader;
use crate::record::{Field, Record};
use crate::value::Value;
use crate::walk::walk;

/// One flag as reported by a [`FlagStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    pub name: String,
    pub value: Value,
    /// Whether the user set the flag explicitly, as opposed to it holding
    /// its default.
    pub changed: bool,
}

/// A read-only, enumerable collection of typed flags.
pub trait FlagStore {
    fn flags(&self) -> Vec<Flag>;
}

/// Flags held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryFlags {
    flags: Vec<Flag>,
}

impl MemoryFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag the user passed.
    pub fn set(mut self, name: &str, value: Value) -> Self {
        self.push(name, value, true);
        self
    }

    /// A flag left at its default.
    pub fn default_value(mut self, name: &str, value: Value) -> Self {
        self.push(name, value, false);
        self
    }

    fn push(&mut self, name: &str, value: Value, changed: bool) {
        self.flags.retain(|f| f.name != name);
        self.flags.push(Flag {
            name: name.to_string(),
            value,
            changed,
        });
    }
}

impl FlagStore for MemoryFlags {
    fn flags(&self) -> Vec<Flag> {
        self.flags.clone()
    }
}

/// Name to value map of the flags that count as configuration input.
pub fn collect_flags(store: &dyn FlagStore, include_unchanged: bool) -> HashMap<String, Value> {
    store
        .flags()
        .into_iter()
        .filter(|flag| {
            if !flag.changed && !include_unchanged {
                trace!(flag = %flag.name, "skipping unchanged flag");
                return false;
            }
            if flag.value.is_zero() {
                trace!(flag = %flag.name, "skipping zero-valued flag");
                return false;
            }
            true
        })
        .map(|flag| (flag.name, flag.value))
        .collect()
}

/// Populates a snapshot from a [`FlagStore`].
#[derive(Clone, Copy)]
pub struct FlagLoader<'a> {
    store: &'a dyn FlagStore,
    include_unchanged: bool,
}

impl<'a> FlagLoader<'a> {
    pub fn new(store: &'a dyn FlagStore) -> Self {
        Self {
            store,
            include_unchanged: false,
        }
    }

    /// Treat flags the user did not pass, i.e. their defaults, as input too.
    pub fn include_unchanged(mut self, include: bool) -> Self {
        self.include_unchanged = include;
        self
    }
}

/// The flag name a field is bound to: the first comma-separated part of its
/// `flag` annotation.
fn flag_name(field: &Field) -> Option<&'static str> {
    field
        .tag("flag")
        .and_then(|tag| tag.split(',').next())
        .filter(|name| !name.is_empty())
}

impl<R: Record> Loader<R> for FlagLoader<'_> {
    fn load(&self, dst: &mut R) -> Result<(), CopreError> {
        let flags = collect_flags(self.store, self.include_unchanged);
        debug!(count = flags.len(), include_unchanged = self.include_unchanged, "collected flags");
        walk(dst, |path, field, _| {
            let Some(name) = flag_name(field) else {
                return Ok(None);
            };
            let value = flags.get(name).cloned();
            if value.is_some() {
                debug!(path = %path, flag = name, "resolved from flag");
            }
            Ok(value)
        })
    }

    fn name(&self) -> &str {
        if self.include_unchanged {
            "flag defaults"
        } else {
            "flags"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Listener, Server};
    use crate::loader;

    fn load(loader: FlagLoader<'_>) -> Result<Server, CopreError> {
        let mut server = Server::default();
        loader.load(&mut server)?;
        Ok(server)
    }

    #[test]
    fn changed_flags_populate_annotated_fields() {
        let flags = MemoryFlags::new()
            .set("host", Value::String("flag-host".into()))
            .set("port", Value::U16(9090));
        let server = load(FlagLoader::new(&flags)).unwrap();
        assert_eq!(server.host, "flag-host");
        assert_eq!(server.port, 9090);
    }

    #[test]
    fn unchanged_flags_are_skipped_by_default() {
        let flags = MemoryFlags::new().default_value("port", Value::U16(8080));
        assert_eq!(load(FlagLoader::new(&flags)).unwrap().port, 0);
        let server = load(FlagLoader::new(&flags).include_unchanged(true)).unwrap();
        assert_eq!(server.port, 8080);
    }

    #[test]
    fn zero_and_empty_values_are_dropped() {
        let flags = MemoryFlags::new()
            .set("port", Value::U16(0))
            .set("host", Value::String(String::new()))
            .set("tags", Value::List(vec![]));
        let collected = collect_flags(&flags, true);
        assert!(collected.is_empty());
    }

    #[test]
    fn unannotated_fields_are_not_looked_up() {
        let flags = MemoryFlags::new().set("Database.PoolSize", Value::U32(4));
        assert_eq!(load(FlagLoader::new(&flags)).unwrap().database.pool_size, 0);
    }

    #[test]
    fn wrong_value_type_is_a_mismatch() {
        let flags = MemoryFlags::new().set("port", Value::I32(8080));
        let err = load(FlagLoader::new(&flags)).unwrap_err();
        match err {
            CopreError::FieldTypeMismatch {
                path,
                expected,
                actual,
            } => {
                assert_eq!(path, "Port");
                assert_eq!(expected, "u16");
                assert_eq!(actual, "i32");
            }
            other => panic!("expected FieldTypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn later_definition_of_a_flag_replaces_earlier() {
        let flags = MemoryFlags::new()
            .default_value("port", Value::U16(1))
            .set("port", Value::U16(2));
        assert_eq!(flags.flags().len(), 1);
        assert_eq!(load(FlagLoader::new(&flags)).unwrap().port, 2);
    }

    #[test]
    fn flag_name_is_first_tag_segment() {
        let field = Field::new("Verbose").tags(&[("flag", "verbose,v")]);
        assert_eq!(flag_name(&field), Some("verbose"));
        assert_eq!(flag_name(&Field::new("Quiet").tags(&[("flag", "")])), None);
        assert_eq!(flag_name(&Field::new("Quiet")), None);
    }

    #[test]
    fn unspecified_address_flag_overrides_default() {
        let flags = MemoryFlags::new()
            .set("bind", Value::Ip("0.0.0.0".parse().unwrap()))
            .set("allow", Value::Cidr("0.0.0.0/0".parse().unwrap()));
        assert_eq!(collect_flags(&flags, false).len(), 2);

        let mut listener = Listener::default();
        loader::load(&mut listener, &[&FlagLoader::new(&flags)]).unwrap();
        assert_eq!(listener.bind, "0.0.0.0".parse::<std::net::IpAddr>().unwrap());
        assert_eq!(listener.allow, "0.0.0.0/0".parse::<ipnet::IpNet>().unwrap());
        assert_eq!(listener.mask, Listener::default().mask);
    }
}
