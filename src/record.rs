//! Destination records and their field descriptor tables.
//!
//! A configuration type becomes loadable by implementing [`Record`]: its
//! `visit` method hands every field, in declaration order, to a [`Visitor`].
//! Leaves go through [`Visitor::leaf`], nested records through
//! [`Visitor::record`], and `Option`al nested records through
//! [`Visitor::optional`] so walkers can allocate them on demand.
//!
//! ```
//! use copre::{CopreError, Field, Record, Visitor};
//!
//! #[derive(Default)]
//! struct Database {
//!     url: String,
//!     pool_size: u32,
//! }
//!
//! impl Record for Database {
//!     fn visit(&mut self, v: &mut dyn Visitor) -> Result<(), CopreError> {
//!         v.leaf(&Field::new("Url").tags(&[("env", "DATABASE_URL,noprefix")]), &mut self.url)?;
//!         v.leaf(&Field::new("PoolSize").tags(&[("flag", "pool-size")]), &mut self.pool_size)
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use tracing::trace;

use crate::error::CopreError;
use crate::leaf::Slot;

/// Static metadata for one field: its name and per-source annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    tags: &'static [(&'static str, &'static str)],
    internal: bool,
}

impl Field {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            tags: &[],
            internal: false,
        }
    }

    /// Attach annotations, e.g. `&[("env", "HOST,noprefix"), ("flag", "host")]`.
    pub const fn tags(self, tags: &'static [(&'static str, &'static str)]) -> Self {
        Self { tags, ..self }
    }

    /// Mark the field as internal state. Internal fields are never visited by
    /// walkers and can not be targeted by any source.
    pub const fn internal(self) -> Self {
        Self {
            internal: true,
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The raw annotation for `key`, if any.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }
}

/// Field names from the root record down to one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<&'static str>);

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[&'static str] {
        &self.0
    }

    pub fn last(&self) -> Option<&'static str> {
        self.0.last().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `prefix` names this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub(crate) fn push(&mut self, segment: &'static str) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl From<&[&'static str]> for FieldPath {
    fn from(segments: &[&'static str]) -> Self {
        Self(segments.to_vec())
    }
}

impl<const N: usize> From<[&'static str; N]> for FieldPath {
    fn from(segments: [&'static str; N]) -> Self {
        Self(segments.to_vec())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A configuration record with a statically declared field table.
pub trait Record {
    /// Hand every field to `visitor`, in declaration order.
    fn visit(&mut self, visitor: &mut dyn Visitor) -> Result<(), CopreError>;
}

/// Receives the fields of a [`Record`] during a walk.
pub trait Visitor {
    fn leaf(&mut self, field: &Field, slot: &mut dyn Slot) -> Result<(), CopreError>;

    fn record(&mut self, field: &Field, record: &mut dyn Record) -> Result<(), CopreError>;

    fn optional(
        &mut self,
        field: &Field,
        record: &mut dyn OptionalRecord,
    ) -> Result<(), CopreError>;
}

/// A nested record that may be unset.
pub trait OptionalRecord {
    /// The record, if it is set.
    fn present(&mut self) -> Option<&mut dyn Record>;

    /// The record, allocating a default one first if it is unset.
    fn allocate(&mut self) -> &mut dyn Record;

    /// A fresh default instance, for inspecting the field table without
    /// touching this field.
    fn blank(&self) -> Box<dyn Record>;
}

impl<R: Record + Default + 'static> OptionalRecord for Option<R> {
    fn present(&mut self) -> Option<&mut dyn Record> {
        self.as_mut().map(|r| r as &mut dyn Record)
    }

    fn allocate(&mut self) -> &mut dyn Record {
        self.get_or_insert_with(R::default)
    }

    fn blank(&self) -> Box<dyn Record> {
        Box::new(R::default())
    }
}

/// Check the descriptor table of `record`: at every nesting level field names
/// must be non-empty, free of `.` and unique. Optional records are checked
/// through a blank instance so the destination is not modified.
pub(crate) fn validate(record: &mut dyn Record) -> Result<(), CopreError> {
    let mut validator = Validator {
        path: FieldPath::new(),
        levels: vec![HashSet::new()],
    };
    record.visit(&mut validator)
}

struct Validator {
    path: FieldPath,
    levels: Vec<HashSet<&'static str>>,
}

impl Validator {
    fn check(&mut self, field: &Field) -> Result<(), CopreError> {
        let name = field.name();
        let invalid = |reason: String| CopreError::InvalidDestination { reason };
        if name.is_empty() {
            let reason = if self.path.is_empty() {
                "field with an empty name at the root record".to_string()
            } else {
                format!("field with an empty name under '{}'", self.path)
            };
            return Err(invalid(reason));
        }
        if name.contains('.') {
            return Err(invalid(format!("field name '{name}' contains '.'")));
        }
        let fresh = self.levels.last_mut().is_some_and(|seen| seen.insert(name));
        if !fresh {
            let mut path = self.path.clone();
            path.push(name);
            return Err(invalid(format!("duplicate field '{path}'")));
        }
        Ok(())
    }

    fn descend(&mut self, field: &Field, record: &mut dyn Record) -> Result<(), CopreError> {
        self.path.push(field.name());
        self.levels.push(HashSet::new());
        let result = record.visit(self);
        self.levels.pop();
        self.path.pop();
        result
    }
}

impl Visitor for Validator {
    fn leaf(&mut self, field: &Field, _slot: &mut dyn Slot) -> Result<(), CopreError> {
        if field.is_internal() {
            return Ok(());
        }
        self.check(field)
    }

    fn record(&mut self, field: &Field, record: &mut dyn Record) -> Result<(), CopreError> {
        if field.is_internal() {
            return Ok(());
        }
        self.check(field)?;
        self.descend(field, record)
    }

    fn optional(
        &mut self,
        field: &Field,
        record: &mut dyn OptionalRecord,
    ) -> Result<(), CopreError> {
        if field.is_internal() {
            return Ok(());
        }
        self.check(field)?;
        trace!(field = field.name(), "validating optional record through a blank instance");
        let mut blank = record.blank();
        self.descend(field, blank.as_mut())
    }
}
