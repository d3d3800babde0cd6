//! Depth-first traversal of a record's leaf fields.
//!
//! [`walk`] is the primitive every source loader is built on: it visits each
//! leaf in declaration order with its full [`FieldPath`], asks a callback for a
//! value, and writes back whatever the callback returns. Nested records are
//! descended into, never handed to the callback; unset optional records are
//! allocated first so their fields can be written.

use tracing::trace;

use crate::error::CopreError;
use crate::leaf::Slot;
use crate::record::{Field, FieldPath, OptionalRecord, Record, Visitor};
use crate::value::{Kind, Value};

/// Per-leaf behaviour plugged into a [`Traversal`].
pub(crate) trait LeafHandler {
    fn leaf(
        &mut self,
        path: &FieldPath,
        field: &Field,
        slot: &mut dyn Slot,
    ) -> Result<(), CopreError>;

    /// Whether to allocate the unset optional record at `path` and descend
    /// into it. Set optional records are always descended into.
    fn allocate(&mut self, path: &FieldPath) -> bool {
        let _ = path;
        true
    }
}

/// A [`Visitor`] that tracks the field path, skips internal fields and
/// forwards leaves to a [`LeafHandler`].
pub(crate) struct Traversal<H> {
    path: FieldPath,
    handler: H,
}

impl<H: LeafHandler> Traversal<H> {
    pub(crate) fn run(record: &mut dyn Record, handler: H) -> Result<H, CopreError> {
        let mut traversal = Traversal {
            path: FieldPath::new(),
            handler,
        };
        record.visit(&mut traversal)?;
        Ok(traversal.handler)
    }

    fn skip(&self, field: &Field) -> bool {
        if field.is_internal() {
            trace!(path = %self.path, field = field.name(), "skipping internal field");
        }
        field.is_internal()
    }
}

impl<H: LeafHandler> Visitor for Traversal<H> {
    fn leaf(&mut self, field: &Field, slot: &mut dyn Slot) -> Result<(), CopreError> {
        if self.skip(field) {
            return Ok(());
        }
        self.path.push(field.name());
        let result = self.handler.leaf(&self.path, field, slot);
        self.path.pop();
        result
    }

    fn record(&mut self, field: &Field, record: &mut dyn Record) -> Result<(), CopreError> {
        if self.skip(field) {
            return Ok(());
        }
        self.path.push(field.name());
        let result = record.visit(self);
        self.path.pop();
        result
    }

    fn optional(
        &mut self,
        field: &Field,
        record: &mut dyn OptionalRecord,
    ) -> Result<(), CopreError> {
        if self.skip(field) {
            return Ok(());
        }
        self.path.push(field.name());
        let descend = record.present().is_some() || self.handler.allocate(&self.path);
        let result = if descend {
            record.allocate().visit(self)
        } else {
            Ok(())
        };
        self.path.pop();
        result
    }
}

struct Callback<F>(F);

impl<F> LeafHandler for Callback<F>
where
    F: FnMut(&FieldPath, &Field, &Kind) -> Result<Option<Value>, CopreError>,
{
    fn leaf(
        &mut self,
        path: &FieldPath,
        field: &Field,
        slot: &mut dyn Slot,
    ) -> Result<(), CopreError> {
        let kind = slot.kind();
        let Some(value) = (self.0)(path, field, &kind)? else {
            return Ok(());
        };
        if !slot.assign(&value) {
            return Err(CopreError::FieldTypeMismatch {
                path: path.to_string(),
                expected: kind.to_string(),
                actual: value.type_name(),
            });
        }
        trace!(path = %path, kind = %kind, "assigned field");
        Ok(())
    }
}

/// Visit every leaf of `dst` and write back the callback's answers.
///
/// The callback receives the field's path, its descriptor and its declared
/// [`Kind`]. Returning `Ok(None)` leaves the field untouched. Returning a
/// value that does not fit the field is a
/// [`FieldTypeMismatch`](CopreError::FieldTypeMismatch); any callback error
/// aborts the walk.
pub fn walk<R, F>(dst: &mut R, callback: F) -> Result<(), CopreError>
where
    R: Record,
    F: FnMut(&FieldPath, &Field, &Kind) -> Result<Option<Value>, CopreError>,
{
    Traversal::run(dst, Callback(callback)).map(drop)
}
