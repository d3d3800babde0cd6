use std::collections::VecDeque;

use crate::error::CopreError;
use crate::leaf::Slot;
use crate::record::{Field, FieldPath, Record};
use crate::value::Value;
use crate::walk::{LeafHandler, Traversal};

/// Deep-merge `src` on top of `dst`, field by field.
///
/// Every non-zero leaf of `src` overwrites the matching leaf of `dst`; zero
/// leaves leave `dst` alone. Nested records are merged recursively, never
/// replaced wholesale. An optional record unset in `dst` is allocated only if
/// `src` carries at least one non-zero leaf below it.
///
/// An explicit zero in `src` is indistinguishable from "not set" and never
/// overrides.
pub fn merge<R: Record>(dst: &mut R, mut src: R) -> Result<(), CopreError> {
    let pending = Traversal::run(&mut src, Collect::default())?.entries;
    if pending.is_empty() {
        return Ok(());
    }
    let apply = Traversal::run(dst, Apply { pending })?;
    debug_assert!(apply.pending.is_empty(), "unapplied merge entries");
    Ok(())
}

/// Gathers the non-zero leaves of the source, in walk order. Unset optional
/// records hold nothing and are not allocated.
#[derive(Default)]
struct Collect {
    entries: VecDeque<(FieldPath, Value)>,
}

impl LeafHandler for Collect {
    fn leaf(
        &mut self,
        path: &FieldPath,
        _field: &Field,
        slot: &mut dyn Slot,
    ) -> Result<(), CopreError> {
        if slot.is_zero() {
            return Ok(());
        }
        if let Some(value) = slot.value() {
            self.entries.push_back((path.clone(), value));
        }
        Ok(())
    }

    fn allocate(&mut self, _path: &FieldPath) -> bool {
        false
    }
}

/// Writes collected entries into the destination. Both walks visit leaves in
/// the same order, so entries are consumed from the front.
struct Apply {
    pending: VecDeque<(FieldPath, Value)>,
}

impl LeafHandler for Apply {
    fn leaf(
        &mut self,
        path: &FieldPath,
        _field: &Field,
        slot: &mut dyn Slot,
    ) -> Result<(), CopreError> {
        let Some((next, _)) = self.pending.front() else {
            return Ok(());
        };
        if next != path {
            return Ok(());
        }
        if let Some((path, value)) = self.pending.pop_front() {
            if !slot.assign(&value) {
                return Err(CopreError::FieldTypeMismatch {
                    path: path.to_string(),
                    expected: slot.kind().to_string(),
                    actual: value.type_name(),
                });
            }
        }
        Ok(())
    }

    fn allocate(&mut self, path: &FieldPath) -> bool {
        self.pending
            .front()
            .is_some_and(|(next, _)| next.starts_with(path))
    }
}
