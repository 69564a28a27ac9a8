//! Fixed-arity integer tuples.
//!
//! Beliefs are stored as all-integer tuples. Each generator owns one
//! [`TupleCache`], so descriptors are shared between beliefs of the same
//! arity within a unit and never between units.

use crate::instr::{Instr, TupleDesc, TupleId};
use thiserror::Error;
use tracing::trace;

/// Largest supported tuple arity
pub const MAX_TUPLE_ARITY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TupleError {
    #[error("tuples of arity {arity} are not supported (arity must be 1 to 8)")]
    UnsupportedArity { arity: usize },

    #[error("index {index} is out of range for a tuple of arity {arity}")]
    IndexOutOfRange { arity: usize, index: usize },
}

/// Arity-indexed descriptor cache
#[derive(Debug, Clone, Default)]
pub struct TupleCache {
    by_arity: [Option<TupleId>; MAX_TUPLE_ARITY],
    descriptors: Vec<TupleDesc>,
}

impl TupleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The descriptor for `arity`, created on first use.
    pub fn describe(&mut self, arity: usize) -> Result<TupleId, TupleError> {
        if arity == 0 || arity > MAX_TUPLE_ARITY {
            return Err(TupleError::UnsupportedArity { arity });
        }

        if let Some(id) = self.by_arity[arity - 1] {
            return Ok(id);
        }

        let id = TupleId(self.descriptors.len() as u32);
        self.descriptors.push(TupleDesc {
            id,
            arity: arity as u8,
        });
        self.by_arity[arity - 1] = Some(id);
        trace!(%id, arity, "new tuple descriptor");
        Ok(id)
    }

    /// Pack the top `arity` stack values into one tuple.
    pub fn emit_create(&mut self, arity: usize, code: &mut Vec<Instr>) -> Result<(), TupleError> {
        let id = self.describe(arity)?;
        code.push(Instr::MakeTuple(id));
        Ok(())
    }

    /// Replace the tuple on top of the stack with its `index`-th element.
    pub fn emit_projection(
        &mut self,
        arity: usize,
        index: usize,
        code: &mut Vec<Instr>,
    ) -> Result<(), TupleError> {
        let id = self.describe(arity)?;
        if index >= arity {
            return Err(TupleError::IndexOutOfRange { arity, index });
        }
        code.push(Instr::TupleGet(id, index as u8));
        Ok(())
    }

    pub fn descriptors(&self) -> &[TupleDesc] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<TupleDesc> {
        self.descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_arity_bounds() {
        let mut cache = TupleCache::new();
        assert_eq!(
            cache.describe(0),
            Err(TupleError::UnsupportedArity { arity: 0 })
        );
        assert_eq!(
            cache.describe(9),
            Err(TupleError::UnsupportedArity { arity: 9 })
        );
        assert!(cache.describe(8).is_ok());
        assert!(cache.describe(1).is_ok());
    }

    #[test]
    fn test_descriptors_are_cached_by_arity() {
        let mut cache = TupleCache::new();
        let two = cache.describe(2).unwrap();
        let one = cache.describe(1).unwrap();
        assert_eq!(cache.describe(2).unwrap(), two);
        assert_ne!(one, two);
        assert_eq!(
            cache.descriptors(),
            &[
                TupleDesc { id: two, arity: 2 },
                TupleDesc { id: one, arity: 1 },
            ]
        );
    }

    #[test]
    fn test_caches_are_independent() {
        let mut first = TupleCache::new();
        let mut second = TupleCache::new();
        first.describe(3).unwrap();
        assert_eq!(second.describe(5).unwrap(), TupleId(0));
        assert_eq!(first.descriptors().len(), 1);
    }

    #[test]
    fn test_emit_create_and_projection() {
        let mut cache = TupleCache::new();
        let mut code = Vec::new();
        cache.emit_create(3, &mut code).unwrap();
        cache.emit_projection(3, 2, &mut code).unwrap();
        assert_eq!(
            code,
            vec![Instr::MakeTuple(TupleId(0)), Instr::TupleGet(TupleId(0), 2)]
        );
    }

    #[test]
    fn test_projection_index_checked() {
        let mut cache = TupleCache::new();
        let mut code = Vec::new();
        assert_eq!(
            cache.emit_projection(2, 2, &mut code),
            Err(TupleError::IndexOutOfRange { arity: 2, index: 2 })
        );
        assert!(code.is_empty());
    }

    #[test]
    fn test_error_message() {
        let err = TupleError::UnsupportedArity { arity: 9 };
        assert_eq!(
            err.to_string(),
            "tuples of arity 9 are not supported (arity must be 1 to 8)"
        );
    }
}
