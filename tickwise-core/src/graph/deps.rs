//! Dependency Descriptors
//!
//! Every slot records its parents in two id-sized fields, so the common
//! shapes need no per-node allocation:
//!
//! | parents | `field0`             | `field1`            |
//! |---------|----------------------|---------------------|
//! | 0       | 0                    | 0                   |
//! | 1       | 1                    | parent              |
//! | 2       | parent0 \| `TAG_BIT` | parent1             |
//! | n > 2   | n                    | offset into pool    |
//!
//! Two parents (the merge shape) stay inline. They are told apart from the
//! pooled case by the tag bit, which is why raw ids and pooled parent counts
//! must stay below it. The pool offset in `field1` is never tested for the
//! tag, so it may use the full id width. Pooled lists live in a shared,
//! append-only [`GrowBuffer`], each owning the range `[offset, offset + n)`.
//!
//! [`Deps`] is the decoded form. It is what the engine matches on.

use std::iter::Copied;
use std::slice;

use smallvec::SmallVec;

use super::buffer::GrowBuffer;
use super::id::{QueryId, RawId, MAX_RAW_ID, TAG_BIT};

/// Shared storage for dependency lists longer than two.
pub type DependencyPool = GrowBuffer<RawId>;

/// Why a parent list cannot be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// More parents than fit below the tag bit.
    TooManyParents(usize),
    /// The pool has grown past the largest offset `field1` can hold.
    PoolOverflow(usize),
}

/// Packed dependency list of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepDescriptor {
    field0: RawId,
    field1: RawId,
}

impl DepDescriptor {
    /// Descriptor for a query without parents.
    pub const NONE: Self = Self {
        field0: 0,
        field1: 0,
    };

    /// Check that `parents` can be encoded against `pool` as it is now.
    pub fn check(parents: &[QueryId], pool: &DependencyPool) -> Result<(), EncodeError> {
        if parents.len() > 2 {
            if parents.len() > MAX_RAW_ID as usize {
                return Err(EncodeError::TooManyParents(parents.len()));
            }
            if pool.len() > RawId::MAX as usize {
                return Err(EncodeError::PoolOverflow(pool.len()));
            }
        }
        Ok(())
    }

    /// Encode `parents`, appending them to `pool` when there are more than two.
    ///
    /// Callers validate with [`DepDescriptor::check`] first; an oversized list
    /// would be truncated into the id width.
    pub fn encode(parents: &[QueryId], pool: &mut DependencyPool) -> Self {
        match *parents {
            [] => Self::NONE,
            [parent] => Self {
                field0: 1,
                field1: parent.raw(),
            },
            [first, second] => Self {
                field0: first.raw() | TAG_BIT,
                field1: second.raw(),
            },
            _ => {
                let start = pool.len() as RawId;
                let raw: SmallVec<[RawId; 8]> = parents.iter().map(|p| p.raw()).collect();
                pool.append_slice(&raw);
                Self {
                    field0: parents.len() as RawId,
                    field1: start,
                }
            }
        }
    }

    /// Decode into the explicit form.
    #[inline]
    pub fn decode(self) -> Deps {
        if self.field0 & TAG_BIT != 0 {
            Deps::Two(QueryId::new(self.field0 ^ TAG_BIT), QueryId::new(self.field1))
        } else if self.field0 == 1 {
            Deps::One(QueryId::new(self.field1))
        } else if self.field0 == 0 {
            Deps::None
        } else {
            Deps::Many {
                start: self.field1 as usize,
                count: self.field0 as usize,
            }
        }
    }

    /// The raw `(field0, field1)` pair.
    pub fn fields(self) -> (RawId, RawId) {
        (self.field0, self.field1)
    }
}

/// Decoded dependency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deps {
    None,
    One(QueryId),
    Two(QueryId, QueryId),
    /// `count` parents stored in the pool starting at `start`.
    Many { start: usize, count: usize },
}

impl Deps {
    /// Number of parents.
    pub fn len(&self) -> usize {
        match *self {
            Deps::None => 0,
            Deps::One(_) => 1,
            Deps::Two(..) => 2,
            Deps::Many { count, .. } => count,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Deps::None)
    }

    /// Short name of the encoding shape, for logs.
    pub fn form(&self) -> &'static str {
        match self {
            Deps::None => "none",
            Deps::One(_) => "one",
            Deps::Two(..) => "two",
            Deps::Many { .. } => "pooled",
        }
    }

    /// Iterate parents in encoding order.
    pub fn iter<'a>(&self, pool: &'a DependencyPool) -> DepsIter<'a> {
        match *self {
            Deps::None => DepsIter::Inline([None, None].into_iter()),
            Deps::One(a) => DepsIter::Inline([Some(a), None].into_iter()),
            Deps::Two(a, b) => DepsIter::Inline([Some(a), Some(b)].into_iter()),
            Deps::Many { start, count } => DepsIter::Pooled(pool.slice(start, count).iter().copied()),
        }
    }

    /// Collect parents into a small vector.
    pub fn to_vec(&self, pool: &DependencyPool) -> SmallVec<[QueryId; 4]> {
        self.iter(pool).collect()
    }
}

/// Iterator over the parents of a [`Deps`].
#[derive(Debug, Clone)]
pub enum DepsIter<'a> {
    Inline(std::array::IntoIter<Option<QueryId>, 2>),
    Pooled(Copied<slice::Iter<'a, RawId>>),
}

impl Iterator for DepsIter<'_> {
    type Item = QueryId;

    fn next(&mut self) -> Option<QueryId> {
        match self {
            DepsIter::Inline(it) => it.next().flatten(),
            DepsIter::Pooled(it) => it.next().map(QueryId::new),
        }
    }
}
