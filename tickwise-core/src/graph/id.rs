//! Query Identifiers
//!
//! Query ids are dense, caller-assigned indices into the engine's slot array.
//! The engine never generates them.
//!
//! The most significant bit of the raw representation is reserved: the
//! dependency encoding uses it to tell "two inline parents" apart from "many
//! parents in the pool" (see [`super::deps`]). Every raw id, every engine
//! capacity, and every pool offset therefore stays at or below
//! [`MAX_RAW_ID`].

use std::fmt;

use serde::Serialize;

/// Raw storage type of a [`QueryId`].
#[cfg(not(feature = "wide-ids"))]
pub type RawId = u16;

/// Raw storage type of a [`QueryId`].
#[cfg(feature = "wide-ids")]
pub type RawId = u32;

/// The bit borrowed by the dependency encoding.
pub const TAG_BIT: RawId = 1 << (RawId::BITS - 1);

/// Largest raw value a query id may take.
pub const MAX_RAW_ID: RawId = TAG_BIT - 1;

/// Epoch counter. Zero means "never computed".
pub type Epoch = u32;

/// Identifier of a query in a [`QueryEngine`](crate::query::QueryEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct QueryId(RawId);

impl QueryId {
    /// Create a query id from its raw value.
    ///
    /// Values with [`TAG_BIT`] set are rejected by the engine on use.
    pub const fn new(raw: RawId) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    pub const fn raw(self) -> RawId {
        self.0
    }

    /// The slot index for this id.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Build an id from a slot index, if it fits the identifier space.
    pub fn from_index(index: usize) -> Option<Self> {
        RawId::try_from(index)
            .ok()
            .filter(|raw| *raw <= MAX_RAW_ID)
            .map(Self)
    }
}

impl From<RawId> for QueryId {
    fn from(raw: RawId) -> Self {
        Self(raw)
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
