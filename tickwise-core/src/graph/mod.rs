//! Dependency Graph Storage
//!
//! The compact building blocks the engine stores per query: identifiers,
//! the packed dependency descriptor, and the append-only pool that holds
//! dependency lists too long to store inline.
//!
//! # Design Decisions
//!
//! 1. Ids are dense and assigned by the caller, so slots live in a flat
//!    array indexed by id.
//!
//! 2. The query set is append-only. Pooled dependency lists are referenced
//!    by offset and never move or disappear once written.
//!
//! 3. Only forward edges (child to parents) are stored. Evaluation is pulled
//!    from sinks, so nothing ever walks from a parent to its dependents.

mod buffer;
mod deps;
mod id;

pub use buffer::GrowBuffer;
pub use deps::{DepDescriptor, DependencyPool, Deps, DepsIter, EncodeError};
pub use id::{Epoch, QueryId, RawId, MAX_RAW_ID, TAG_BIT};
