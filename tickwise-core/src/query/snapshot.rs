//! Engine Introspection
//!
//! Read-only views of the engine for debugging and tooling. Snapshots are
//! serializable so they can be dumped as JSON, but nothing ever reads them
//! back into an engine.

use serde::Serialize;

use super::engine::QueryEngine;
use crate::graph::{Epoch, QueryId};

/// Counters describing the engine's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub epoch: Epoch,
    pub capacity: usize,
    pub registered: usize,
    /// Ids stored in the shared dependency pool.
    pub pool_len: usize,
    pub pool_capacity: usize,
    /// Derivations run since the last epoch began.
    pub epoch_derivations: u64,
    pub total_derivations: u64,
}

/// One registered query as seen by a [`GraphSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryInfo {
    pub id: QueryId,
    pub node: &'static str,
    pub parents: Vec<QueryId>,
    pub last_updated: Epoch,
    pub current: bool,
}

/// Every registered query with its parents and freshness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    pub epoch: Epoch,
    pub queries: Vec<QueryInfo>,
}

impl GraphSnapshot {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a query by id.
    pub fn get(&self, id: QueryId) -> Option<&QueryInfo> {
        self.queries
            .binary_search_by_key(&id, |info| info.id)
            .ok()
            .map(|index| &self.queries[index])
    }
}

impl QueryEngine {
    /// Current counters.
    pub fn stats(&self) -> EngineStats {
        let pool = self.dependency_pool();
        EngineStats {
            epoch: self.epoch(),
            capacity: self.capacity(),
            registered: self.len(),
            pool_len: pool.len(),
            pool_capacity: pool.capacity(),
            epoch_derivations: self.epoch_derivations(),
            total_derivations: self.total_derivations(),
        }
    }

    /// Capture every registered query, ordered by id.
    pub fn snapshot(&self) -> GraphSnapshot {
        let queries = self
            .registered()
            .map(|id| QueryInfo {
                id,
                node: self.node_type(id),
                parents: self.parents(id).into_vec(),
                last_updated: self.last_updated(id),
                current: self.is_current(id),
            })
            .collect();
        GraphSnapshot {
            epoch: self.epoch(),
            queries,
        }
    }
}
