//! Engine Configuration
//!
//! Hosts that size their query graph from data can describe the engine in
//! JSON instead of hard-coding capacities:
//!
//! ```json
//! { "capacity": 512, "pool_capacity": 128 }
//! ```

use serde::Deserialize;

use crate::error::{ConfigError, QueryError};
use crate::query::MAX_CAPACITY;

/// Sizing for a [`QueryEngine`](crate::query::QueryEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Number of query ids, `0..capacity`.
    pub capacity: usize,
    /// Dependency pool entries to reserve up front.
    pub pool_capacity: usize,
}

impl EngineConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pool_capacity: 0,
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every size fits the identifier space.
    pub fn validate(&self) -> Result<(), QueryError> {
        for requested in [self.capacity, self.pool_capacity] {
            if requested > MAX_CAPACITY {
                return Err(QueryError::CapacityTooLarge {
                    requested,
                    max: MAX_CAPACITY,
                });
            }
        }
        Ok(())
    }
}
