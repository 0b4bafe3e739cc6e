//! Per-replica configuration.
//!
//! Configuration is not part of a replica's serialized state: every
//! replica in a session is expected to be built with the same settings.

use serde::Deserialize;
use serde::Serialize;

/// How a remote insert is placed relative to concurrent inserts that
/// share its predecessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Skip past every following node with a greater id before splicing.
    /// Ids are Lamport timestamps, so the result does not depend on the
    /// order in which concurrent inserts arrive.
    #[default]
    Ordered,
    /// Splice immediately after the predecessor. Concurrent inserts at
    /// the same position end up in reverse arrival order, which can differ
    /// between replicas.
    Delivery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    pub merge_policy: MergePolicy,
    /// Recompute ordered-list numbering after each block mutation.
    pub renumber_lists: bool,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        return ReplicaConfig {
            merge_policy: MergePolicy::Ordered,
            renumber_lists: true,
        };
    }
}

impl ReplicaConfig {
    pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> ReplicaConfig {
        self.merge_policy = merge_policy;
        return self;
    }

    pub fn with_renumber_lists(mut self, renumber_lists: bool) -> ReplicaConfig {
        self.renumber_lists = renumber_lists;
        return self;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReplicaConfig::default();
        assert_eq!(config.merge_policy, MergePolicy::Ordered);
        assert!(config.renumber_lists);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ReplicaConfig =
            serde_json::from_str(r#"{ "merge_policy": "delivery" }"#).unwrap();
        assert_eq!(config.merge_policy, MergePolicy::Delivery);
        assert!(config.renumber_lists);
    }

    #[test]
    fn empty_config_is_default() {
        let config: ReplicaConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.merge_policy, MergePolicy::Ordered);
    }
}
