use super::RuleTable;
use protocol::models::{Condition, SkipRule};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};

/// Shared handle to the rule table.
///
/// A resolution pass holds a read guard for its whole duration, so administrative
/// edits wait for in-flight scans and never interleave with one.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    table: Arc<RwLock<RuleTable>>,
}

impl RuleStore {
    pub fn new(table: RuleTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    pub async fn read(&self) -> OwnedRwLockReadGuard<RuleTable> {
        Arc::clone(&self.table).read_owned().await
    }

    pub async fn snapshot(&self) -> RuleTable {
        self.table.read().await.clone()
    }

    pub async fn add_condition(&self, condition: Condition) -> bool {
        let key = condition.key.clone();
        let replaced = self.table.write().await.upsert_condition(condition);
        tracing::info!(event = "rule_condition_added", key = %key, replaced);
        replaced
    }

    pub async fn remove_condition(&self, key: &str) -> Option<Condition> {
        let removed = self.table.write().await.remove_condition(key);
        tracing::info!(
            event = "rule_condition_removed",
            key = %key,
            found = removed.is_some()
        );
        removed
    }

    pub async fn add_skip_rule(&self, rule: SkipRule) -> bool {
        self.table.write().await.upsert_skip_rule(rule)
    }

    pub async fn remove_skip_rule(&self, prefix: &str) -> Option<SkipRule> {
        self.table.write().await.remove_skip_rule(prefix)
    }

    pub async fn add_orphan_skip_rule(&self, rule: SkipRule) -> bool {
        self.table.write().await.upsert_orphan_skip_rule(rule)
    }

    pub async fn remove_orphan_skip_rule(&self, prefix: &str) -> Option<SkipRule> {
        self.table.write().await.remove_orphan_skip_rule(prefix)
    }
}

#[cfg(test)]
#[path = "../../tests/rules/store_tests.rs"]
mod store_tests;
