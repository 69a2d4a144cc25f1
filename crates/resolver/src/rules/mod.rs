use crate::identity::AppIdentity;
use crate::normalize::normalize;
use protocol::models::{Condition, SkipRule};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

mod builtin;
mod store;

pub use store::RuleStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleDecision {
    Accept,
    Reject,
}

/// User-supplied additions layered over the built-in tables.
#[derive(Debug, Clone, Default)]
pub struct RuleOverlay {
    pub conditions: Vec<Condition>,
    pub disabled_conditions: Vec<String>,
    pub skip_rules: Vec<SkipRule>,
    pub orphan_skip_rules: Vec<SkipRule>,
}

/// Conditions plus the forward and orphan skip tables. Every key, keyword and prefix
/// is stored normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    conditions: Vec<Condition>,
    skip_rules: Vec<SkipRule>,
    orphan_skip_rules: Vec<SkipRule>,
}

impl RuleTable {
    pub fn new(
        conditions: Vec<Condition>,
        skip_rules: Vec<SkipRule>,
        orphan_skip_rules: Vec<SkipRule>,
    ) -> Self {
        let mut table = Self::default();
        for condition in conditions {
            table.upsert_condition(condition);
        }
        for rule in skip_rules {
            upsert_skip_rule(&mut table.skip_rules, rule);
        }
        for rule in orphan_skip_rules {
            upsert_skip_rule(&mut table.orphan_skip_rules, rule);
        }
        table
    }

    pub fn builtin() -> Self {
        Self::new(
            builtin::builtin_conditions(),
            builtin::builtin_skip_rules(),
            builtin::builtin_orphan_skip_rules(),
        )
    }

    /// Drops disabled built-in conditions, then adds the overlay's entries. Overlay
    /// entries replace built-ins with the same key or prefix.
    pub fn with_overlay(mut self, overlay: RuleOverlay) -> Self {
        let disabled = overlay
            .disabled_conditions
            .iter()
            .map(|key| normalize(key))
            .collect::<HashSet<_>>();
        self.conditions
            .retain(|condition| !disabled.contains(&condition.key));
        for condition in overlay.conditions {
            self.upsert_condition(condition);
        }
        for rule in overlay.skip_rules {
            upsert_skip_rule(&mut self.skip_rules, rule);
        }
        for rule in overlay.orphan_skip_rules {
            upsert_skip_rule(&mut self.orphan_skip_rules, rule);
        }
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn skip_rules(&self) -> &[SkipRule] {
        &self.skip_rules
    }

    pub fn orphan_skip_rules(&self) -> &[SkipRule] {
        &self.orphan_skip_rules
    }

    /// Returns `true` when an existing condition with the same key was replaced.
    pub fn upsert_condition(&mut self, condition: Condition) -> bool {
        let Some(condition) = normalize_condition(condition) else {
            return false;
        };
        if let Some(existing) = self
            .conditions
            .iter_mut()
            .find(|existing| existing.key == condition.key)
        {
            *existing = condition;
            return true;
        }
        self.conditions.push(condition);
        false
    }

    pub fn remove_condition(&mut self, key: &str) -> Option<Condition> {
        let key = normalize(key);
        let index = self
            .conditions
            .iter()
            .position(|condition| condition.key == key)?;
        Some(self.conditions.remove(index))
    }

    pub fn upsert_skip_rule(&mut self, rule: SkipRule) -> bool {
        upsert_skip_rule(&mut self.skip_rules, rule)
    }

    pub fn upsert_orphan_skip_rule(&mut self, rule: SkipRule) -> bool {
        upsert_skip_rule(&mut self.orphan_skip_rules, rule)
    }

    pub fn remove_skip_rule(&mut self, prefix: &str) -> Option<SkipRule> {
        remove_skip_rule(&mut self.skip_rules, prefix)
    }

    pub fn remove_orphan_skip_rule(&mut self, prefix: &str) -> Option<SkipRule> {
        remove_skip_rule(&mut self.orphan_skip_rules, prefix)
    }

    /// Conditions consulted for forward resolution: the key is a substring of the
    /// app's normalized identifier. Web apps never inherit their host browser's
    /// conditions.
    pub fn conditions_for_app<'a>(
        &'a self,
        identity: &'a AppIdentity,
    ) -> impl Iterator<Item = &'a Condition> + 'a {
        self.conditions.iter().filter(move |condition| {
            !identity.is_web_app
                && !identity.identifier.is_empty()
                && identity.identifier.contains(&condition.key)
        })
    }

    /// Conditions that claim files for an installed app during orphan scans: the key
    /// contains the identifier or the identifier contains the key.
    pub fn conditions_claiming<'a>(
        &'a self,
        identifier: &'a str,
    ) -> impl Iterator<Item = &'a Condition> + 'a {
        self.conditions.iter().filter(move |condition| {
            !identifier.is_empty()
                && (condition.key.contains(identifier) || identifier.contains(&condition.key))
        })
    }

    /// First decisive condition wins; `exclude` is checked before `include`.
    pub fn evaluate_forward(&self, identity: &AppIdentity, entry: &str) -> Option<RuleDecision> {
        self.conditions_for_app(identity)
            .find_map(|condition| evaluate_condition(condition, entry))
    }

    pub fn is_skipped(&self, entry: &str) -> bool {
        matches_skip_table(&self.skip_rules, entry)
    }

    pub fn is_orphan_skipped(&self, entry: &str) -> bool {
        matches_skip_table(&self.orphan_skip_rules, entry)
    }
}

pub fn evaluate_condition(condition: &Condition, entry: &str) -> Option<RuleDecision> {
    if contains_any(entry, &condition.exclude) {
        return Some(RuleDecision::Reject);
    }
    if contains_any(entry, &condition.include) {
        return Some(RuleDecision::Accept);
    }
    None
}

fn contains_any(entry: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| !keyword.is_empty() && entry.contains(keyword.as_str()))
}

fn matches_skip_table(rules: &[SkipRule], entry: &str) -> bool {
    rules.iter().any(|rule| {
        entry.starts_with(rule.prefix.as_str())
            && !rule
                .allow
                .iter()
                .any(|allowed| entry.starts_with(allowed.as_str()))
    })
}

fn normalize_keywords(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|value| normalize(value))
        .filter(|value| !value.is_empty() && seen.insert(value.clone()))
        .collect()
}

fn normalize_condition(condition: Condition) -> Option<Condition> {
    let key = normalize(&condition.key);
    if key.is_empty() {
        return None;
    }
    Some(Condition {
        key,
        include: normalize_keywords(condition.include),
        exclude: normalize_keywords(condition.exclude),
        include_force: condition.include_force,
        exclude_force: condition.exclude_force,
    })
}

fn upsert_skip_rule(rules: &mut Vec<SkipRule>, rule: SkipRule) -> bool {
    let prefix = normalize(&rule.prefix);
    if prefix.is_empty() {
        return false;
    }
    let rule = SkipRule {
        prefix,
        allow: normalize_keywords(rule.allow),
    };
    if let Some(existing) = rules.iter_mut().find(|existing| existing.prefix == rule.prefix) {
        *existing = rule;
        return true;
    }
    rules.push(rule);
    false
}

fn remove_skip_rule(rules: &mut Vec<SkipRule>, prefix: &str) -> Option<SkipRule> {
    let prefix = normalize(prefix);
    let index = rules.iter().position(|rule| rule.prefix == prefix)?;
    Some(rules.remove(index))
}

/// Expands a leading `~` against `home`; other paths pass through.
pub fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
#[path = "../../tests/rules/rules_tests.rs"]
mod rules_tests;
