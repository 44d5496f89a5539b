use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use dikast_core::{Rule, RuleKey, StoredRule};

use crate::error::RuleError;

/// In-memory indexed store of rules, keyed by `(entity_type, name)`.
///
/// The repository owns no lock; the server shares one instance behind an
/// `Arc<RwLock<_>>` so every operation observes a consistent snapshot.
/// `BTreeMap` keeps iteration deterministic and listings sorted by entity
/// type and name.
#[derive(Debug, Default)]
pub struct RuleRepository {
    rules: BTreeMap<RuleKey, StoredRule>,
}

impl RuleRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a rule definition, merging categories.
    ///
    /// When the key already exists the stored definition is replaced and
    /// the category set becomes the union of the existing and supplied
    /// sets. A fresh key stores exactly the supplied categories.
    pub fn upsert(&mut self, rule: Rule, categories: BTreeSet<String>) {
        let key = rule.key();

        if let Some(existing) = self.rules.get_mut(&key) {
            info!(
                rule = %key,
                previous_categories = ?existing.categories,
                "overwriting existing rule definition"
            );
            existing.rule = rule;
            existing.categories.extend(categories);
        } else {
            debug!(rule = %key, "storing new rule");
            self.rules.insert(key, StoredRule::new(rule, categories));
        }
    }

    /// Returns `true` if a rule is stored under `(entity_type, name)`.
    pub fn exists(&self, entity_type: &str, name: &str) -> bool {
        self.rules.contains_key(&RuleKey::new(entity_type, name))
    }

    /// Look up a stored rule by key.
    pub fn get(&self, entity_type: &str, name: &str) -> Result<&StoredRule, RuleError> {
        self.rules
            .get(&RuleKey::new(entity_type, name))
            .ok_or_else(|| RuleError::RuleNotFound {
                entity_type: entity_type.to_owned(),
                name: name.to_owned(),
            })
    }

    /// Filtered listing: by entity type, by category intersection, by
    /// both, or everything when neither filter is given.
    pub fn get_many(
        &self,
        entity_type: Option<&str>,
        categories: Option<&[String]>,
    ) -> Vec<&StoredRule> {
        self.rules
            .values()
            .filter(|stored| entity_type.is_none_or(|et| stored.entity_type() == et))
            .filter(|stored| categories.is_none_or(|cats| stored.in_any_category(cats)))
            .collect()
    }

    /// Add categories to a stored rule (set union).
    pub fn add_categories(
        &mut self,
        entity_type: &str,
        name: &str,
        categories: &[String],
    ) -> Result<(), RuleError> {
        let stored = self.get_mut(entity_type, name)?;
        stored.categories.extend(categories.iter().cloned());
        debug!(rule = %stored.key(), categories = ?stored.categories, "categories added");
        Ok(())
    }

    /// Remove categories from a stored rule (set difference).
    ///
    /// Removing a category the rule does not carry is a no-op; removing
    /// every category leaves the rule stored with an empty set.
    pub fn remove_categories(
        &mut self,
        entity_type: &str,
        name: &str,
        categories: &[String],
    ) -> Result<(), RuleError> {
        let stored = self.get_mut(entity_type, name)?;
        for category in categories {
            stored.categories.remove(category);
        }
        debug!(rule = %stored.key(), categories = ?stored.categories, "categories removed");
        Ok(())
    }

    /// Entity types with at least one stored rule, sorted.
    pub fn entity_types(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for key in self.rules.keys() {
            if out.last().map(String::as_str) != Some(key.entity_type.as_str()) {
                out.push(key.entity_type.clone());
            }
        }
        out
    }

    /// The union of category sets across an entity type's rules, sorted.
    pub fn categories(&self, entity_type: &str) -> Vec<String> {
        let mut set = BTreeSet::new();
        for stored in self.get_many(Some(entity_type), None) {
            set.extend(stored.categories.iter().cloned());
        }
        set.into_iter().collect()
    }

    /// Rule count per category for one entity type.
    pub fn category_counts(&self, entity_type: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for stored in self.get_many(Some(entity_type), None) {
            for category in &stored.categories {
                *counts.entry(category.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Total number of stored rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Iterate over all stored rules in key order.
    pub fn iter(&self) -> impl Iterator<Item = &StoredRule> {
        self.rules.values()
    }

    /// Find a rule by name, searching one entity type or all of them.
    pub fn find_by_name(&self, name: &str, entity_type: Option<&str>) -> Option<&StoredRule> {
        match entity_type {
            Some(et) => self.rules.get(&RuleKey::new(et, name)),
            None => self.rules.values().find(|stored| stored.name() == name),
        }
    }

    fn get_mut(&mut self, entity_type: &str, name: &str) -> Result<&mut StoredRule, RuleError> {
        self.rules
            .get_mut(&RuleKey::new(entity_type, name))
            .ok_or_else(|| RuleError::RuleNotFound {
                entity_type: entity_type.to_owned(),
                name: name.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use dikast_core::ConditionSpec;

    use super::*;

    fn rule(entity_type: &str, name: &str) -> Rule {
        let conditions: ConditionSpec = serde_json::from_value(json!({
            "path": "$.x", "operator": "exists", "value": true
        }))
        .unwrap();
        Rule::new(name, entity_type, conditions)
    }

    fn cats(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn upsert_replaces_definition_and_merges_categories() {
        let mut repo = RuleRepository::new();
        repo.upsert(rule("device", "r").with_description("one"), cats(&["a", "b"]));
        repo.upsert(rule("device", "r").with_description("two"), cats(&["b", "c"]));

        assert_eq!(repo.rule_count(), 1);
        let stored = repo.get("device", "r").unwrap();
        assert_eq!(stored.rule.description.as_deref(), Some("two"));
        assert_eq!(stored.categories, cats(&["a", "b", "c"]));
    }

    #[test]
    fn get_reports_missing_rules() {
        let repo = RuleRepository::new();
        let err = repo.get("device", "missing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "rule with name 'missing' not found for entity type 'device'"
        );
    }

    #[test]
    fn get_many_filters_conjunctively() {
        let mut repo = RuleRepository::new();
        repo.upsert(rule("device", "a"), cats(&["x"]));
        repo.upsert(rule("device", "b"), cats(&["y"]));
        repo.upsert(rule("task", "c"), cats(&["x"]));

        assert_eq!(repo.get_many(None, None).len(), 3);
        assert_eq!(repo.get_many(Some("device"), None).len(), 2);
        assert_eq!(repo.get_many(None, Some(&["x".to_owned()])).len(), 2);

        let both = repo.get_many(Some("device"), Some(&["x".to_owned()]));
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].name(), "a");
    }

    #[test]
    fn category_mutation_is_idempotent() {
        let mut repo = RuleRepository::new();
        repo.upsert(rule("device", "r"), cats(&["a"]));

        let add = ["b".to_owned()];
        repo.add_categories("device", "r", &add).unwrap();
        repo.add_categories("device", "r", &add).unwrap();
        assert_eq!(repo.get("device", "r").unwrap().categories, cats(&["a", "b"]));

        let remove = ["b".to_owned(), "absent".to_owned()];
        repo.remove_categories("device", "r", &remove).unwrap();
        repo.remove_categories("device", "r", &remove).unwrap();
        assert_eq!(repo.get("device", "r").unwrap().categories, cats(&["a"]));
    }

    #[test]
    fn removing_every_category_keeps_the_rule() {
        let mut repo = RuleRepository::new();
        repo.upsert(rule("device", "r"), cats(&["a"]));

        repo.remove_categories("device", "r", &["a".to_owned()]).unwrap();
        assert!(repo.exists("device", "r"));
        assert!(repo.get("device", "r").unwrap().categories.is_empty());
    }

    #[test]
    fn category_mutation_on_missing_rule_errors() {
        let mut repo = RuleRepository::new();
        assert!(repo.add_categories("device", "r", &["a".to_owned()]).is_err());
        assert!(repo.remove_categories("device", "r", &["a".to_owned()]).is_err());
    }

    #[test]
    fn introspection_listings_are_sorted() {
        let mut repo = RuleRepository::new();
        repo.upsert(rule("task", "t"), cats(&["z", "m"]));
        repo.upsert(rule("device", "d1"), cats(&["b"]));
        repo.upsert(rule("device", "d2"), cats(&["a", "b"]));

        assert_eq!(repo.entity_types(), vec!["device", "task"]);
        assert_eq!(repo.categories("device"), vec!["a", "b"]);
        assert_eq!(repo.categories("task"), vec!["m", "z"]);

        let counts = repo.category_counts("device");
        assert_eq!(counts.get("b"), Some(&2));
        assert_eq!(counts.get("a"), Some(&1));
    }

    #[test]
    fn find_by_name_searches_across_entity_types() {
        let mut repo = RuleRepository::new();
        repo.upsert(rule("task", "shared"), BTreeSet::new());

        assert!(repo.find_by_name("shared", None).is_some());
        assert!(repo.find_by_name("shared", Some("task")).is_some());
        assert!(repo.find_by_name("shared", Some("device")).is_none());
        assert!(repo.find_by_name("missing", None).is_none());
    }
}
