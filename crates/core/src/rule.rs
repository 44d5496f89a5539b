use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::condition::ConditionSpec;

/// A named predicate over the entities of one entity type.
///
/// Rules are immutable once stored; only the category set attached to a
/// [`StoredRule`] changes after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Rule {
    /// A human-readable name, unique within the entity type.
    pub name: String,
    /// The entity type this rule applies to (e.g. `device`, `task`).
    pub entity_type: String,
    /// Optional description of what this rule checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The condition tree constituting the rule body.
    pub conditions: ConditionSpec,
}

impl Rule {
    /// Create a new rule with the given name, entity type, and conditions.
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        conditions: ConditionSpec,
    ) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            description: None,
            conditions,
        }
    }

    /// Set the description of this rule.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The repository key identifying this rule.
    pub fn key(&self) -> RuleKey {
        RuleKey::new(&self.entity_type, &self.name)
    }
}

/// Repository identity of a stored rule: `(entity_type, name)`.
///
/// Categories and description never participate in identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleKey {
    /// The entity type component.
    pub entity_type: String,
    /// The rule name component.
    pub name: String,
}

impl RuleKey {
    /// Create a key from its two components.
    pub fn new(entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.entity_type, self.name)
    }
}

/// A rule as held in the repository, together with its mutable category set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StoredRule {
    /// The immutable rule definition.
    pub rule: Rule,
    /// String tags used to select groups of rules for evaluation. May be
    /// empty. A `BTreeSet` keeps membership idempotent and listings sorted.
    pub categories: BTreeSet<String>,
}

impl StoredRule {
    /// Wrap a rule with an initial category set.
    pub fn new(rule: Rule, categories: BTreeSet<String>) -> Self {
        Self { rule, categories }
    }

    /// The repository key identifying this stored rule.
    pub fn key(&self) -> RuleKey {
        self.rule.key()
    }

    /// The entity type of the underlying rule.
    pub fn entity_type(&self) -> &str {
        &self.rule.entity_type
    }

    /// The name of the underlying rule.
    pub fn name(&self) -> &str {
        &self.rule.name
    }

    /// Returns `true` if this rule carries at least one of the given
    /// categories.
    pub fn in_any_category(&self, categories: &[String]) -> bool {
        categories.iter().any(|c| self.categories.contains(c))
    }
}

/// Identity equality: two stored rules are the same rule when their keys
/// match, regardless of definition or categories.
impl PartialEq for StoredRule {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for StoredRule {}
