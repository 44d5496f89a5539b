//! The evaluation pipeline: from `(data, entity type, filter)` to per-rule
//! results and per-entity reports.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use dikast_core::{ConditionSpec, EntityEvaluation, FailureInfo, Rule, RuleFailures, RuleResult, StoredRule};

use crate::engine::eval::evaluate_with_details;
use crate::engine::ops::values_equal;
use crate::engine::path;
use crate::engine::repository::RuleRepository;
use crate::error::RuleError;
use crate::ir::condition::Condition;

/// Selects which stored rules an evaluation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleFilter {
    /// Every rule of the entity type.
    All,
    /// Rules whose category set intersects the given categories.
    Categories(Vec<String>),
    /// Rules looked up by name; names that do not resolve are dropped.
    Names(Vec<String>),
}

/// Evaluate stored rules against an input document.
///
/// The data argument may be a JSON object or a string containing one; an
/// unparseable string is a fatal error. Rules are selected by the filter,
/// deduplicated by name preserving selection order, and evaluated
/// independently: one rule's failure never aborts the batch.
pub fn evaluate_stored(
    repository: &RuleRepository,
    data: &Value,
    entity_type: &str,
    filter: &RuleFilter,
) -> Result<Vec<RuleResult>, RuleError> {
    let document = coerce_document(data)?;
    let entities = path::extract_entities(&document, entity_type);
    let rules = select_rules(repository, entity_type, filter);

    Ok(run(&rules, &entities, entity_type))
}

/// Evaluate ad-hoc rule definitions without touching the shared repository.
///
/// A throwaway repository is populated with the supplied rules (later
/// duplicates replace earlier definitions) and the regular pipeline runs
/// over it, keeping the first-occurrence order of names.
pub fn evaluate_adhoc(
    data: &Value,
    entity_type: &str,
    rules: Vec<Rule>,
) -> Result<Vec<RuleResult>, RuleError> {
    let mut scratch = RuleRepository::new();
    let mut names = Vec::with_capacity(rules.len());
    for rule in rules {
        if !names.contains(&rule.name) {
            names.push(rule.name.clone());
        }
        scratch.upsert(rule, BTreeSet::new());
    }

    evaluate_stored(&scratch, data, entity_type, &RuleFilter::Names(names))
}

/// Evaluate stored rules and report the outcome per input entity.
///
/// Returns the per-rule results alongside one report per entity: rules it
/// fulfilled, and for rules it failed, the rule's failure details
/// unchanged. An entity failed a rule when the rule failed and its
/// `failing_elements` contains a structurally equal value.
pub fn evaluate_by_entity(
    repository: &RuleRepository,
    data: &Value,
    entity_type: &str,
    filter: &RuleFilter,
) -> Result<(Vec<RuleResult>, Vec<EntityEvaluation>), RuleError> {
    let document = coerce_document(data)?;
    let entities = path::extract_entities(&document, entity_type);
    let rules = select_rules(repository, entity_type, filter);
    let results = run(&rules, &entities, entity_type);

    let reports = entities
        .into_iter()
        .map(|entity| {
            let mut rules_passed = Vec::new();
            let mut rules_failed = Vec::new();

            for result in &results {
                let failed = !result.success
                    && result
                        .failing_elements
                        .iter()
                        .any(|failing| values_equal(failing, &entity));

                if failed {
                    rules_failed.push(RuleFailures {
                        rule_name: result.rule_name.clone(),
                        failure_details: result.failure_details.clone(),
                    });
                } else {
                    rules_passed.push(result.rule_name.clone());
                }
            }

            EntityEvaluation {
                entity,
                rules_passed,
                rules_failed,
            }
        })
        .collect();

    Ok((results, reports))
}

/// Structural report over a stored rule's condition tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleAnalysis {
    /// Name of the analysed rule.
    pub rule_name: String,
    /// Entity type the rule applies to.
    pub entity_type: String,
    /// Rule description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Distinct leaf paths in tree order.
    pub paths: Vec<String>,
    /// Distinct operator tags in tree order.
    pub operators: Vec<String>,
    /// Nesting depth of the tree.
    pub depth: usize,
    /// Number of leaves.
    pub leaf_count: usize,
    /// The condition tree in its cleaned wire form.
    pub conditions: ConditionSpec,
}

/// Analyse the structure of a stored rule's condition tree.
pub fn analyze_rule(stored: &StoredRule) -> Result<RuleAnalysis, RuleError> {
    let condition = Condition::from_spec(&stored.rule.conditions)?;

    Ok(RuleAnalysis {
        rule_name: stored.name().to_owned(),
        entity_type: stored.entity_type().to_owned(),
        description: stored.rule.description.clone(),
        paths: condition.paths(),
        operators: condition.operators(),
        depth: condition.depth(),
        leaf_count: condition.leaf_count(),
        conditions: stored.rule.conditions.pruned().unwrap_or_default(),
    })
}

/// Parse string-typed data into a document; pass objects through.
fn coerce_document(data: &Value) -> Result<Cow<'_, Value>, RuleError> {
    match data {
        Value::String(raw) => serde_json::from_str(raw)
            .map(Cow::Owned)
            .map_err(|e| RuleError::InvalidData(e.to_string())),
        _ => Ok(Cow::Borrowed(data)),
    }
}

/// Select and deduplicate the rules an evaluation runs, preserving
/// selection order.
fn select_rules<'a>(
    repository: &'a RuleRepository,
    entity_type: &str,
    filter: &RuleFilter,
) -> Vec<&'a StoredRule> {
    let selected: Vec<&StoredRule> = match filter {
        RuleFilter::All => repository.get_many(Some(entity_type), None),
        RuleFilter::Categories(categories) => {
            repository.get_many(Some(entity_type), Some(categories))
        }
        RuleFilter::Names(names) => names
            .iter()
            .filter_map(|name| match repository.get(entity_type, name) {
                Ok(stored) => Some(stored),
                Err(_) => {
                    debug!(entity_type, name, "skipping unresolved rule name");
                    None
                }
            })
            .collect(),
    };

    let mut seen = HashSet::new();
    selected
        .into_iter()
        .filter(|stored| seen.insert(stored.name().to_owned()))
        .collect()
}

fn run(rules: &[&StoredRule], entities: &[Value], entity_type: &str) -> Vec<RuleResult> {
    if entities.is_empty() {
        warn!(entity_type, "no entities found in the input data");
        return Vec::new();
    }
    if rules.is_empty() {
        warn!(entity_type, "no rules to evaluate");
        return Vec::new();
    }

    rules
        .iter()
        .map(|stored| evaluate_rule(&stored.rule, entities))
        .collect()
}

fn evaluate_rule(rule: &Rule, entities: &[Value]) -> RuleResult {
    let condition = match Condition::from_spec(&rule.conditions) {
        Ok(condition) => condition,
        Err(_) => {
            warn!(rule = %rule.key(), "invalid conditions in rule");
            return RuleResult::failed(
                &rule.name,
                entities.len(),
                entities.to_vec(),
                vec![FailureInfo::marker("invalid", "conditions")],
            );
        }
    };

    let mut failing_elements = Vec::new();
    let mut failure_details = Vec::new();

    for entity in entities {
        match evaluate_with_details(&condition, entity) {
            Ok((true, _)) => {}
            Ok((false, failures)) => {
                failing_elements.push(entity.clone());
                failure_details.extend(failures);
            }
            Err(e) => {
                warn!(rule = %rule.key(), error = %e, "error evaluating rule");
                return RuleResult::error(&rule.name, e);
            }
        }
    }

    if failing_elements.is_empty() {
        RuleResult::passed(&rule.name)
    } else {
        RuleResult::failed(&rule.name, entities.len(), failing_elements, failure_details)
    }
}
