use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use dikast_core::{ConditionSpec, EntityEvaluation, FailureInfo, Rule, RuleResult};

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Server version.
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// A rule as uploaded by a client.
///
/// `entity_type` may be omitted when the surrounding request supplies one;
/// the configured default entity type is the final fallback.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RuleUpload {
    /// Rule name, unique within its entity type.
    #[schema(example = "os-version-17")]
    pub name: String,
    /// Entity type the rule applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "device")]
    pub entity_type: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The condition tree.
    pub conditions: ConditionSpec,
    /// Categories to attach when storing.
    #[serde(default)]
    pub add_to_categories: Vec<String>,
}

impl RuleUpload {
    /// Build the domain rule, resolving the entity type against the
    /// request-level value and the configured default.
    pub fn into_rule(self, request_entity_type: Option<&str>, default_entity_type: &str) -> Rule {
        let entity_type = self
            .entity_type
            .or_else(|| request_entity_type.map(str::to_owned))
            .unwrap_or_else(|| default_entity_type.to_owned());

        Rule {
            name: self.name,
            entity_type,
            description: self.description,
            conditions: self.conditions,
        }
    }
}

/// Request body for storing rules.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleStoreRequest {
    /// Entity type applied to rules that do not carry their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "device")]
    pub entity_type: Option<String>,
    /// Category applied to rules that list none in `add_to_categories`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "compliance")]
    pub default_category: Option<String>,
    /// The rules to upsert, applied in order.
    pub rules: Vec<RuleUpload>,
}

/// Response after storing rules.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleStoreResponse {
    /// Whether the batch was stored.
    pub success: bool,
    /// Human-readable summary.
    #[schema(example = "Successfully stored 2 rules")]
    pub message: String,
    /// Number of rules upserted.
    #[schema(example = 2)]
    pub stored_rules: usize,
}

/// Response from rule validation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleValidationResponse {
    /// `true` when the rule is storable.
    pub valid: bool,
    /// Problems found, absent when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Query parameters for the rule listing.
#[derive(Debug, Deserialize)]
pub struct RuleListQuery {
    /// Restrict the listing to one entity type.
    pub entity_type: Option<String>,
    /// Repeatable category filter; rules matching any are listed.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// One rule in the listing response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleViewModel {
    /// Rule name.
    #[schema(example = "os-version-17")]
    pub rule_name: String,
    /// Entity type the rule applies to.
    #[schema(example = "device")]
    pub entity_type: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The condition tree in cleaned wire form.
    pub conditions: ConditionSpec,
    /// The rule's categories, sorted.
    pub categories_associated_with: Vec<String>,
}

/// Per-entity-type statistics block.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EntityTypeStats {
    /// Number of rules for the entity type.
    #[schema(example = 4)]
    pub total_rules: usize,
    /// Rule count per category.
    pub rules_by_category: BTreeMap<String, usize>,
}

/// Response for the rule listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleListResponse {
    /// Entity types present in the listing, sorted.
    pub entity_types: Vec<String>,
    /// The matching rules, sorted by entity type and name.
    pub rules: Vec<RuleViewModel>,
    /// Statistics per entity type.
    pub stats: BTreeMap<String, EntityTypeStats>,
}

/// Request body for mutating a rule's categories.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleCategoriesRequest {
    /// Name of the rule to mutate.
    #[schema(example = "os-version-17")]
    pub rule_name: String,
    /// Entity type of the rule.
    #[schema(example = "device")]
    pub entity_type: String,
    /// Categories to add or remove.
    pub categories: Vec<String>,
    /// `"add"` or `"remove"`, case-insensitive.
    #[schema(example = "add")]
    pub category_action: String,
}

/// Response after mutating categories.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleCategoriesResponse {
    /// Whether the mutation was applied.
    pub success: bool,
    /// Human-readable summary.
    #[schema(example = "Categories updated successfully")]
    pub message: String,
}

/// Request body for evaluating data against stored rules.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "entity_type": "device",
    "categories": ["version"],
    "data": {
        "devices": [
            {"vendor": "Cisco Systems", "osVersion": "17.3.6", "mgmtIP": "192.168.1.1"}
        ]
    }
}))]
pub struct EvaluationRequest {
    /// The input document, or a string containing its JSON.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    /// Entity type whose list is extracted from the document.
    pub entity_type: String,
    /// Select stored rules by category intersection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Select stored rules by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_names: Option<Vec<String>>,
}

/// Request body for evaluating data against supplied rules.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluationWithRulesRequest {
    /// The input document, or a string containing its JSON.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    /// Entity type whose list is extracted from the document.
    pub entity_type: String,
    /// The rules to evaluate; the repository is not touched.
    pub rules: Vec<RuleUpload>,
}

/// Per-rule evaluation report.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluationResponse {
    /// Entity type that was evaluated.
    pub entity_type: String,
    /// Category filter echoed from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Rule-name filter echoed from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_names: Option<Vec<String>>,
    /// Number of rules evaluated.
    pub total_rules: usize,
    /// Rules whose every entity passed.
    pub passed_rules: usize,
    /// Rules with at least one failing entity or an evaluation error.
    pub failed_rules: usize,
    /// One result per evaluated rule, in selection order.
    pub results: Vec<RuleResult>,
}

impl EvaluationResponse {
    /// Assemble the report from pipeline results.
    pub fn from_results(
        entity_type: String,
        categories: Option<Vec<String>>,
        rule_names: Option<Vec<String>>,
        results: Vec<RuleResult>,
    ) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            entity_type,
            categories,
            rule_names,
            total_rules: results.len(),
            passed_rules: passed,
            failed_rules: results.len() - passed,
            results,
        }
    }
}

/// Pass/fail counts for one entity.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DataEvaluationSummary {
    /// Number of rules the entity fulfilled.
    pub rules_passed: usize,
    /// Number of rules the entity failed.
    pub rules_failed: usize,
}

/// Evaluation report for one input entity.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DataEvaluationItem {
    /// The input entity.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    /// Pass/fail counts.
    pub evaluation_summary: DataEvaluationSummary,
    /// Names of rules the entity fulfilled.
    pub rules_passed: Vec<String>,
    /// Rules the entity failed, with details.
    pub rules_failed: Vec<RuleFailureView>,
}

/// A failed rule with its failure details, as shown per entity.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RuleFailureView {
    /// Name of the failed rule.
    pub rule_name: String,
    /// The rule's leaf failures, unchanged.
    pub failure_details: Vec<FailureInfo>,
}

impl From<EntityEvaluation> for DataEvaluationItem {
    fn from(report: EntityEvaluation) -> Self {
        Self {
            data: report.entity,
            evaluation_summary: DataEvaluationSummary {
                rules_passed: report.rules_passed.len(),
                rules_failed: report.rules_failed.len(),
            },
            rules_passed: report.rules_passed,
            rules_failed: report
                .rules_failed
                .into_iter()
                .map(|f| RuleFailureView {
                    rule_name: f.rule_name,
                    failure_details: f.failure_details,
                })
                .collect(),
        }
    }
}

/// Per-entity evaluation report.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DataEvaluationResponse {
    /// Entity type that was evaluated.
    pub entity_type: String,
    /// Category filter echoed from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Rule-name filter echoed from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_names: Option<Vec<String>>,
    /// Number of rules evaluated.
    pub total_rules: usize,
    /// Number of entities in the input document.
    pub total_data_objects: usize,
    /// One report per input entity, in input order.
    pub results: Vec<DataEvaluationItem>,
}

/// Aggregate statistics over the stored rule set.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluationStatsResponse {
    /// Total number of stored rules.
    pub total_rules: usize,
    /// Number of entity types with rules.
    pub entity_type_count: usize,
    /// Entity types with rules, sorted.
    pub entity_types: Vec<String>,
    /// Statistics per entity type.
    pub stats_by_entity_type: BTreeMap<String, EntityTypeStats>,
    /// Every operator tag the engine accepts.
    pub supported_operators: Vec<String>,
    /// Configured cap on rules per request.
    #[schema(example = 100)]
    pub max_rules_per_request: usize,
}

/// Query parameters for the failure-details endpoint.
#[derive(Debug, Deserialize)]
pub struct FailureDetailsQuery {
    /// Entity type to search; all entity types when absent.
    pub entity_type: Option<String>,
}

/// Generic error response returned on failures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    #[schema(example = "rule not found: unknown-rule")]
    pub error: String,
}
