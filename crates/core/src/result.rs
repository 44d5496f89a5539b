use serde::{Deserialize, Serialize};

/// Details of one failing leaf condition: what was expected, what was
/// found, and where.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FailureInfo {
    /// The operator that returned false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// The leaf path, or `"composite"` for `none`/`not` failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// The value the leaf expected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub expected_value: Option<serde_json::Value>,
    /// The value the path resolver produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub actual_value: Option<serde_json::Value>,
}

impl FailureInfo {
    /// A failure identified only by operator kind and location, without
    /// expected/actual values (composite nodes, evaluation errors).
    pub fn marker(operator: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            operator: Some(operator.into()),
            path: Some(path.into()),
            expected_value: None,
            actual_value: None,
        }
    }

    /// A full leaf failure carrying expected and actual values.
    pub fn leaf(
        operator: impl Into<String>,
        path: impl Into<String>,
        expected_value: serde_json::Value,
        actual_value: serde_json::Value,
    ) -> Self {
        Self {
            operator: Some(operator.into()),
            path: Some(path.into()),
            expected_value: Some(expected_value),
            actual_value: Some(actual_value),
        }
    }
}

/// The outcome of evaluating one rule against one input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleResult {
    /// Name of the evaluated rule.
    pub rule_name: String,
    /// `true` when every entity fulfilled the rule.
    pub success: bool,
    /// Narrative summary of the outcome.
    pub message: String,
    /// The input entities that failed the rule, in input order.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Object>))]
    pub failing_elements: Vec<serde_json::Value>,
    /// Leaf failures encountered across entities, flattened.
    #[serde(default)]
    pub failure_details: Vec<FailureInfo>,
}

impl RuleResult {
    /// A passing result for the given rule.
    pub fn passed(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            success: true,
            message: "All entities fulfill the rule".to_owned(),
            failing_elements: Vec::new(),
            failure_details: Vec::new(),
        }
    }

    /// A failing result reporting which entities did not fulfill the rule.
    pub fn failed(
        rule_name: impl Into<String>,
        total_entities: usize,
        failing_elements: Vec<serde_json::Value>,
        failure_details: Vec<FailureInfo>,
    ) -> Self {
        let failing = failing_elements.len();
        Self {
            rule_name: rule_name.into(),
            success: false,
            message: format!("{failing} of {total_entities} entities do not fulfill the rule"),
            failing_elements,
            failure_details,
        }
    }

    /// A result for a rule whose evaluation could not complete.
    pub fn error(rule_name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self {
            rule_name: rule_name.into(),
            success: false,
            message: format!("Error evaluating rule: {message}"),
            failing_elements: Vec::new(),
            failure_details: vec![FailureInfo::marker("error", message.to_string())],
        }
    }
}

/// Per-rule failure bundle attributed to a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleFailures {
    /// Name of the failed rule.
    pub rule_name: String,
    /// The rule's leaf failures, surfaced unchanged.
    pub failure_details: Vec<FailureInfo>,
}

/// The by-entity view of an evaluation: for one input entity, which rules
/// passed and which failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EntityEvaluation {
    /// The input entity this report describes.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub entity: serde_json::Value,
    /// Names of rules the entity fulfilled.
    pub rules_passed: Vec<String>,
    /// Rules the entity failed, with their failure details.
    pub rules_failed: Vec<RuleFailures>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn passed_result_message() {
        let result = RuleResult::passed("r");
        assert!(result.success);
        assert_eq!(result.message, "All entities fulfill the rule");
        assert!(result.failing_elements.is_empty());
    }

    #[test]
    fn failed_result_counts_entities() {
        let result = RuleResult::failed(
            "r",
            3,
            vec![json!({"id": "b"})],
            vec![FailureInfo::leaf("equal", "$.items[*].value", json!(10), json!(15))],
        );
        assert!(!result.success);
        assert_eq!(result.message, "1 of 3 entities do not fulfill the rule");
    }

    #[test]
    fn error_result_carries_marker() {
        let result = RuleResult::error("r", "Unsupported operator: frobnicate");
        assert!(!result.success);
        assert_eq!(
            result.message,
            "Error evaluating rule: Unsupported operator: frobnicate"
        );
        assert_eq!(result.failure_details.len(), 1);
        assert_eq!(result.failure_details[0].operator.as_deref(), Some("error"));
    }

    #[test]
    fn failure_info_serialization_omits_absent_fields() {
        let info = FailureInfo::marker("none", "composite");
        let wire = serde_json::to_value(&info).unwrap();
        assert_eq!(wire, json!({"operator": "none", "path": "composite"}));
    }
}
