//! Structural validation of rules before storage.
//!
//! Errors are accumulated as human-readable strings and returned rather
//! than raised; ordinary invalid input never panics or errors out of the
//! validator.

use dikast_core::{ConditionSpec, Rule};

use crate::engine::ops::Operator;

/// Validate a rule, returning every problem found.
///
/// An empty result means the rule is storable: it has a name, and its
/// condition tree is recursively well-formed with recognised operators.
pub fn validate_rule(rule: &Rule) -> Vec<String> {
    let mut errors = Vec::new();

    if rule.name.trim().is_empty() {
        errors.push("Rule must have a name".to_owned());
    }

    if rule.conditions.is_empty() {
        errors.push("Rule must have conditions".to_owned());
    } else {
        validate_condition(&rule.conditions, &mut errors);
    }

    errors
}

fn validate_condition(condition: &ConditionSpec, errors: &mut Vec<String>) {
    if condition.is_empty() {
        errors.push(
            "Condition must be either a simple condition with 'path' or a composite condition"
                .to_owned(),
        );
        return;
    }

    for (key, children) in [
        ("all", &condition.all),
        ("any", &condition.any),
        ("none", &condition.none),
    ] {
        if let Some(children) = children {
            if children.is_empty() {
                errors.push(format!("'{key}' must be a non-empty list of conditions"));
            }
            for child in children {
                validate_condition(child, errors);
            }
        }
    }

    if let Some(child) = &condition.negated {
        validate_condition(child, errors);
    }

    if condition.is_leaf() {
        validate_leaf(condition, errors);
    }
}

fn validate_leaf(condition: &ConditionSpec, errors: &mut Vec<String>) {
    let Some(operator) = condition.operator.as_deref().filter(|op| !op.is_empty()) else {
        errors.push("Simple condition must have an 'operator'".to_owned());
        return;
    };

    if Operator::from_tag(operator).is_none() {
        errors.push(format!("Unsupported operator: {operator}"));
    }

    // An explicit JSON null collapses into an absent value at the wire
    // layer, so it is rejected here like a missing one.
    if operator != "exists" && condition.value.is_none() {
        errors.push("Simple condition must have a 'value' unless operator is 'exists'".to_owned());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rule(name: &str, conditions: serde_json::Value) -> Rule {
        Rule::new(name, "device", serde_json::from_value(conditions).unwrap())
    }

    #[test]
    fn valid_rule_has_no_errors() {
        let errors = validate_rule(&rule(
            "r",
            json!({"all": [{"path": "$.x", "operator": "equal", "value": 1}]}),
        ));
        assert!(errors.is_empty());
    }

    #[test]
    fn blank_name_is_rejected() {
        let errors = validate_rule(&rule(
            "   ",
            json!({"path": "$.x", "operator": "equal", "value": 1}),
        ));
        assert_eq!(errors, vec!["Rule must have a name"]);
    }

    #[test]
    fn empty_conditions_are_rejected() {
        let errors = validate_rule(&rule("r", json!({})));
        assert_eq!(errors, vec!["Rule must have conditions"]);
    }

    #[test]
    fn empty_composite_list_is_rejected() {
        let errors = validate_rule(&rule("r", json!({"all": []})));
        assert_eq!(errors, vec!["'all' must be a non-empty list of conditions"]);
    }

    #[test]
    fn nested_invalid_child_is_reported() {
        let errors = validate_rule(&rule(
            "r",
            json!({"any": [
                {"path": "$.x", "operator": "equal", "value": 1},
                {}
            ]}),
        ));
        assert_eq!(
            errors,
            vec!["Condition must be either a simple condition with 'path' or a composite condition"]
        );
    }

    #[test]
    fn leaf_without_operator_is_rejected() {
        let errors = validate_rule(&rule("r", json!({"path": "$.x"})));
        assert_eq!(errors, vec!["Simple condition must have an 'operator'"]);
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let errors = validate_rule(&rule(
            "r",
            json!({"path": "$.x", "operator": "frobnicate", "value": 1}),
        ));
        assert_eq!(errors, vec!["Unsupported operator: frobnicate"]);
    }

    #[test]
    fn missing_value_is_allowed_only_for_exists() {
        let errors = validate_rule(&rule("r", json!({"path": "$.x", "operator": "exists"})));
        assert!(errors.is_empty());

        let errors = validate_rule(&rule("r", json!({"path": "$.x", "operator": "equal"})));
        assert_eq!(
            errors,
            vec!["Simple condition must have a 'value' unless operator is 'exists'"]
        );
    }

    #[test]
    fn explicit_null_value_counts_as_missing() {
        let errors = validate_rule(&rule(
            "r",
            json!({"path": "$.x", "operator": "equal", "value": null}),
        ));
        assert_eq!(
            errors,
            vec!["Simple condition must have a 'value' unless operator is 'exists'"]
        );
    }

    #[test]
    fn multiple_errors_accumulate() {
        let errors = validate_rule(&rule(
            " ",
            json!({"none": [
                {"path": "$.x", "operator": "bogus", "value": 1},
                {"path": "$.y"}
            ]}),
        ));
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], "Rule must have a name");
    }

    #[test]
    fn not_body_is_validated_recursively() {
        let errors = validate_rule(&rule("r", json!({"not": {"path": "$.x"}})));
        assert_eq!(errors, vec!["Simple condition must have an 'operator'"]);
    }
}
