//! Recursive evaluation of a condition tree against one entity.

use dikast_core::FailureInfo;
use serde_json::Value;

use crate::engine::ops::Operator;
use crate::engine::path;
use crate::error::RuleError;
use crate::ir::condition::Condition;

/// Evaluate a condition against an entity, capturing per-leaf failures.
///
/// Returns `(passed, failures)`. Failures of passing subtrees are never
/// reported. The only error is an unsupported operator tag, which aborts
/// the evaluation of the owning rule.
pub fn evaluate_with_details(
    condition: &Condition,
    entity: &Value,
) -> Result<(bool, Vec<FailureInfo>), RuleError> {
    match condition {
        Condition::Leaf {
            path,
            operator,
            value,
        } => {
            let op = Operator::from_tag(operator)
                .ok_or_else(|| RuleError::UnsupportedOperator(operator.clone()))?;

            let actual = path::resolve(entity, path::simplify(path));
            if op.apply(&actual, value) {
                Ok((true, Vec::new()))
            } else {
                Ok((
                    false,
                    vec![FailureInfo::leaf(operator, path, value.clone(), actual)],
                ))
            }
        }

        Condition::All(children) => {
            let mut failures = Vec::new();
            let mut passed = true;
            for child in children {
                let (ok, child_failures) = evaluate_with_details(child, entity)?;
                if !ok {
                    passed = false;
                    failures.extend(child_failures);
                }
            }
            Ok((passed, failures))
        }

        Condition::Any(children) => {
            let mut failures = Vec::new();
            for child in children {
                let (ok, child_failures) = evaluate_with_details(child, entity)?;
                if ok {
                    return Ok((true, Vec::new()));
                }
                failures.extend(child_failures);
            }
            Ok((false, failures))
        }

        Condition::None(children) => {
            for child in children {
                let (ok, _) = evaluate_with_details(child, entity)?;
                if ok {
                    return Ok((false, vec![FailureInfo::marker("none", "composite")]));
                }
            }
            Ok((true, Vec::new()))
        }

        Condition::Not(child) => {
            let (ok, _) = evaluate_with_details(child, entity)?;
            if ok {
                Ok((false, vec![FailureInfo::marker("not", "composite")]))
            } else {
                Ok((true, Vec::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn condition(value: serde_json::Value) -> Condition {
        Condition::from_spec(&serde_json::from_value(value).unwrap()).unwrap()
    }

    #[test]
    fn leaf_failure_carries_expected_and_actual() {
        let cond = condition(json!({
            "path": "$.items[*].value", "operator": "equal", "value": 10
        }));

        let (ok, failures) = evaluate_with_details(&cond, &json!({"value": 15})).unwrap();
        assert!(!ok);
        assert_eq!(
            failures,
            vec![FailureInfo::leaf(
                "equal",
                "$.items[*].value",
                json!(10),
                json!(15)
            )]
        );
    }

    #[test]
    fn leaf_success_reports_no_failures() {
        let cond = condition(json!({
            "path": "$.items[*].value", "operator": "equal", "value": 10
        }));

        let (ok, failures) = evaluate_with_details(&cond, &json!({"value": 10})).unwrap();
        assert!(ok);
        assert!(failures.is_empty());
    }

    #[test]
    fn all_concatenates_failures_of_failing_children() {
        let cond = condition(json!({"all": [
            {"path": "$.a", "operator": "equal", "value": 1},
            {"path": "$.b", "operator": "equal", "value": 2},
            {"path": "$.c", "operator": "equal", "value": 3}
        ]}));

        let entity = json!({"a": 1, "b": 9, "c": 9});
        let (ok, failures) = evaluate_with_details(&cond, &entity).unwrap();
        assert!(!ok);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].path.as_deref(), Some("$.b"));
        assert_eq!(failures[1].path.as_deref(), Some("$.c"));
    }

    #[test]
    fn any_short_circuits_on_first_success() {
        let cond = condition(json!({"any": [
            {"path": "$.a", "operator": "equal", "value": 1},
            {"path": "$.b", "operator": "frobnicate", "value": 2}
        ]}));

        // The second child would error, but the first matches first.
        let (ok, failures) = evaluate_with_details(&cond, &json!({"a": 1})).unwrap();
        assert!(ok);
        assert!(failures.is_empty());
    }

    #[test]
    fn any_collects_all_failures_when_nothing_matches() {
        let cond = condition(json!({"any": [
            {"path": "$.a", "operator": "equal", "value": 1},
            {"path": "$.b", "operator": "equal", "value": 2}
        ]}));

        let (ok, failures) = evaluate_with_details(&cond, &json!({"a": 0, "b": 0})).unwrap();
        assert!(!ok);
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn none_reports_a_single_composite_failure() {
        let cond = condition(json!({"none": [
            {"path": "$.a", "operator": "equal", "value": 1}
        ]}));

        let (ok, failures) = evaluate_with_details(&cond, &json!({"a": 1})).unwrap();
        assert!(!ok);
        assert_eq!(failures, vec![FailureInfo::marker("none", "composite")]);

        let (ok, failures) = evaluate_with_details(&cond, &json!({"a": 2})).unwrap();
        assert!(ok);
        assert!(failures.is_empty());
    }

    #[test]
    fn not_negates_its_child() {
        let cond = condition(json!({"not":
            {"path": "$.a", "operator": "equal", "value": 1}
        }));

        let (ok, failures) = evaluate_with_details(&cond, &json!({"a": 1})).unwrap();
        assert!(!ok);
        assert_eq!(failures, vec![FailureInfo::marker("not", "composite")]);

        let (ok, _) = evaluate_with_details(&cond, &json!({"a": 2})).unwrap();
        assert!(ok);
    }

    #[test]
    fn unknown_operator_is_an_error() {
        let cond = condition(json!({
            "path": "$.a", "operator": "frobnicate", "value": 1
        }));

        let err = evaluate_with_details(&cond, &json!({"a": 1})).unwrap_err();
        assert!(matches!(err, RuleError::UnsupportedOperator(tag) if tag == "frobnicate"));
    }

    #[test]
    fn nested_composite_matches_version_policy() {
        // Cisco devices must run 17.x; other vendors are unconstrained.
        let cond = condition(json!({"any": [
            {"path": "$.devices[*].vendor", "operator": "not_equal", "value": "Cisco"},
            {"all": [
                {"path": "$.devices[*].vendor", "operator": "equal", "value": "Cisco"},
                {"path": "$.devices[*].osVersion", "operator": "match", "value": "^17\\."}
            ]}
        ]}));

        let current = json!({"vendor": "Cisco", "osVersion": "17.3.6"});
        let outdated = json!({"vendor": "Cisco", "osVersion": "16.9.5"});
        let other = json!({"vendor": "Juniper", "osVersion": "12.1"});

        assert!(evaluate_with_details(&cond, &current).unwrap().0);
        assert!(!evaluate_with_details(&cond, &outdated).unwrap().0);
        assert!(evaluate_with_details(&cond, &other).unwrap().0);
    }

    #[test]
    fn evaluation_is_pure() {
        let cond = condition(json!({"all": [
            {"path": "$.a", "operator": "greater_than", "value": 5}
        ]}));
        let entity = json!({"a": 3});

        let first = evaluate_with_details(&cond, &entity).unwrap();
        let second = evaluate_with_details(&cond, &entity).unwrap();
        assert_eq!(first, second);
    }
}
