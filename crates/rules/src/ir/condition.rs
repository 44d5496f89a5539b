use dikast_core::ConditionSpec;

use crate::error::RuleError;

/// The condition AST for rule bodies.
///
/// Conditions form a recursive boolean expression over one entity: leaves
/// address a value via a path and apply an operator, composites combine
/// their children. The tree is immutable once built and safe to share
/// across evaluations.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// All children must hold (logical AND).
    All(Vec<Condition>),
    /// At least one child must hold (logical OR).
    Any(Vec<Condition>),
    /// No child may hold (logical NOR).
    None(Vec<Condition>),
    /// The child must not hold (logical NOT).
    Not(Box<Condition>),
    /// A terminal predicate: path, operator tag, expected value.
    Leaf {
        /// Access path into the entity.
        path: String,
        /// Operator tag, resolved against the catalogue at evaluation time.
        operator: String,
        /// Expected value; `Null` when the wire form carried none.
        value: serde_json::Value,
    },
}

impl Condition {
    /// Build a condition tree from its wire form.
    ///
    /// Keys are inspected in precedence order `all > any > none > not >
    /// path`. A node with none of the recognised keys, or a leaf without an
    /// operator, fails construction.
    pub fn from_spec(spec: &ConditionSpec) -> Result<Self, RuleError> {
        let build_children = |specs: &[ConditionSpec]| -> Result<Vec<Condition>, RuleError> {
            specs.iter().map(Condition::from_spec).collect()
        };

        if let Some(children) = &spec.all {
            return Ok(Self::All(build_children(children)?));
        }
        if let Some(children) = &spec.any {
            return Ok(Self::Any(build_children(children)?));
        }
        if let Some(children) = &spec.none {
            return Ok(Self::None(build_children(children)?));
        }
        if let Some(child) = &spec.negated {
            return Ok(Self::Not(Box::new(Condition::from_spec(child)?)));
        }

        match (&spec.path, &spec.operator) {
            (Some(path), Some(operator)) => Ok(Self::Leaf {
                path: path.clone(),
                operator: operator.clone(),
                value: spec.value.clone().unwrap_or(serde_json::Value::Null),
            }),
            _ => Err(RuleError::InvalidConditions),
        }
    }

    /// Distinct leaf paths in tree order.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.walk(&mut |leaf_path, _| {
            if !out.iter().any(|p| p == leaf_path) {
                out.push(leaf_path.to_owned());
            }
        });
        out
    }

    /// Distinct operator tags in tree order.
    pub fn operators(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.walk(&mut |_, operator| {
            if !out.iter().any(|o| o == operator) {
                out.push(operator.to_owned());
            }
        });
        out
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _| count += 1);
        count
    }

    /// Nesting depth of the tree; a lone leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Not(child) => 1 + child.depth(),
            Self::All(children) | Self::Any(children) | Self::None(children) => {
                1 + children.iter().map(Condition::depth).max().unwrap_or(0)
            }
        }
    }

    fn walk(&self, visit: &mut impl FnMut(&str, &str)) {
        match self {
            Self::Leaf { path, operator, .. } => visit(path, operator),
            Self::Not(child) => child.walk(visit),
            Self::All(children) | Self::Any(children) | Self::None(children) => {
                for child in children {
                    child.walk(visit);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn spec(value: serde_json::Value) -> ConditionSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn leaf_construction() {
        let cond = Condition::from_spec(&spec(json!({
            "path": "$.items[*].value", "operator": "equal", "value": 10
        })))
        .unwrap();

        assert_eq!(
            cond,
            Condition::Leaf {
                path: "$.items[*].value".into(),
                operator: "equal".into(),
                value: json!(10),
            }
        );
    }

    #[test]
    fn composite_keys_take_precedence_over_path() {
        let cond = Condition::from_spec(&spec(json!({
            "all": [{"path": "$.a", "operator": "exists", "value": true}],
            "path": "$.ignored", "operator": "equal", "value": 1
        })))
        .unwrap();

        assert!(matches!(cond, Condition::All(children) if children.len() == 1));
    }

    #[test]
    fn empty_object_fails_construction() {
        let err = Condition::from_spec(&ConditionSpec::default()).unwrap_err();
        assert!(matches!(err, RuleError::InvalidConditions));
    }

    #[test]
    fn leaf_without_operator_fails_construction() {
        let err = Condition::from_spec(&spec(json!({"path": "$.a"}))).unwrap_err();
        assert!(matches!(err, RuleError::InvalidConditions));
    }

    #[test]
    fn invalid_nested_child_fails_construction() {
        let err = Condition::from_spec(&spec(json!({
            "any": [{"path": "$.a", "operator": "exists", "value": true}, {}]
        })))
        .unwrap_err();
        assert!(matches!(err, RuleError::InvalidConditions));
    }

    #[test]
    fn missing_value_defaults_to_null() {
        let cond = Condition::from_spec(&spec(json!({
            "path": "$.a", "operator": "exists"
        })))
        .unwrap();

        assert!(matches!(
            cond,
            Condition::Leaf { value: serde_json::Value::Null, .. }
        ));
    }

    #[test]
    fn walkers_report_structure() {
        let cond = Condition::from_spec(&spec(json!({
            "any": [
                {"path": "$.devices[*].vendor", "operator": "not_equal", "value": "Cisco"},
                {"all": [
                    {"path": "$.devices[*].vendor", "operator": "equal", "value": "Cisco"},
                    {"path": "$.devices[*].osVersion", "operator": "match", "value": "^17\\."}
                ]}
            ]
        })))
        .unwrap();

        assert_eq!(
            cond.paths(),
            vec!["$.devices[*].vendor", "$.devices[*].osVersion"]
        );
        assert_eq!(cond.operators(), vec!["not_equal", "equal", "match"]);
        assert_eq!(cond.leaf_count(), 3);
        assert_eq!(cond.depth(), 3);
    }
}
