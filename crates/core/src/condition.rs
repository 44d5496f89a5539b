use serde::{Deserialize, Serialize};

/// Wire representation of a rule condition.
///
/// A condition object carries exactly one of the composite keys (`all`,
/// `any`, `none`, `not`) or the leaf triple (`path`, `operator`, `value`).
/// When more than one key is present, construction of the evaluation tree
/// resolves the ambiguity in the order `all > any > none > not > path`.
/// Unknown keys are ignored on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(example = json!({
    "path": "$.devices[*].vendor",
    "operator": "equal",
    "value": "Cisco Systems"
})))]
pub struct ConditionSpec {
    /// Access path into an entity, e.g. `$.devices[*].osVersion`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Operator tag applied at this leaf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    /// Expected value the operator compares against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub value: Option<serde_json::Value>,

    /// Sub-conditions that must all hold (logical AND).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(no_recursion))]
    pub all: Option<Vec<ConditionSpec>>,

    /// Sub-conditions of which at least one must hold (logical OR).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(no_recursion))]
    pub any: Option<Vec<ConditionSpec>>,

    /// Sub-conditions of which none may hold (logical NOR).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(no_recursion))]
    pub none: Option<Vec<ConditionSpec>>,

    /// Sub-condition that must not hold (logical NOT).
    ///
    /// The field is renamed on the wire; `not` is a keyword in Rust.
    #[serde(rename = "not", default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(no_recursion))]
    pub negated: Option<Box<ConditionSpec>>,
}

impl ConditionSpec {
    /// Returns `true` if this node carries a leaf path.
    pub fn is_leaf(&self) -> bool {
        self.path.is_some()
    }

    /// Returns `true` if this node carries any composite key.
    pub fn is_composite(&self) -> bool {
        self.all.is_some() || self.any.is_some() || self.none.is_some() || self.negated.is_some()
    }

    /// Returns `true` if the node carries neither a leaf path nor a
    /// composite key and therefore describes nothing.
    pub fn is_empty(&self) -> bool {
        !self.is_leaf() && !self.is_composite()
    }

    /// Recursively remove empty composite lists and empty `not` bodies.
    ///
    /// Clients introspect serialized rule shapes, so the wire contract is
    /// that a serialized condition never contains a `null` field, an empty
    /// `all`/`any`/`none` array, or a `not` without a body. Returns `None`
    /// when nothing of substance remains at this level.
    #[must_use]
    pub fn pruned(&self) -> Option<ConditionSpec> {
        let prune_list = |list: &Option<Vec<ConditionSpec>>| -> Option<Vec<ConditionSpec>> {
            let cleaned: Vec<ConditionSpec> = list
                .as_deref()
                .unwrap_or_default()
                .iter()
                .filter_map(ConditionSpec::pruned)
                .collect();
            if cleaned.is_empty() { None } else { Some(cleaned) }
        };

        let out = ConditionSpec {
            path: self.path.clone(),
            operator: self.operator.clone(),
            value: self.value.clone(),
            all: prune_list(&self.all),
            any: prune_list(&self.any),
            none: prune_list(&self.none),
            negated: self
                .negated
                .as_ref()
                .and_then(|c| c.pruned())
                .map(Box::new),
        };

        if out.is_empty() { None } else { Some(out) }
    }
}
