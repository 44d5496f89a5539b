//! The closed operator catalogue applied at condition leaves.
//!
//! Every operator is a binary predicate `(actual, expected) -> bool`.
//! Type mismatches make an operator return `false`; they never raise.
//! Only an unknown operator tag is an error, surfaced per rule by the
//! evaluator.

use serde_json::Value;

/// A leaf operator from the supported catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Structural value equality.
    Equal,
    /// Negation of [`Operator::Equal`].
    NotEqual,
    /// Numeric `>`.
    GreaterThan,
    /// Numeric `<`.
    LessThan,
    /// Numeric `>=`.
    GreaterThanEqual,
    /// Numeric `<=`.
    LessThanEqual,
    /// Presence test against the expected truthiness.
    Exists,
    /// Non-emptiness test against the expected truthiness.
    NotEmpty,
    /// Regex match anchored at the start of the actual string.
    Match,
    /// Substring or list membership.
    Contains,
    /// Membership of the actual value in the expected list.
    InList,
    /// Negation of [`Operator::InList`].
    NotInList,
    /// Device-role digit encoded in a hostname.
    RoleDevice,
    /// Container length upper bound.
    MaxLength,
    /// Exact container length.
    ExactLength,
}

/// Every accepted operator tag, aliases included.
const TAGS: &[(&str, Operator)] = &[
    ("equal", Operator::Equal),
    ("eq", Operator::Equal),
    ("=", Operator::Equal),
    ("not_equal", Operator::NotEqual),
    ("neq", Operator::NotEqual),
    ("greater_than", Operator::GreaterThan),
    ("gt", Operator::GreaterThan),
    ("less_than", Operator::LessThan),
    ("lt", Operator::LessThan),
    ("greater_than_equal", Operator::GreaterThanEqual),
    ("gte", Operator::GreaterThanEqual),
    ("less_than_equal", Operator::LessThanEqual),
    ("lte", Operator::LessThanEqual),
    ("exists", Operator::Exists),
    ("not_empty", Operator::NotEmpty),
    ("match", Operator::Match),
    ("matches", Operator::Match),
    ("contains", Operator::Contains),
    ("in_list", Operator::InList),
    ("not_in_list", Operator::NotInList),
    ("role_device", Operator::RoleDevice),
    ("max_length", Operator::MaxLength),
    ("exact_length", Operator::ExactLength),
];

/// All operator tags accepted at a leaf.
pub fn supported_tags() -> Vec<&'static str> {
    TAGS.iter().map(|(tag, _)| *tag).collect()
}

impl Operator {
    /// Resolve an operator tag, honouring aliases. Returns `None` for tags
    /// outside the catalogue.
    pub fn from_tag(tag: &str) -> Option<Self> {
        TAGS.iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, op)| *op)
    }

    /// Apply the operator to an actual/expected pair.
    pub fn apply(self, actual: &Value, expected: &Value) -> bool {
        match self {
            Self::Equal => values_equal(actual, expected),
            Self::NotEqual => !values_equal(actual, expected),
            Self::GreaterThan => numeric_cmp(actual, expected, |a, e| a > e),
            Self::LessThan => numeric_cmp(actual, expected, |a, e| a < e),
            Self::GreaterThanEqual => numeric_cmp(actual, expected, |a, e| a >= e),
            Self::LessThanEqual => numeric_cmp(actual, expected, |a, e| a <= e),
            Self::Exists => !actual.is_null() == truthy(expected),
            Self::NotEmpty => not_empty(actual, expected),
            Self::Match => regex_match(actual, expected),
            Self::Contains => contains(actual, expected),
            Self::InList => in_list(actual, expected),
            Self::NotInList => !in_list(actual, expected),
            Self::RoleDevice => role_device(actual, expected),
            Self::MaxLength => length_cmp(actual, expected, |len, e| len <= e),
            Self::ExactLength => length_cmp(actual, expected, |len, e| (len - e).abs() < f64::EPSILON),
        }
    }
}

/// Structural equality with numeric awareness: `10` equals `10.0`, and the
/// comparison recurses through arrays and objects.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Truthiness in the sense dynamic languages give JSON values: null,
/// `false`, zero, and empty containers are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(v) => !v.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

/// Coerce a value to a float for the comparison operators. Accepts
/// numbers, numeric strings, and booleans.
fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn numeric_cmp(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (as_float(actual), as_float(expected)) {
        (Some(a), Some(e)) => cmp(a, e),
        _ => false,
    }
}

fn not_empty(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Null => !truthy(expected),
        Value::String(_) | Value::Array(_) | Value::Object(_) => {
            truthy(actual) == truthy(expected)
        }
        _ => truthy(expected),
    }
}

fn regex_match(actual: &Value, expected: &Value) -> bool {
    let (Value::String(actual), Value::String(pattern)) = (actual, expected) else {
        return false;
    };
    // Compile failures fail the leaf rather than the rule.
    let Ok(regex) = regex::Regex::new(pattern) else {
        return false;
    };
    regex.find(actual).is_some_and(|m| m.start() == 0)
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(haystack) => expected
            .as_str()
            .is_some_and(|needle| haystack.contains(needle)),
        Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
        _ => false,
    }
}

fn in_list(actual: &Value, expected: &Value) -> bool {
    expected
        .as_array()
        .is_some_and(|list| list.iter().any(|item| values_equal(item, actual)))
}

/// Device-role check: the hostname encodes the role as the digit at
/// position `len - 3` (`0` standalone, `1` primary, `2` secondary).
fn role_device(actual: &Value, expected: &Value) -> bool {
    let code = match expected.as_str() {
        Some("standalone") => '0',
        Some("primary") => '1',
        Some("secondary") => '2',
        _ => return false,
    };

    let Some(hostname) = actual.as_str() else {
        return false;
    };
    let chars: Vec<char> = hostname.chars().collect();
    if chars.len() < 3 {
        return false;
    }
    chars[chars.len() - 3] == code
}

/// Length of a container value; `None` for scalars.
fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(v) => Some(v.len()),
        Value::Object(m) => Some(m.len()),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn length_cmp(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (length(actual), expected.as_f64()) {
        (Some(len), Some(e)) => cmp(len as f64, e),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn apply(tag: &str, actual: serde_json::Value, expected: serde_json::Value) -> bool {
        Operator::from_tag(tag).unwrap().apply(&actual, &expected)
    }

    #[test]
    fn aliases_resolve_to_the_same_operator() {
        assert_eq!(Operator::from_tag("eq"), Some(Operator::Equal));
        assert_eq!(Operator::from_tag("="), Some(Operator::Equal));
        assert_eq!(Operator::from_tag("neq"), Some(Operator::NotEqual));
        assert_eq!(Operator::from_tag("gte"), Some(Operator::GreaterThanEqual));
        assert_eq!(Operator::from_tag("matches"), Some(Operator::Match));
        assert_eq!(Operator::from_tag("frobnicate"), None);
    }

    #[test]
    fn equality_is_numeric_aware() {
        assert!(apply("equal", json!(10), json!(10)));
        assert!(apply("equal", json!(10), json!(10.0)));
        assert!(apply("equal", json!([1, 2.0]), json!([1.0, 2])));
        assert!(!apply("equal", json!(10), json!("10")));
        assert!(apply("not_equal", json!("a"), json!("b")));
    }

    #[test]
    fn comparisons_coerce_numeric_strings() {
        assert!(apply("greater_than", json!("17.3"), json!(10)));
        assert!(apply("less_than", json!(9), json!("10")));
        assert!(apply("greater_than_equal", json!(10), json!(10)));
        assert!(apply("less_than_equal", json!(10), json!(10)));
        assert!(!apply("greater_than", json!("abc"), json!(10)));
        assert!(!apply("less_than", json!(null), json!(10)));
    }

    #[test]
    fn exists_compares_presence_to_expected_truthiness() {
        assert!(apply("exists", json!("anything"), json!(true)));
        assert!(apply("exists", json!(null), json!(false)));
        assert!(!apply("exists", json!(null), json!(true)));
        assert!(!apply("exists", json!("anything"), json!(false)));
    }

    #[test]
    fn not_empty_handles_containers_and_null() {
        assert!(apply("not_empty", json!([1]), json!(true)));
        assert!(apply("not_empty", json!([]), json!(false)));
        assert!(apply("not_empty", json!(""), json!(false)));
        assert!(apply("not_empty", json!(null), json!(false)));
        assert!(!apply("not_empty", json!(null), json!(true)));
        // Scalars have no emptiness; only the expectation decides.
        assert!(apply("not_empty", json!(7), json!(true)));
        assert!(!apply("not_empty", json!(7), json!(false)));
    }

    #[test]
    fn match_is_anchored_at_start() {
        assert!(apply("match", json!("17.3.6"), json!("^17\\.")));
        assert!(apply("match", json!("17.3.6"), json!("17")));
        assert!(!apply("match", json!("v17.3.6"), json!("17")));
        assert!(!apply("match", json!(17), json!("17")));
        assert!(!apply("match", json!("17"), json!("(")));
    }

    #[test]
    fn contains_does_substring_and_membership() {
        assert!(apply("contains", json!("Cisco Systems"), json!("Cisco")));
        assert!(apply("contains", json!(["a", "b"]), json!("b")));
        assert!(apply("contains", json!([1, 2]), json!(2.0)));
        assert!(!apply("contains", json!(null), json!("a")));
        assert!(!apply("contains", json!("abc"), json!(1)));
    }

    #[test]
    fn in_list_requires_a_list_expectation() {
        assert!(apply("in_list", json!("b"), json!(["a", "b"])));
        assert!(!apply("in_list", json!("c"), json!(["a", "b"])));
        assert!(!apply("in_list", json!("a"), json!("not-a-list")));
        assert!(apply("not_in_list", json!("c"), json!(["a", "b"])));
        assert!(apply("not_in_list", json!("a"), json!("not-a-list")));
    }

    #[test]
    fn role_device_reads_third_character_from_the_end() {
        assert!(apply("role_device", json!("HUJ-AA-101"), json!("primary")));
        assert!(!apply("role_device", json!("HUJ-AA-201"), json!("primary")));
        assert!(apply("role_device", json!("HUJ-AA-201"), json!("secondary")));
        assert!(apply("role_device", json!("HUJ-AA-001"), json!("standalone")));
        assert!(!apply("role_device", json!("01"), json!("primary")));
        assert!(!apply("role_device", json!("HUJ-AA-101"), json!("unknown")));
        assert!(!apply("role_device", json!(101), json!("primary")));
    }

    #[test]
    fn length_operators_cover_containers_only() {
        assert!(apply("max_length", json!("abc"), json!(3)));
        assert!(!apply("max_length", json!("abcd"), json!(3)));
        assert!(apply("max_length", json!([1, 2]), json!(5)));
        assert!(apply("exact_length", json!({"a": 1, "b": 2}), json!(2)));
        assert!(!apply("exact_length", json!("abc"), json!(2)));
        assert!(!apply("max_length", json!(42), json!(10)));
        assert!(!apply("max_length", json!("abc"), json!("x")));
    }

    #[test]
    fn supported_tags_cover_the_catalogue() {
        let tags = supported_tags();
        assert!(tags.contains(&"equal"));
        assert!(tags.contains(&"role_device"));
        assert!(tags.contains(&"not_in_list"));
        assert_eq!(tags.len(), 23);
    }
}
