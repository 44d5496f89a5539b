use thiserror::Error;

/// Errors raised by the rule engine.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A condition tree could not be built from its wire form.
    #[error("invalid condition tree")]
    InvalidConditions,

    /// A leaf named an operator outside the supported catalogue.
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// The input document was supplied as a string and failed to parse.
    #[error("invalid input data: {0}")]
    InvalidData(String),

    /// A rule lookup by `(entity_type, name)` found nothing.
    #[error("rule with name '{name}' not found for entity type '{entity_type}'")]
    RuleNotFound {
        /// The entity type that was searched.
        entity_type: String,
        /// The rule name that was not found.
        name: String,
    },
}
