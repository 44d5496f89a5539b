pub mod engine;
pub mod error;
pub mod ir;
pub mod validate;

pub use engine::executor::{
    RuleAnalysis, RuleFilter, analyze_rule, evaluate_adhoc, evaluate_by_entity, evaluate_stored,
};
pub use engine::ops::{Operator, supported_tags};
pub use engine::repository::RuleRepository;
pub use error::RuleError;
pub use ir::condition::Condition;
pub use validate::validate_rule;
