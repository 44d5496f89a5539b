pub mod condition;
pub mod result;
pub mod rule;

pub use condition::ConditionSpec;
pub use result::{EntityEvaluation, FailureInfo, RuleFailures, RuleResult};
pub use rule::{Rule, RuleKey, StoredRule};
