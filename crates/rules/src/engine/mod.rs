pub mod eval;
pub mod executor;
pub mod ops;
pub mod path;
pub mod repository;

pub use executor::{RuleAnalysis, RuleFilter};
pub use ops::Operator;
pub use repository::RuleRepository;
