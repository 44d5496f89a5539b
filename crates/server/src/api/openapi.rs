use dikast_core::{ConditionSpec, FailureInfo, RuleResult};
use dikast_rules::RuleAnalysis;

use super::schemas::{
    DataEvaluationItem, DataEvaluationResponse, DataEvaluationSummary, EntityTypeStats,
    ErrorResponse, EvaluationRequest, EvaluationResponse, EvaluationStatsResponse,
    EvaluationWithRulesRequest, HealthResponse, RuleCategoriesRequest, RuleCategoriesResponse,
    RuleFailureView, RuleListResponse, RuleStoreRequest, RuleStoreResponse, RuleUpload,
    RuleValidationResponse, RuleViewModel,
};

/// The OpenAPI document served at `/api-doc/openapi.json`.
#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Dikast Rule Engine API",
        version = "0.1.0",
        description = "A flexible rule engine for evaluating conditions against data. Store and tag declarative rules, then evaluate them against structured input documents.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Rules", description = "Rule storage, validation, and categories"),
        (name = "Evaluation", description = "Rule evaluation against input data")
    ),
    paths(
        super::health::health,
        super::rules::validate,
        super::rules::store,
        super::rules::list,
        super::categories::update,
        super::evaluate::evaluate,
        super::evaluate::evaluate_by_data,
        super::evaluate::evaluate_with_rules,
        super::evaluate::stats,
        super::evaluate::failure_details,
    ),
    components(schemas(
        ConditionSpec, FailureInfo, RuleResult, RuleAnalysis,
        HealthResponse, ErrorResponse,
        RuleUpload, RuleStoreRequest, RuleStoreResponse, RuleValidationResponse,
        RuleViewModel, RuleListResponse, EntityTypeStats,
        RuleCategoriesRequest, RuleCategoriesResponse,
        EvaluationRequest, EvaluationWithRulesRequest, EvaluationResponse,
        DataEvaluationResponse, DataEvaluationItem, DataEvaluationSummary, RuleFailureView,
        EvaluationStatsResponse,
    ))
)]
pub struct ApiDoc;
