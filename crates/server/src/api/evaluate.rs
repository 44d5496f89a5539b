use axum::Json;
use axum::extract::{Path, Query, State};
use tracing::info;

use dikast_core::Rule;
use dikast_rules::{RuleAnalysis, RuleError, RuleFilter, supported_tags};

use super::AppState;
use super::schemas::{
    DataEvaluationResponse, ErrorResponse, EvaluationRequest, EvaluationResponse,
    EvaluationStatsResponse, EvaluationWithRulesRequest, FailureDetailsQuery, RuleUpload,
};
use crate::error::ServerError;

/// `POST /evaluate` -- evaluate stored rules against an input document.
///
/// Exactly one of `categories` and `rule_names` selects the rules to run.
/// Per-rule evaluation problems are reported inside the results with
/// `success=false`; only a malformed request or unparseable data is `400`.
#[utoipa::path(
    post,
    path = "/api/v1/evaluate",
    tag = "Evaluation",
    summary = "Evaluate stored rules",
    description = "Runs the selected stored rules against the supplied data and reports one result per rule.",
    request_body(content = EvaluationRequest, description = "Data and rule selection"),
    responses(
        (status = 200, description = "Per-rule evaluation report", body = EvaluationResponse),
        (status = 400, description = "Invalid request or unparseable data", body = ErrorResponse)
    )
)]
pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<EvaluationResponse>, ServerError> {
    let filter = exclusive_filter(&request.categories, &request.rule_names)?;

    let repository = state.repository.read().await;
    let results = dikast_rules::evaluate_stored(&repository, &request.data, &request.entity_type, &filter)
        .map_err(fatal)?;
    drop(repository);

    info!(
        entity_type = %request.entity_type,
        total_rules = results.len(),
        "evaluation completed"
    );

    Ok(Json(EvaluationResponse::from_results(
        request.entity_type,
        request.categories,
        request.rule_names,
        results,
    )))
}

/// `POST /evaluate/by-data` -- evaluate stored rules, reported per entity.
///
/// Same selection semantics as `/evaluate`, but the response lists, for
/// each input entity, which rules it fulfilled and which it failed.
#[utoipa::path(
    post,
    path = "/api/v1/evaluate/by-data",
    tag = "Evaluation",
    summary = "Evaluate stored rules per entity",
    description = "Runs the selected stored rules and organises the outcome by input entity instead of by rule.",
    request_body(content = EvaluationRequest, description = "Data and rule selection"),
    responses(
        (status = 200, description = "Per-entity evaluation report", body = DataEvaluationResponse),
        (status = 400, description = "Invalid request or unparseable data", body = ErrorResponse)
    )
)]
pub async fn evaluate_by_data(
    State(state): State<AppState>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<DataEvaluationResponse>, ServerError> {
    let filter = exclusive_filter(&request.categories, &request.rule_names)?;

    let repository = state.repository.read().await;
    let (results, reports) = dikast_rules::evaluate_by_entity(
        &repository,
        &request.data,
        &request.entity_type,
        &filter,
    )
    .map_err(fatal)?;
    drop(repository);

    info!(
        entity_type = %request.entity_type,
        total_rules = results.len(),
        total_data_objects = reports.len(),
        "by-entity evaluation completed"
    );

    Ok(Json(DataEvaluationResponse {
        entity_type: request.entity_type,
        categories: request.categories,
        rule_names: request.rule_names,
        total_rules: results.len(),
        total_data_objects: reports.len(),
        results: reports.into_iter().map(Into::into).collect(),
    }))
}

/// `POST /evaluate/with-rules` -- evaluate supplied rules without storing.
#[utoipa::path(
    post,
    path = "/api/v1/evaluate/with-rules",
    tag = "Evaluation",
    summary = "Evaluate ad-hoc rules",
    description = "Runs the supplied rule definitions against the data. The stored rule set is not consulted or modified.",
    request_body(content = EvaluationWithRulesRequest, description = "Data and rule definitions"),
    responses(
        (status = 200, description = "Per-rule evaluation report", body = EvaluationResponse),
        (status = 400, description = "Invalid request or unparseable data", body = ErrorResponse)
    )
)]
pub async fn evaluate_with_rules(
    State(state): State<AppState>,
    Json(request): Json<EvaluationWithRulesRequest>,
) -> Result<Json<EvaluationResponse>, ServerError> {
    let max = state.config.engine.max_rules_per_request;
    if request.rules.len() > max {
        return Err(ServerError::bad_request(format!(
            "request contains {} rules, exceeding the limit of {max}",
            request.rules.len()
        )));
    }

    let rules: Vec<Rule> = request
        .rules
        .into_iter()
        .map(|upload: RuleUpload| {
            upload.into_rule(
                Some(&request.entity_type),
                &state.config.engine.default_entity_type,
            )
        })
        .collect();

    let results =
        dikast_rules::evaluate_adhoc(&request.data, &request.entity_type, rules).map_err(fatal)?;

    info!(
        entity_type = %request.entity_type,
        total_rules = results.len(),
        "ad-hoc evaluation completed"
    );

    Ok(Json(EvaluationResponse::from_results(
        request.entity_type,
        None,
        None,
        results,
    )))
}

/// `GET /evaluate/stats` -- aggregate statistics over the stored rules.
#[utoipa::path(
    get,
    path = "/api/v1/evaluate/stats",
    tag = "Evaluation",
    summary = "Rule set statistics",
    description = "Returns rule counts per entity type and category, the supported operators, and the configured limits.",
    responses(
        (status = 200, description = "Aggregate statistics", body = EvaluationStatsResponse)
    )
)]
pub async fn stats(State(state): State<AppState>) -> Json<EvaluationStatsResponse> {
    let repository = state.repository.read().await;

    let entity_types = repository.entity_types();
    let stats_by_entity_type = entity_types
        .iter()
        .map(|entity_type| {
            let counts = repository.category_counts(entity_type);
            let total = repository.get_many(Some(entity_type), None).len();
            (
                entity_type.clone(),
                super::schemas::EntityTypeStats {
                    total_rules: total,
                    rules_by_category: counts,
                },
            )
        })
        .collect();

    Json(EvaluationStatsResponse {
        total_rules: repository.rule_count(),
        entity_type_count: entity_types.len(),
        entity_types,
        stats_by_entity_type,
        supported_operators: supported_tags().iter().map(|s| (*s).to_owned()).collect(),
        max_rules_per_request: state.config.engine.max_rules_per_request,
    })
}

/// `GET /evaluate/failure-details/{rule_name}` -- analyse a stored rule.
///
/// Reports the structure of the rule's condition tree: the paths and
/// operators it uses, its nesting depth, and its leaf count.
#[utoipa::path(
    get,
    path = "/api/v1/evaluate/failure-details/{rule_name}",
    tag = "Evaluation",
    summary = "Analyse a stored rule",
    description = "Returns a structural analysis of a stored rule's condition tree.",
    params(
        ("rule_name" = String, Path, description = "Name of the rule to analyse"),
        ("entity_type" = Option<String>, Query, description = "Entity type to search; all when absent")
    ),
    responses(
        (status = 200, description = "Structural analysis", body = RuleAnalysis),
        (status = 404, description = "Rule not found", body = ErrorResponse)
    )
)]
pub async fn failure_details(
    State(state): State<AppState>,
    Path(rule_name): Path<String>,
    Query(query): Query<FailureDetailsQuery>,
) -> Result<Json<RuleAnalysis>, ServerError> {
    let repository = state.repository.read().await;

    let stored = repository
        .find_by_name(&rule_name, query.entity_type.as_deref())
        .ok_or_else(|| ServerError::NotFound(format!("rule not found: {rule_name}")))?;

    let analysis =
        dikast_rules::analyze_rule(stored).map_err(|e| ServerError::bad_request(e.to_string()))?;

    Ok(Json(analysis))
}

/// Resolve the mutually exclusive category/name selection of an evaluate
/// request.
fn exclusive_filter(
    categories: &Option<Vec<String>>,
    rule_names: &Option<Vec<String>>,
) -> Result<RuleFilter, ServerError> {
    match (categories, rule_names) {
        (Some(_), Some(_)) => Err(ServerError::bad_request(
            "Only one of 'categories' or 'rule_names' may be provided",
        )),
        (Some(categories), None) if !categories.is_empty() => {
            Ok(RuleFilter::Categories(categories.clone()))
        }
        (None, Some(rule_names)) if !rule_names.is_empty() => {
            Ok(RuleFilter::Names(rule_names.clone()))
        }
        (Some(_), None) => Err(ServerError::bad_request("'categories' must not be empty")),
        (None, Some(_)) => Err(ServerError::bad_request("'rule_names' must not be empty")),
        (None, None) => Err(ServerError::bad_request(
            "At least one of 'categories' or 'rule_names' must be provided",
        )),
    }
}

/// Map a fatal pipeline error onto the HTTP taxonomy.
fn fatal(error: RuleError) -> ServerError {
    ServerError::bad_request(format!("Error evaluating data: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_filter_accepts_exactly_one_selection() {
        let cats = Some(vec!["a".to_owned()]);
        let names = Some(vec!["r".to_owned()]);

        assert!(matches!(
            exclusive_filter(&cats, &None),
            Ok(RuleFilter::Categories(_))
        ));
        assert!(matches!(
            exclusive_filter(&None, &names),
            Ok(RuleFilter::Names(_))
        ));
        assert!(exclusive_filter(&cats, &names).is_err());
        assert!(exclusive_filter(&None, &None).is_err());
        assert!(exclusive_filter(&Some(vec![]), &None).is_err());
        assert!(exclusive_filter(&None, &Some(vec![])).is_err());
    }
}
