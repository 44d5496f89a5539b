use std::collections::{BTreeMap, BTreeSet};

use axum::Json;
use axum::extract::State;
// axum_extra's `Query` handles repeated query parameters with the same
// name, which the plain axum extractor does not.
use axum_extra::extract::Query;
use tracing::info;

use dikast_core::{Rule, StoredRule};
use dikast_rules::validate_rule;

use super::AppState;
use super::schemas::{
    EntityTypeStats, ErrorResponse, RuleListQuery, RuleListResponse, RuleStoreRequest,
    RuleStoreResponse, RuleUpload, RuleValidationResponse, RuleViewModel,
};
use crate::error::ServerError;

/// `POST /rules/validate` -- validate a single rule without storing it.
///
/// Validation problems are reported in the body; the response is always
/// `200`.
#[utoipa::path(
    post,
    path = "/api/v1/rules/validate",
    tag = "Rules",
    summary = "Validate a rule",
    description = "Checks a rule's structure and reports every problem found. Nothing is stored.",
    request_body(content = RuleUpload, description = "The rule to validate"),
    responses(
        (status = 200, description = "Validation outcome", body = RuleValidationResponse)
    )
)]
pub async fn validate(
    State(state): State<AppState>,
    Json(upload): Json<RuleUpload>,
) -> Json<RuleValidationResponse> {
    let rule = upload.into_rule(None, &state.config.engine.default_entity_type);
    let errors = validate_rule(&rule);

    Json(RuleValidationResponse {
        valid: errors.is_empty(),
        errors: if errors.is_empty() { None } else { Some(errors) },
    })
}

/// `POST /rules` -- upsert a batch of rules.
///
/// The whole batch is validated before anything is stored; a single
/// invalid rule rejects the batch with `400`. Rules are applied in order,
/// so an intra-request duplicate name upserts left-to-right with the later
/// occurrence winning.
#[utoipa::path(
    post,
    path = "/api/v1/rules",
    tag = "Rules",
    summary = "Store rules",
    description = "Validates and upserts a batch of rules. Re-storing an existing rule replaces its definition and merges its categories.",
    request_body(content = RuleStoreRequest, description = "The rules to store"),
    responses(
        (status = 200, description = "Rules stored", body = RuleStoreResponse),
        (status = 400, description = "Invalid request or rule validation failure", body = ErrorResponse)
    )
)]
pub async fn store(
    State(state): State<AppState>,
    Json(request): Json<RuleStoreRequest>,
) -> Result<Json<RuleStoreResponse>, ServerError> {
    let max = state.config.engine.max_rules_per_request;
    if request.rules.len() > max {
        return Err(ServerError::bad_request(format!(
            "request contains {} rules, exceeding the limit of {max}",
            request.rules.len()
        )));
    }

    let default_entity_type = &state.config.engine.default_entity_type;
    let prepared: Vec<(Rule, BTreeSet<String>)> = request
        .rules
        .into_iter()
        .map(|upload| {
            let categories: BTreeSet<String> = if upload.add_to_categories.is_empty() {
                request.default_category.iter().cloned().collect()
            } else {
                upload.add_to_categories.iter().cloned().collect()
            };
            let rule = upload.into_rule(request.entity_type.as_deref(), default_entity_type);
            (rule, categories)
        })
        .collect();

    let errors: Vec<String> = prepared
        .iter()
        .flat_map(|(rule, _)| {
            validate_rule(rule)
                .into_iter()
                .map(move |error| format!("rule '{}': {error}", rule.name))
        })
        .collect();
    if !errors.is_empty() {
        return Err(ServerError::Validation(errors));
    }

    let stored = prepared.len();
    let mut repository = state.repository.write().await;
    for (rule, categories) in prepared {
        repository.upsert(rule, categories);
    }

    info!(stored, "rules stored");
    Ok(Json(RuleStoreResponse {
        success: true,
        message: format!("Successfully stored {stored} rules"),
        stored_rules: stored,
    }))
}

/// `GET /rules` -- list stored rules with per-entity-type statistics.
///
/// Supports filtering by entity type and by a comma-separated category
/// list; a rule matches when it carries any of the given categories.
#[utoipa::path(
    get,
    path = "/api/v1/rules",
    tag = "Rules",
    summary = "List rules",
    description = "Returns stored rules sorted by entity type and name, with category statistics per entity type.",
    params(
        ("entity_type" = Option<String>, Query, description = "Restrict to one entity type"),
        ("categories" = Option<Vec<String>>, Query, description = "Repeatable category filter; rules matching any are listed")
    ),
    responses(
        (status = 200, description = "The rule listing", body = RuleListResponse)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<RuleListQuery>,
) -> Json<RuleListResponse> {
    let categories = if query.categories.is_empty() {
        None
    } else {
        Some(query.categories)
    };

    let repository = state.repository.read().await;
    let selected = repository.get_many(query.entity_type.as_deref(), categories.as_deref());

    let mut entity_types: Vec<String> = Vec::new();
    let mut stats: BTreeMap<String, EntityTypeStats> = BTreeMap::new();

    for stored in &selected {
        let entity_type = stored.entity_type().to_owned();
        if entity_types.last() != Some(&entity_type) {
            entity_types.push(entity_type.clone());
        }

        let entry = stats.entry(entity_type).or_insert_with(|| EntityTypeStats {
            total_rules: 0,
            rules_by_category: BTreeMap::new(),
        });
        entry.total_rules += 1;
        for category in &stored.categories {
            *entry.rules_by_category.entry(category.clone()).or_insert(0) += 1;
        }
    }

    let rules = selected.into_iter().map(view_model).collect();

    Json(RuleListResponse {
        entity_types,
        rules,
        stats,
    })
}

fn view_model(stored: &StoredRule) -> RuleViewModel {
    RuleViewModel {
        rule_name: stored.name().to_owned(),
        entity_type: stored.entity_type().to_owned(),
        description: stored.rule.description.clone(),
        conditions: stored.rule.conditions.pruned().unwrap_or_default(),
        categories_associated_with: stored.categories.iter().cloned().collect(),
    }
}
