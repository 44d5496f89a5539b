use axum::Json;
use axum::extract::State;
use tracing::info;

use super::AppState;
use super::schemas::{ErrorResponse, RuleCategoriesRequest, RuleCategoriesResponse};
use crate::error::ServerError;

/// `POST /rules/categories` -- add or remove categories on a stored rule.
///
/// The action is case-insensitive. Adding is a set union and removing a
/// set difference, so repeating a request changes nothing; removing every
/// category leaves the rule stored with an empty set.
#[utoipa::path(
    post,
    path = "/api/v1/rules/categories",
    tag = "Rules",
    summary = "Mutate rule categories",
    description = "Adds categories to or removes categories from a stored rule.",
    request_body(content = RuleCategoriesRequest, description = "The mutation to apply"),
    responses(
        (status = 200, description = "Categories updated", body = RuleCategoriesResponse),
        (status = 400, description = "Unknown action or nonexistent rule", body = ErrorResponse)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<RuleCategoriesRequest>,
) -> Result<Json<RuleCategoriesResponse>, ServerError> {
    let action = request.category_action.to_lowercase();

    let mut repository = state.repository.write().await;
    let outcome = match action.as_str() {
        "add" => repository.add_categories(
            &request.entity_type,
            &request.rule_name,
            &request.categories,
        ),
        "remove" => repository.remove_categories(
            &request.entity_type,
            &request.rule_name,
            &request.categories,
        ),
        _ => {
            return Err(ServerError::bad_request(
                "category_action must be 'add' or 'remove'",
            ));
        }
    };

    outcome.map_err(|e| ServerError::bad_request(e.to_string()))?;

    info!(
        rule_name = %request.rule_name,
        entity_type = %request.entity_type,
        action = %action,
        "rule categories updated"
    );

    Ok(Json(RuleCategoriesResponse {
        success: true,
        message: "Categories updated successfully".into(),
    }))
}
