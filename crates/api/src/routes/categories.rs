use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use validator::Validate;

use arbor_domain::categories::{Category, CategoryCreate, CategoryDelete, CategoryUpdate};

use super::map_domain_error;
use crate::{error::ApiError, observability, state::AppState, validation};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ListCategoriesQuery {
    #[validate(length(min = 1, max = 128))]
    user_uuid: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 256))]
    name: String,
    #[validate(length(min = 1, max = 128))]
    user_uuid: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    parent_uuid: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 256))]
    name: String,
    #[validate(length(min = 1, max = 128))]
    user_uuid: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct DeleteCategoryRequest {
    #[validate(length(min = 1, max = 128))]
    user_uuid: String,
}

pub(crate) async fn list_categories(
    State(state): State<AppState>,
    query: Result<Query<ListCategoriesQuery>, QueryRejection>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let Query(query) = query.map_err(validation::query_rejection)?;
    validation::validate(&query)?;
    let categories = state
        .categories
        .get_categories(&query.user_uuid)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(categories))
}

pub(crate) async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(validation::json_rejection)?;
    validation::validate(&payload)?;
    let category = state
        .categories
        .create_category(CategoryCreate {
            name: payload.name,
            user_id: payload.user_uuid,
            parent_id: payload.parent_uuid,
        })
        .await
        .map_err(map_domain_error)?;

    observability::register_category_mutation(if category.is_root() {
        "create_root"
    } else {
        "create_child"
    });
    tracing::info!(category_id = %category.id, "category created");
    let location = format!("/api/categories/{}", category.id);
    Ok((StatusCode::NO_CONTENT, [(header::LOCATION, location)]).into_response())
}

pub(crate) async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    payload: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload.map_err(validation::json_rejection)?;
    validation::validate(&payload)?;
    state
        .categories
        .update_category(CategoryUpdate {
            category_id,
            name: payload.name,
            user_id: payload.user_uuid,
        })
        .await
        .map_err(map_domain_error)?;
    observability::register_category_mutation("rename");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    payload: Result<Json<DeleteCategoryRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload.map_err(validation::json_rejection)?;
    validation::validate(&payload)?;
    state
        .categories
        .delete_category(CategoryDelete {
            category_id,
            user_id: payload.user_uuid,
        })
        .await
        .map_err(map_domain_error)?;
    observability::register_category_mutation("delete");
    Ok(StatusCode::NO_CONTENT)
}
