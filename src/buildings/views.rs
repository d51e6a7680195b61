use super::models::{Building, BuildingInput};
use super::services;
use crate::common::auth::{CurrentUser, require_login};
use crate::common::extract::{ApiJson, ApiPath};
use crate::common::errors::BusinessError;
use crate::common::models::ApiResponse;
use crate::common::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    let router = OpenApiRouter::new()
        .routes(routes!(list_buildings, add_building))
        .routes(routes!(get_building, update_building, delete_building))
        .with_state(state.clone());

    require_login(router, state, "buildings")
}

#[utoipa::path(
    get,
    path = "/{location_id}/buildings",
    params(("location_id" = Uuid, Path, description = "Location id")),
    responses(
        (status = OK, description = "Buildings of the location", body = ApiResponse<Vec<Building>>),
        (status = NOT_FOUND, description = "No such location")
    ),
    tag = "buildings"
)]
pub async fn list_buildings(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(location_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<Building>>>, BusinessError> {
    let buildings = services::list_buildings(&state.db, location_id).await?;
    Ok(Json(ApiResponse::ok(buildings)))
}

#[utoipa::path(
    post,
    path = "/{location_id}/buildings",
    params(("location_id" = Uuid, Path, description = "Location id")),
    request_body = BuildingInput,
    responses(
        (status = CREATED, description = "Building added", body = ApiResponse<Building>),
        (status = BAD_REQUEST, description = "Missing name or name already used at this location"),
        (status = FORBIDDEN, description = "Caller did not create this location"),
        (status = NOT_FOUND, description = "No such location")
    ),
    tag = "buildings"
)]
pub async fn add_building(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(location_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<BuildingInput>,
) -> Result<(StatusCode, Json<ApiResponse<Building>>), BusinessError> {
    let building = services::add_building(&state.db, &user, location_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            building,
            "Building added successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/{location_id}/buildings/{building_id}",
    params(
        ("location_id" = Uuid, Path, description = "Location id"),
        ("building_id" = Uuid, Path, description = "Building id")
    ),
    responses(
        (status = OK, description = "The building", body = ApiResponse<Building>),
        (status = NOT_FOUND, description = "No such location or building")
    ),
    tag = "buildings"
)]
pub async fn get_building(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((location_id, building_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Building>>, BusinessError> {
    let building = services::get_building(&state.db, location_id, building_id).await?;
    Ok(Json(ApiResponse::ok(building)))
}

#[utoipa::path(
    put,
    path = "/{location_id}/buildings/{building_id}",
    params(
        ("location_id" = Uuid, Path, description = "Location id"),
        ("building_id" = Uuid, Path, description = "Building id")
    ),
    request_body = BuildingInput,
    responses(
        (status = OK, description = "Updated building", body = ApiResponse<Building>),
        (status = BAD_REQUEST, description = "Missing name or name already used at this location"),
        (status = FORBIDDEN, description = "Caller did not create this location"),
        (status = NOT_FOUND, description = "No such location or building")
    ),
    tag = "buildings"
)]
pub async fn update_building(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath((location_id, building_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(input): ApiJson<BuildingInput>,
) -> Result<Json<ApiResponse<Building>>, BusinessError> {
    let building =
        services::update_building(&state.db, &user, location_id, building_id, input).await?;
    Ok(Json(ApiResponse::with_message(
        building,
        "Building updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/{location_id}/buildings/{building_id}",
    params(
        ("location_id" = Uuid, Path, description = "Location id"),
        ("building_id" = Uuid, Path, description = "Building id")
    ),
    responses(
        (status = OK, description = "Removed building", body = ApiResponse<Building>),
        (status = FORBIDDEN, description = "Caller did not create this location"),
        (status = NOT_FOUND, description = "No such location or building")
    ),
    tag = "buildings"
)]
pub async fn delete_building(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath((location_id, building_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Building>>, BusinessError> {
    let building = services::delete_building(&state.db, &user, location_id, building_id).await?;
    Ok(Json(ApiResponse::with_message(
        building,
        "Building deleted successfully",
    )))
}
