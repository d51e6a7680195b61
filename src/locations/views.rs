use super::models::{Location, LocationCreate, LocationListParams, LocationUpdate};
use super::services;
use crate::common::auth::{CurrentUser, require_login};
use crate::common::extract::{ApiJson, ApiPath, ApiQuery};
use crate::common::errors::BusinessError;
use crate::common::models::{ApiResponse, Paginated};
use crate::common::state::AppState;
use crate::{assignments, buildings};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    let router = OpenApiRouter::new()
        .routes(routes!(list_locations, create_location))
        .routes(routes!(my_locations))
        .routes(routes!(get_location, update_location, delete_location))
        .with_state(state.clone());

    require_login(router, state, "locations")
        .merge(buildings::views::router(state))
        .merge(assignments::views::router(state))
}

#[utoipa::path(
    post,
    path = "/",
    request_body = LocationCreate,
    responses(
        (status = CREATED, description = "Location created", body = ApiResponse<Location>),
        (status = BAD_REQUEST, description = "Invalid location or duplicate building names"),
        (status = FORBIDDEN, description = "Only admins create locations")
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<LocationCreate>,
) -> Result<(StatusCode, Json<ApiResponse<Location>>), BusinessError> {
    let location = services::create_location(&state.db, &user, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            location.into(),
            "Location created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    params(LocationListParams),
    responses(
        (status = OK, description = "Locations, newest first", body = Paginated<Location>)
    ),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiQuery(params): ApiQuery<LocationListParams>,
) -> Result<Json<Paginated<Location>>, BusinessError> {
    let (locations, total) = services::list_locations(&state.db, &params).await?;
    Ok(Json(Paginated::new(
        locations.into_iter().map(Location::from).collect(),
        &params.pagination(),
        total,
    )))
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = OK, description = "Locations the caller is assigned to", body = ApiResponse<Vec<Location>>)
    ),
    tag = "locations"
)]
pub async fn my_locations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Location>>>, BusinessError> {
    let locations = services::locations_of(&state.db, &user.id).await?;
    Ok(Json(ApiResponse::ok(
        locations.into_iter().map(Location::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/{location_id}",
    params(("location_id" = Uuid, Path, description = "Location id")),
    responses(
        (status = OK, description = "The location", body = ApiResponse<Location>),
        (status = NOT_FOUND, description = "No such location")
    ),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(location_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Location>>, BusinessError> {
    let location = services::find_location(&state.db, location_id).await?;
    Ok(Json(ApiResponse::ok(location.into())))
}

#[utoipa::path(
    put,
    path = "/{location_id}",
    params(("location_id" = Uuid, Path, description = "Location id")),
    request_body = LocationUpdate,
    responses(
        (status = OK, description = "Updated location", body = ApiResponse<Location>),
        (status = BAD_REQUEST, description = "Invalid location"),
        (status = FORBIDDEN, description = "Caller did not create this location"),
        (status = NOT_FOUND, description = "No such location")
    ),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(location_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<LocationUpdate>,
) -> Result<Json<ApiResponse<Location>>, BusinessError> {
    let location = services::update_location(&state.db, &user, location_id, input).await?;
    Ok(Json(ApiResponse::with_message(
        location.into(),
        "Location updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/{location_id}",
    params(("location_id" = Uuid, Path, description = "Location id")),
    responses(
        (status = OK, description = "Deleted location", body = ApiResponse<Location>),
        (status = BAD_REQUEST, description = "Technicians are still assigned"),
        (status = FORBIDDEN, description = "Caller did not create this location"),
        (status = NOT_FOUND, description = "No such location")
    ),
    tag = "locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(location_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Location>>, BusinessError> {
    let location = services::delete_location(&state.db, &user, location_id).await?;
    Ok(Json(ApiResponse::with_message(
        location.into(),
        "Location deleted successfully",
    )))
}
