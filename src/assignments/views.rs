use super::models::{AssignTechnicians, PreviousAssignment};
use super::services;
use crate::common::auth::{CurrentUser, require_login};
use crate::common::extract::{ApiJson, ApiPath, ApiQuery};
use crate::common::errors::BusinessError;
use crate::common::models::{ApiResponse, Paginated, PaginationParams};
use crate::common::state::AppState;
use crate::locations::models::Location;
use axum::{
    Json,
    extract::State,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    let router = OpenApiRouter::new()
        .routes(routes!(assign_technicians))
        .routes(routes!(my_previous_assignments))
        .with_state(state.clone());

    require_login(router, state, "technician assignments")
}

#[utoipa::path(
    post,
    path = "/{location_id}/assign-technicians",
    params(("location_id" = Uuid, Path, description = "Location id")),
    request_body = AssignTechnicians,
    responses(
        (status = OK, description = "Updated location", body = ApiResponse<Location>),
        (status = BAD_REQUEST, description = "Conflicting assignment, inactive location or caller not assigned"),
        (status = FORBIDDEN, description = "Technicians may only detach themselves"),
        (status = NOT_FOUND, description = "No such location"),
        (status = BAD_GATEWAY, description = "Auth service could not validate the assignment")
    ),
    tag = "assignments",
    summary = "Assign technicians or leave a location",
    description = "Admins send the complete list of technicians for the location. \
        A technician sends an empty list to detach themselves, which archives the assignment."
)]
pub async fn assign_technicians(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(location_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AssignTechnicians>,
) -> Result<Json<ApiResponse<Location>>, BusinessError> {
    let location =
        services::assign_technicians(&state, &user, location_id, input.technician_ids).await?;
    Ok(Json(ApiResponse::with_message(
        location.into(),
        "Technician assignments updated",
    )))
}

#[utoipa::path(
    get,
    path = "/previous/me",
    params(PaginationParams),
    responses(
        (status = OK, description = "The caller's finished assignments, most recent first", body = Paginated<PreviousAssignment>)
    ),
    tag = "assignments"
)]
pub async fn my_previous_assignments(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
) -> Result<Json<Paginated<PreviousAssignment>>, BusinessError> {
    let (assignments, total) =
        services::previous_assignments(&state.db, &user.id, &pagination).await?;
    Ok(Json(Paginated::new(
        assignments.into_iter().map(PreviousAssignment::from).collect(),
        &pagination,
        total,
    )))
}
