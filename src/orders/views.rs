use super::models::{
    ImageUpload, LocationOrdersParams, LocationWorkOrders, Order, OrderInput, OrderSearchParams,
};
use super::services;
use crate::common::auth::{CurrentUser, require_login};
use crate::common::extract::{ApiJson, ApiPath, ApiQuery};
use crate::common::errors::{BusinessError, BusinessResult};
use crate::common::models::{ApiResponse, Paginated, PaginationParams};
use crate::common::state::AppState;
use crate::validation_error;
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    let router = OpenApiRouter::new()
        .routes(routes!(list_orders, create_order))
        .routes(routes!(search_orders))
        .routes(routes!(orders_for_location))
        .routes(routes!(get_order, update_order, delete_order))
        .with_state(state.clone());

    require_login(router, state, "work orders")
}

/// Split a create request into the JSON `data` part and its `images` parts.
async fn read_order_form(
    mut multipart: Multipart,
) -> BusinessResult<(OrderInput, Vec<ImageUpload>)> {
    let mut input: Option<OrderInput> = None;
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| validation_error!("form", err.body_text()))?
    {
        match field.name().unwrap_or_default() {
            "data" => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| validation_error!("data", err.body_text()))?;
                input = Some(
                    serde_json::from_str(&text)
                        .map_err(|err| validation_error!("data", err))?,
                );
            }
            "images" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| validation_error!("images", err.body_text()))?;
                images.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let input = input.ok_or_else(|| validation_error!("data", "is required"))?;
    Ok((input, images))
}

#[utoipa::path(
    post,
    path = "/",
    request_body(
        content_type = "multipart/form-data",
        description = "`data`: work order JSON, `images`: up to 5 image files"
    ),
    responses(
        (status = CREATED, description = "Work order created", body = ApiResponse<Order>),
        (status = BAD_REQUEST, description = "Invalid order or too many images"),
        (status = BAD_GATEWAY, description = "Photo upload failed")
    ),
    tag = "workorders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Order>>), BusinessError> {
    let (input, images) = read_order_form(multipart).await?;
    let order = services::create_order(&state.db, state.blobs.as_ref(), &user, input, images).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            order.into(),
            "Work order created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    params(PaginationParams),
    responses(
        (status = OK, description = "Work orders visible to the caller, newest first", body = Paginated<Order>)
    ),
    tag = "workorders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
) -> Result<Json<Paginated<Order>>, BusinessError> {
    let (orders, total) = services::list_orders(&state.db, &user, &pagination).await?;
    Ok(Json(Paginated::new(
        orders.into_iter().map(Order::from).collect(),
        &pagination,
        total,
    )))
}

#[utoipa::path(
    get,
    path = "/search",
    params(OrderSearchParams),
    responses(
        (status = OK, description = "Matching work orders", body = ApiResponse<Vec<Order>>)
    ),
    tag = "workorders"
)]
pub async fn search_orders(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<OrderSearchParams>,
) -> Result<Json<ApiResponse<Vec<Order>>>, BusinessError> {
    let orders = services::search_orders(&state.db, &user, &params).await?;
    Ok(Json(ApiResponse::ok(
        orders.into_iter().map(Order::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/location/{location_id}",
    params(
        ("location_id" = Uuid, Path, description = "Location the orders were filed at"),
        LocationOrdersParams
    ),
    responses(
        (status = OK, description = "Work orders at the location with their count", body = LocationWorkOrders)
    ),
    tag = "workorders"
)]
pub async fn orders_for_location(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(location_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<LocationOrdersParams>,
) -> Result<Json<LocationWorkOrders>, BusinessError> {
    let orders =
        services::orders_for_location(&state.db, &user, location_id, params.user_id.as_deref())
            .await?;

    Ok(Json(LocationWorkOrders {
        success: true,
        count: orders.len() as u64,
        data: orders.into_iter().map(Order::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Work order id")),
    responses(
        (status = OK, description = "The work order", body = ApiResponse<Order>),
        (status = FORBIDDEN, description = "Order belongs to another user"),
        (status = NOT_FOUND, description = "No such work order")
    ),
    tag = "workorders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Order>>, BusinessError> {
    let order = services::find_owned_order(&state.db, &user, id, "view").await?;
    Ok(Json(ApiResponse::ok(order.into())))
}

#[utoipa::path(
    put,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Work order id")),
    request_body = OrderInput,
    responses(
        (status = OK, description = "Updated work order", body = ApiResponse<Order>),
        (status = BAD_REQUEST, description = "Invalid order"),
        (status = FORBIDDEN, description = "Order belongs to another user"),
        (status = NOT_FOUND, description = "No such work order")
    ),
    tag = "workorders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<OrderInput>,
) -> Result<Json<ApiResponse<Order>>, BusinessError> {
    let order = services::update_order(&state.db, &user, id, input).await?;
    Ok(Json(ApiResponse::with_message(
        order.into(),
        "Work order updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    params(("id" = Uuid, Path, description = "Work order id")),
    responses(
        (status = OK, description = "Deleted work order", body = ApiResponse<Order>),
        (status = FORBIDDEN, description = "Order belongs to another user"),
        (status = NOT_FOUND, description = "No such work order")
    ),
    tag = "workorders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Order>>, BusinessError> {
    let order = services::delete_order(&state.db, state.blobs.as_ref(), &user, id).await?;
    Ok(Json(ApiResponse::with_message(
        order.into(),
        "Work order deleted successfully",
    )))
}
