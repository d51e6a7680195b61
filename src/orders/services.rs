use super::models::{
    ActiveModel, Column, Entity, ImageUpload, MAX_PICTURES, Model, OrderInput, OrderSearchParams,
    Pictures,
};
use crate::common::auth::CurrentUser;
use crate::common::errors::{BusinessError, BusinessResult, DbErrorExt};
use crate::common::models::PaginationParams;
use crate::counters::services::allocate_next_id;
use crate::external::s3::BlobStore;
use crate::{forbidden, not_found, validation_error};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use futures::future::join_all;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

fn validate_input(input: &OrderInput) -> BusinessResult<()> {
    if input.confined_space_name_or_id.trim().is_empty() {
        return Err(validation_error!(
            "confinedSpaceNameOrId",
            "is required"
        ));
    }
    if input.building.trim().is_empty() {
        return Err(validation_error!("building", "is required"));
    }
    if input.number_of_entry_points.is_some_and(|points| points < 0) {
        return Err(validation_error!(
            "numberOfEntryPoints",
            "must not be negative"
        ));
    }
    Ok(())
}

fn validate_images(images: &[ImageUpload]) -> BusinessResult<()> {
    if images.len() > MAX_PICTURES {
        return Err(validation_error!(
            "images",
            format!("at most {MAX_PICTURES} images may be attached")
        ));
    }
    if let Some(image) = images
        .iter()
        .find(|image| !image.content_type.starts_with("image/"))
    {
        return Err(validation_error!(
            "images",
            format!("'{}' is not an image", image.file_name)
        ));
    }
    Ok(())
}

/// Resolve who owns a new order. Technicians always file for themselves.
fn resolve_owner(user: &CurrentUser, requested: Option<&str>) -> BusinessResult<String> {
    match requested.map(str::trim).filter(|id| !id.is_empty()) {
        Some(owner) if owner != user.id && !user.is_admin => {
            Err(forbidden!("create", "work orders for other users"))
        }
        Some(owner) => Ok(owner.to_string()),
        None => Ok(user.id.clone()),
    }
}

fn blob_key(unique_id: &str, index: usize, file_name: &str) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("orders/{unique_id}/{index}-{safe_name}")
}

async fn delete_blobs(blobs: &dyn BlobStore, urls: &[String]) {
    let results = join_all(urls.iter().map(|url| blobs.delete(url))).await;
    for (url, result) in urls.iter().zip(results) {
        if let Err(err) = result {
            tracing::warn!("Failed to delete work order photo {url}: {err}");
        }
    }
}

async fn upload_images(
    blobs: &dyn BlobStore,
    unique_id: &str,
    images: Vec<ImageUpload>,
) -> BusinessResult<Vec<String>> {
    let mut urls = Vec::with_capacity(images.len());
    for (index, image) in images.into_iter().enumerate() {
        let key = blob_key(unique_id, index, &image.file_name);
        match blobs.put(&key, image.bytes, &image.content_type).await {
            Ok(url) => urls.push(url),
            Err(err) => {
                delete_blobs(blobs, &urls).await;
                return Err(BusinessError::ExternalServiceError {
                    service: "blob storage".to_string(),
                    message: err,
                });
            }
        }
    }
    Ok(urls)
}

/// Create a work order.
///
/// Input is validated before the id is allocated. Once allocated, the id is
/// consumed: a failing upload or insert leaves a gap in the sequence.
pub async fn create_order(
    db: &DatabaseConnection,
    blobs: &dyn BlobStore,
    user: &CurrentUser,
    input: OrderInput,
    images: Vec<ImageUpload>,
) -> BusinessResult<Model> {
    validate_input(&input)?;
    validate_images(&images)?;
    let owner = resolve_owner(user, input.user_id.as_deref())?;

    let unique_id = allocate_next_id(db).await.map_err(|err| {
        tracing::error!("Work order id allocation failed: {err}");
        BusinessError::InternalError {
            message: format!("Failed to allocate work order id: {err}"),
        }
    })?;

    let pictures = upload_images(blobs, &unique_id, images).await?;

    let now = Utc::now();
    let mut active = ActiveModel {
        id: Set(Uuid::new_v4()),
        unique_id: Set(unique_id.clone()),
        user_id: Set(owner),
        pictures: Set(Pictures(pictures.clone())),
        created_at: Set(now),
        ..Default::default()
    };
    input.apply_to(&mut active);

    match active.insert(db).await {
        Ok(order) => {
            tracing::info!(
                "Created work order {} for user {}",
                order.unique_id,
                order.user_id
            );
            Ok(order)
        }
        Err(err) => {
            tracing::warn!("Work order {unique_id} was not saved, its id stays consumed: {err}");
            delete_blobs(blobs, &pictures).await;
            Err(err.to_business_error("work_order"))
        }
    }
}

/// Technicians only ever see their own orders.
fn visible_to(user: &CurrentUser) -> Condition {
    if user.is_admin {
        Condition::all()
    } else {
        Condition::all().add(Column::UserId.eq(user.id.clone()))
    }
}

pub async fn list_orders(
    db: &DatabaseConnection,
    user: &CurrentUser,
    pagination: &PaginationParams,
) -> BusinessResult<(Vec<Model>, u64)> {
    let query = Entity::find().filter(visible_to(user));
    let total = query
        .clone()
        .count(db)
        .await
        .map_err(|err| err.to_business_error("work_order"))?;
    let orders = query
        .order_by_desc(Column::CreatedAt)
        .offset(pagination.offset())
        .limit(pagination.limit())
        .all(db)
        .await
        .map_err(|err| err.to_business_error("work_order"))?;
    Ok((orders, total))
}

pub async fn find_order(db: &DatabaseConnection, id: Uuid) -> BusinessResult<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|err| err.to_business_error("work_order"))?
        .ok_or_else(|| not_found!("Work order", id))
}

/// Fetch an order the caller is allowed to see or change.
pub async fn find_owned_order(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    action: &str,
) -> BusinessResult<Model> {
    let order = find_order(db, id).await?;
    if !user.can_manage(&order.user_id) {
        return Err(forbidden!(action, "this work order"));
    }
    Ok(order)
}

/// Full-document update of the survey content. `unique_id`, the owner and
/// the pictures never change.
pub async fn update_order(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    input: OrderInput,
) -> BusinessResult<Model> {
    validate_input(&input)?;
    let order = find_owned_order(db, user, id, "update").await?;

    let mut active = order.into_active_model();
    input.apply_to(&mut active);
    active
        .update(db)
        .await
        .map_err(|err| err.to_business_error("work_order"))
}

/// Delete an order, then its photos. Photo clean-up is best effort.
pub async fn delete_order(
    db: &DatabaseConnection,
    blobs: &dyn BlobStore,
    user: &CurrentUser,
    id: Uuid,
) -> BusinessResult<Model> {
    let order = find_owned_order(db, user, id, "delete").await?;

    Entity::delete_by_id(order.id)
        .exec(db)
        .await
        .map_err(|err| err.to_business_error("work_order"))?;
    delete_blobs(blobs, &order.pictures.0).await;

    tracing::info!("Deleted work order {}", order.unique_id);
    Ok(order)
}

/// `LOWER(column) LIKE '%needle%'` with LIKE wildcards in the needle escaped.
fn contains_ignore_case(column: Column, needle: &str) -> SimpleExpr {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
}

fn same_day(date: NaiveDate) -> Condition {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1);
    Condition::all()
        .add(Column::DateOfSurvey.gte(start))
        .add(Column::DateOfSurvey.lt(end))
}

pub async fn search_orders(
    db: &DatabaseConnection,
    user: &CurrentUser,
    params: &OrderSearchParams,
) -> BusinessResult<Vec<Model>> {
    let mut condition = visible_to(user);

    if let Some(id) = params.id {
        condition = condition.add(Column::Id.eq(id));
    }
    let text_filters = [
        (Column::UniqueId, params.unique_id.as_deref()),
        (
            Column::ConfinedSpaceNameOrId,
            params.confined_space_name_or_id.as_deref(),
        ),
        (Column::Building, params.building.as_deref()),
    ];
    for (column, value) in text_filters {
        if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
            condition = condition.add(contains_ignore_case(column, value));
        }
    }
    if let Some(date) = params.date_of_survey {
        condition = condition.add(same_day(date));
    }

    Entity::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await
        .map_err(|err| err.to_business_error("work_order"))
}

/// Orders filed at a location, optionally only those of one user.
/// Technicians are always narrowed to their own orders.
pub async fn orders_for_location(
    db: &DatabaseConnection,
    user: &CurrentUser,
    location_id: Uuid,
    user_id: Option<&str>,
) -> BusinessResult<Vec<Model>> {
    let mut condition = visible_to(user).add(Column::LocationId.eq(location_id));
    if let Some(user_id) = user_id {
        condition = condition.add(Column::UserId.eq(user_id));
    }

    Entity::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await
        .map_err(|err| err.to_business_error("work_order"))
}
