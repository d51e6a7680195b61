use super::models::{
    ActiveModel, Column, Entity, LocationCreate, LocationListParams, LocationUpdate, Model,
    TechnicianIds,
};
use crate::buildings::models::Buildings;
use crate::buildings::services::new_building;
use crate::common::auth::CurrentUser;
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::{business_rule_violation, duplicate_resource, forbidden, not_found, validation_error};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseBackend,
    DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

fn require_text(field: &str, value: &str) -> BusinessResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(validation_error!(field, "is required"));
    }
    Ok(value.to_string())
}

fn validate_coordinates(latitude: f64, longitude: f64) -> BusinessResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(validation_error!("latitude", "must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(validation_error!(
            "longitude",
            "must be between -180 and 180"
        ));
    }
    Ok(())
}

/// Rows whose `assigned_technicians` JSON array contains `technician_id`.
pub fn assigned_to(backend: DatabaseBackend, technician_id: &str) -> SimpleExpr {
    match backend {
        DatabaseBackend::Postgres => Expr::cust_with_values(
            "assigned_technicians @> CAST(? AS jsonb)",
            [serde_json::json!([technician_id]).to_string()],
        ),
        _ => Expr::cust_with_values(
            "EXISTS (SELECT 1 FROM json_each(assigned_technicians) WHERE json_each.value = ?)",
            [technician_id.to_string()],
        ),
    }
}

pub async fn find_location<C: ConnectionTrait>(db: &C, id: Uuid) -> BusinessResult<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|err| err.to_business_error("location"))?
        .ok_or_else(|| not_found!("Location", id))
}

/// Only the admin who created a location, or any admin, may change it.
pub fn ensure_can_manage(user: &CurrentUser, location: &Model, action: &str) -> BusinessResult<()> {
    if user.can_manage(&location.created_by) {
        Ok(())
    } else {
        Err(forbidden!(action, "this location"))
    }
}

pub async fn create_location(
    db: &DatabaseConnection,
    user: &CurrentUser,
    input: LocationCreate,
) -> BusinessResult<Model> {
    if !user.is_admin {
        return Err(forbidden!("create", "locations"));
    }
    let name = require_text("name", &input.name)?;
    let address = require_text("address", &input.address)?;
    validate_coordinates(input.latitude, input.longitude)?;

    let mut buildings = Buildings::default();
    for building in input.buildings {
        let building = new_building(building)?;
        if buildings.name_taken(&building.name, None) {
            return Err(duplicate_resource!("Building", "name"));
        }
        buildings.0.push(building);
    }

    let now = Utc::now();
    let location = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        address: Set(address),
        latitude: Set(input.latitude),
        longitude: Set(input.longitude),
        description: Set(input.description),
        buildings: Set(buildings),
        assigned_technicians: Set(TechnicianIds::default()),
        is_active: Set(true),
        created_by: Set(user.id.clone()),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(db)
    .await
    .map_err(|err| err.to_business_error("location"))?;

    tracing::info!("Location {} created by {}", location.id, user.id);
    Ok(location)
}

pub async fn list_locations(
    db: &DatabaseConnection,
    params: &LocationListParams,
) -> BusinessResult<(Vec<Model>, u64)> {
    let mut condition = Condition::all();
    if let Some(active) = params.active {
        condition = condition.add(Column::IsActive.eq(active));
    }
    let pagination = params.pagination();

    let query = Entity::find().filter(condition);
    let total = query
        .clone()
        .count(db)
        .await
        .map_err(|err| err.to_business_error("location"))?;
    let locations = query
        .order_by_desc(Column::CreatedAt)
        .offset(pagination.offset())
        .limit(pagination.limit())
        .all(db)
        .await
        .map_err(|err| err.to_business_error("location"))?;
    Ok((locations, total))
}

/// Locations the caller currently works at, per this service's own records.
pub async fn locations_of(db: &DatabaseConnection, technician_id: &str) -> BusinessResult<Vec<Model>> {
    Entity::find()
        .filter(assigned_to(db.get_database_backend(), technician_id))
        .order_by_asc(Column::Name)
        .all(db)
        .await
        .map_err(|err| err.to_business_error("location"))
}

pub async fn update_location(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
    input: LocationUpdate,
) -> BusinessResult<Model> {
    let location = find_location(db, id).await?;
    ensure_can_manage(user, &location, "update")?;
    let name = require_text("name", &input.name)?;
    let address = require_text("address", &input.address)?;
    validate_coordinates(input.latitude, input.longitude)?;

    let is_active = input.is_active.unwrap_or(location.is_active);
    let mut active = location.into_active_model();
    active.name = Set(name);
    active.address = Set(address);
    active.latitude = Set(input.latitude);
    active.longitude = Set(input.longitude);
    active.description = Set(input.description);
    active.is_active = Set(is_active);
    active.last_updated = Set(Utc::now());

    active
        .update(db)
        .await
        .map_err(|err| err.to_business_error("location"))
}

/// Delete a location nobody is assigned to. Archived assignments are kept.
pub async fn delete_location(
    db: &DatabaseConnection,
    user: &CurrentUser,
    id: Uuid,
) -> BusinessResult<Model> {
    let location = find_location(db, id).await?;
    ensure_can_manage(user, &location, "delete")?;
    if !location.assigned_technicians.0.is_empty() {
        return Err(business_rule_violation!(
            "location_in_use",
            "Unassign all technicians before deleting this location"
        ));
    }

    Entity::delete_by_id(location.id)
        .exec(db)
        .await
        .map_err(|err| err.to_business_error("location"))?;

    tracing::info!("Location {} deleted by {}", location.id, user.id);
    Ok(location)
}
