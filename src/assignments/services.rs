//! Technician assignment workflow.
//!
//! Location rows are this service's source of truth. The auth service keeps a
//! mirror (`assignedLocations` on each user) that is updated after the local
//! write and is allowed to lag behind when it is unreachable.

use super::models::{ActiveModel, Column, Entity, LocationSnapshot, Model};
use crate::common::auth::CurrentUser;
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::common::models::PaginationParams;
use crate::common::state::AppState;
use crate::locations::models::{
    Column as LocationColumn, Entity as Location, Model as LocationModel, TechnicianIds,
};
use crate::locations::services::{assigned_to, find_location};
use crate::{business_rule_violation, forbidden, validation_error};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

/// Trim ids, reject blanks and drop repeats while keeping the given order.
pub fn normalize_ids(ids: Vec<String>) -> BusinessResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if id.is_empty() {
            return Err(validation_error!(
                "technicianIds",
                "must not contain empty ids"
            ));
        }
        if !normalized.iter().any(|seen| seen == id) {
            normalized.push(id.to_string());
        }
    }
    Ok(normalized)
}

/// Render milliseconds as "2 days, 3 hours, 5 minutes", skipping zero parts.
pub fn format_duration(millis: i64) -> String {
    let total_minutes = millis.max(0) / 60_000;
    let parts: Vec<String> = [
        (total_minutes / (24 * 60), "day"),
        ((total_minutes / 60) % 24, "hour"),
        (total_minutes % 60, "minute"),
    ]
    .into_iter()
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit)| {
        if value == 1 {
            format!("{value} {unit}")
        } else {
            format!("{value} {unit}s")
        }
    })
    .collect();

    if parts.is_empty() {
        "0 minutes".to_string()
    } else {
        parts.join(", ")
    }
}

/// Entry point for both call shapes of `assign-technicians`.
///
/// Admins always replace the full membership list. Anyone else may only send
/// an empty list, which detaches themselves from the location.
pub async fn assign_technicians(
    state: &AppState,
    user: &CurrentUser,
    location_id: Uuid,
    technician_ids: Vec<String>,
) -> BusinessResult<LocationModel> {
    let technician_ids = normalize_ids(technician_ids)?;
    let location = find_location(&state.db, location_id).await?;

    if user.is_admin {
        bulk_assign(state, user, location, technician_ids).await
    } else if technician_ids.is_empty() {
        self_detach(state, user, location).await
    } else {
        Err(forbidden!("assign technicians to", "locations"))
    }
}

/// First technician in `candidates` already listed on another location.
async fn local_conflict(
    db: &DatabaseConnection,
    location_id: Uuid,
    candidates: &[String],
) -> BusinessResult<Option<(String, LocationModel)>> {
    let backend = db.get_database_backend();
    let listed_anywhere = candidates
        .iter()
        .fold(Condition::any(), |condition, id| {
            condition.add(assigned_to(backend, id))
        });

    let others = Location::find()
        .filter(LocationColumn::Id.ne(location_id))
        .filter(listed_anywhere)
        .all(db)
        .await
        .map_err(|err| err.to_business_error("location"))?;

    Ok(candidates.iter().find_map(|id| {
        others
            .iter()
            .find(|other| other.assigned_technicians.contains(id))
            .map(|other| (id.clone(), other.clone()))
    }))
}

async fn bulk_assign(
    state: &AppState,
    user: &CurrentUser,
    location: LocationModel,
    technician_ids: Vec<String>,
) -> BusinessResult<LocationModel> {
    let location_id = location.id;
    let bearer = user.bearer.as_deref();

    let added: Vec<String> = technician_ids
        .iter()
        .filter(|id| !location.assigned_technicians.contains(id))
        .cloned()
        .collect();
    let removed: Vec<String> = location
        .assigned_technicians
        .0
        .iter()
        .filter(|id| !technician_ids.contains(id))
        .cloned()
        .collect();

    // Only additions require an active location
    if !added.is_empty() {
        if !location.is_active {
            return Err(validation_error!(
                "locationId",
                "cannot assign technicians to an inactive location"
            ));
        }
        if let Some((technician_id, other)) =
            local_conflict(&state.db, location_id, &added).await?
        {
            return Err(business_rule_violation!(
                "single_location_assignment",
                format!(
                    "Technician {technician_id} is already assigned to location '{}'",
                    other.name
                )
            ));
        }

        let validation = state
            .auth_service
            .validate_technician_assignments(location_id, &added, bearer)
            .await?;
        let location_key = location_id.to_string();
        if let Some(conflict) = validation
            .conflicts
            .iter()
            .find(|conflict| conflict.location_id != location_key)
        {
            let who = conflict
                .technician_name
                .as_deref()
                .unwrap_or(&conflict.technician_id);
            return Err(business_rule_violation!(
                "single_location_assignment",
                format!(
                    "Technician {who} is already assigned to location {}",
                    conflict.location_id
                )
            ));
        }
        if !validation.valid && validation.conflicts.is_empty() {
            return Err(business_rule_violation!(
                "single_location_assignment",
                "The auth service rejected the technician assignment"
            ));
        }
    }

    let mut active = location.into_active_model();
    active.assigned_technicians = Set(TechnicianIds(technician_ids));
    active.last_updated = Set(Utc::now());
    let updated = active
        .update(&state.db)
        .await
        .map_err(|err| err.to_business_error("location"))?;
    tracing::info!(
        "Location {location_id} technicians updated by {}: {} added, {} removed",
        user.id,
        added.len(),
        removed.len()
    );

    if !added.is_empty() || !removed.is_empty() {
        if let Err(err) = state
            .auth_service
            .update_location_assignments(location_id, &added, &removed, bearer)
            .await
        {
            tracing::warn!("Location {location_id} saved but auth service sync failed: {err}");
        }
    }

    Ok(updated)
}

async fn self_detach(
    state: &AppState,
    user: &CurrentUser,
    location: LocationModel,
) -> BusinessResult<LocationModel> {
    let location_id = location.id;
    if !location.assigned_technicians.contains(&user.id) {
        return Err(business_rule_violation!(
            "not_assigned",
            "You are not assigned to this location"
        ));
    }
    let bearer = user.bearer.as_deref();
    let closed_date = Utc::now();

    let assigned_date: DateTime<Utc> =
        match state.auth_service.get_user(&user.id, bearer).await {
            Ok(auth_user) => auth_user.assigned_since(location_id).unwrap_or_else(|| {
                tracing::warn!(
                    "No assignment date for {} at location {location_id}, using now",
                    user.id
                );
                closed_date
            }),
            Err(err) => {
                tracing::warn!("Could not look up assignment date for {}: {err}", user.id);
                closed_date
            }
        }
        .min(closed_date);

    let total_work_orders = match state
        .inventory_service
        .count_work_orders(location_id, &user.id, bearer)
        .await
    {
        Ok(count) => i64::try_from(count).unwrap_or(i64::MAX),
        Err(err) => {
            tracing::warn!("Could not count work orders for {}: {err}", user.id);
            0
        }
    };

    let remaining: Vec<String> = location
        .assigned_technicians
        .0
        .iter()
        .filter(|id| **id != user.id)
        .cloned()
        .collect();

    let txn = state
        .db
        .begin()
        .await
        .map_err(|err| err.to_business_error("location"))?;

    ActiveModel {
        id: Set(Uuid::new_v4()),
        technician_id: Set(user.id.clone()),
        location_id: Set(location_id),
        location_snapshot: Set(LocationSnapshot::from(&location)),
        assigned_date: Set(assigned_date),
        closed_date: Set(closed_date),
        work_duration: Set((closed_date - assigned_date).num_milliseconds()),
        total_work_orders: Set(total_work_orders),
        created_at: Set(closed_date),
    }
    .insert(&txn)
    .await
    .map_err(|err| err.to_business_error("previous_location_assignment"))?;

    let mut active = location.into_active_model();
    active.assigned_technicians = Set(TechnicianIds(remaining));
    active.last_updated = Set(Utc::now());
    let updated = active
        .update(&txn)
        .await
        .map_err(|err| err.to_business_error("location"))?;

    txn.commit()
        .await
        .map_err(|err| err.to_business_error("location"))?;
    tracing::info!("Technician {} detached from location {location_id}", user.id);

    if let Err(err) = state
        .auth_service
        .remove_location(&user.id, location_id, bearer)
        .await
    {
        tracing::warn!(
            "Technician {} detached locally but auth service update failed: {err}",
            user.id
        );
    }

    Ok(updated)
}

/// The caller's archived assignments, most recently closed first.
pub async fn previous_assignments(
    db: &DatabaseConnection,
    technician_id: &str,
    pagination: &PaginationParams,
) -> BusinessResult<(Vec<Model>, u64)> {
    let query = Entity::find().filter(Column::TechnicianId.eq(technician_id));
    let total = query
        .clone()
        .count(db)
        .await
        .map_err(|err| err.to_business_error("previous_location_assignment"))?;
    let assignments = query
        .order_by_desc(Column::ClosedDate)
        .offset(pagination.offset())
        .limit(pagination.limit())
        .all(db)
        .await
        .map_err(|err| err.to_business_error("previous_location_assignment"))?;
    Ok((assignments, total))
}
