use super::models::{Building, BuildingInput};
use crate::common::auth::CurrentUser;
use crate::common::errors::{BusinessResult, DbErrorExt};
use crate::locations::models::Model as LocationModel;
use crate::locations::services::{ensure_can_manage, find_location};
use crate::{duplicate_resource, not_found, validation_error};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel};
use uuid::Uuid;

fn building_name(name: &str) -> BusinessResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(validation_error!("name", "is required"));
    }
    Ok(name.to_string())
}

/// Build a new active building from client input.
pub fn new_building(input: BuildingInput) -> BusinessResult<Building> {
    Ok(Building {
        id: Uuid::new_v4(),
        name: building_name(&input.name)?,
        description: input.description,
        is_active: input.is_active.unwrap_or(true),
        created_at: Utc::now(),
    })
}

async fn save(db: &DatabaseConnection, location: LocationModel) -> BusinessResult<LocationModel> {
    let buildings = location.buildings.clone();
    let mut active = location.into_active_model();
    active.buildings = Set(buildings);
    active.last_updated = Set(Utc::now());
    active
        .update(db)
        .await
        .map_err(|err| err.to_business_error("location"))
}

pub async fn list_buildings(
    db: &DatabaseConnection,
    location_id: Uuid,
) -> BusinessResult<Vec<Building>> {
    Ok(find_location(db, location_id).await?.buildings.0)
}

pub async fn get_building(
    db: &DatabaseConnection,
    location_id: Uuid,
    building_id: Uuid,
) -> BusinessResult<Building> {
    find_location(db, location_id)
        .await?
        .buildings
        .get(building_id)
        .cloned()
        .ok_or_else(|| not_found!("Building", building_id))
}

pub async fn add_building(
    db: &DatabaseConnection,
    user: &CurrentUser,
    location_id: Uuid,
    input: BuildingInput,
) -> BusinessResult<Building> {
    let mut location = find_location(db, location_id).await?;
    ensure_can_manage(user, &location, "add buildings to")?;

    let building = new_building(input)?;
    if location.buildings.name_taken(&building.name, None) {
        return Err(duplicate_resource!("Building", "name"));
    }
    location.buildings.0.push(building.clone());
    save(db, location).await?;

    tracing::info!("Building '{}' added to location {location_id}", building.name);
    Ok(building)
}

pub async fn update_building(
    db: &DatabaseConnection,
    user: &CurrentUser,
    location_id: Uuid,
    building_id: Uuid,
    input: BuildingInput,
) -> BusinessResult<Building> {
    let mut location = find_location(db, location_id).await?;
    ensure_can_manage(user, &location, "update buildings of")?;

    if location.buildings.get(building_id).is_none() {
        return Err(not_found!("Building", building_id));
    }
    let name = building_name(&input.name)?;
    if location.buildings.name_taken(&name, Some(building_id)) {
        return Err(duplicate_resource!("Building", "name"));
    }
    let building = location
        .buildings
        .get_mut(building_id)
        .ok_or_else(|| not_found!("Building", building_id))?;
    building.name = name;
    building.description = input.description;
    if let Some(is_active) = input.is_active {
        building.is_active = is_active;
    }
    let building = building.clone();
    save(db, location).await?;

    Ok(building)
}

pub async fn delete_building(
    db: &DatabaseConnection,
    user: &CurrentUser,
    location_id: Uuid,
    building_id: Uuid,
) -> BusinessResult<Building> {
    let mut location = find_location(db, location_id).await?;
    ensure_can_manage(user, &location, "delete buildings of")?;

    let position = location
        .buildings
        .0
        .iter()
        .position(|building| building.id == building_id)
        .ok_or_else(|| not_found!("Building", building_id))?;
    let building = location.buildings.0.remove(position);
    save(db, location).await?;

    tracing::info!("Building '{}' removed from location {location_id}", building.name);
    Ok(building)
}
