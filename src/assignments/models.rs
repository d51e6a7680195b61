use crate::locations::models::Model as LocationModel;
use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The location as it looked when the technician left it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationSnapshot {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
}

impl From<&LocationModel> for LocationSnapshot {
    fn from(location: &LocationModel) -> Self {
        Self {
            name: location.name.clone(),
            address: location.address.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            description: location.description.clone(),
        }
    }
}

/// Archive of a finished technician assignment. Rows are only ever inserted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "previous_location_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub technician_id: String,
    pub location_id: Uuid,
    #[sea_orm(column_type = "JsonBinary")]
    pub location_snapshot: LocationSnapshot,
    pub assigned_date: DateTime<Utc>,
    pub closed_date: DateTime<Utc>,
    /// Milliseconds between `assigned_date` and `closed_date`
    pub work_duration: i64,
    pub total_work_orders: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviousAssignment {
    pub id: Uuid,
    pub technician_id: String,
    pub location_id: Uuid,
    pub location_snapshot: LocationSnapshot,
    pub assigned_date: DateTime<Utc>,
    pub closed_date: DateTime<Utc>,
    pub work_duration: i64,
    pub total_work_orders: i64,
    pub created_at: DateTime<Utc>,
    /// `work_duration` for humans, e.g. "2 days, 3 hours"
    pub duration: String,
}

impl From<Model> for PreviousAssignment {
    fn from(model: Model) -> Self {
        Self {
            duration: super::services::format_duration(model.work_duration),
            id: model.id,
            technician_id: model.technician_id,
            location_id: model.location_id,
            location_snapshot: model.location_snapshot,
            assigned_date: model.assigned_date,
            closed_date: model.closed_date,
            work_duration: model.work_duration,
            total_work_orders: model.total_work_orders,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTechnicians {
    /// Full desired membership (admins), or empty to leave the location (technicians)
    #[serde(default)]
    pub technician_ids: Vec<String>,
}
