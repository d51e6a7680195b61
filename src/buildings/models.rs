use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A building embedded in a location. It has no table of its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// The buildings of one location, stored as a JSON column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Buildings(pub Vec<Building>);

impl Buildings {
    pub fn get(&self, id: Uuid) -> Option<&Building> {
        self.0.iter().find(|building| building.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Building> {
        self.0.iter_mut().find(|building| building.id == id)
    }

    /// Whether another building already uses `name`, ignoring case.
    pub fn name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        let name = name.trim().to_lowercase();
        self.0
            .iter()
            .filter(|building| Some(building.id) != except)
            .any(|building| building.name.trim().to_lowercase() == name)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildingInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to active on create, unchanged on update
    #[serde(default)]
    pub is_active: Option<bool>,
}
