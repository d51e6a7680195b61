use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Most photos a single work order may carry.
pub const MAX_PICTURES: usize = 5;

/// Blob URLs of the photos attached to an order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Pictures(pub Vec<String>);

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub unique_id: String,
    pub user_id: String,
    pub location_id: Option<Uuid>,
    pub date_of_survey: DateTime<Utc>,
    #[sea_orm(column_type = "Text", nullable)]
    pub surveyors: Option<String>,
    pub confined_space_name_or_id: String,
    pub building: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub location_description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub confined_space_description: Option<String>,
    pub number_of_entry_points: Option<i32>,
    pub confined_space: bool,
    pub permit_required: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub entry_requirements: Option<String>,
    pub atmospheric_hazard: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub atmospheric_hazard_description: Option<String>,
    pub engulfment_hazard: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub engulfment_hazard_description: Option<String>,
    pub configuration_hazard: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub configuration_hazard_description: Option<String>,
    pub other_recognized_hazards: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub other_hazards_description: Option<String>,
    pub ppe_required: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub ppe_list: Option<String>,
    pub forced_air_ventilation_sufficient: bool,
    pub dedicated_continuous_air_monitor: bool,
    pub warning_sign_posted: bool,
    pub other_people_working_near_space: bool,
    pub can_others_see_into_space: bool,
    pub contractors_enter_space: bool,
    pub is_entry_point_accessible: bool,
    pub requires_signage_update: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub pictures: Pictures,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Accepts either a full RFC 3339 timestamp or a plain `YYYY-MM-DD` date
/// (taken as midnight UTC), which is what survey forms submit.
fn deserialize_survey_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| serde::de::Error::custom(format!("invalid dateOfSurvey '{raw}'")))
}

/// Survey content of a work order, used for both create and full update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    /// Owner of the order. Only admins may file an order for someone else.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    #[serde(deserialize_with = "deserialize_survey_date")]
    pub date_of_survey: DateTime<Utc>,
    #[serde(default)]
    pub surveyors: Option<String>,
    pub confined_space_name_or_id: String,
    pub building: String,
    #[serde(default)]
    pub location_description: Option<String>,
    #[serde(default)]
    pub confined_space_description: Option<String>,
    #[serde(default)]
    pub number_of_entry_points: Option<i32>,
    #[serde(default)]
    pub confined_space: bool,
    #[serde(default)]
    pub permit_required: bool,
    #[serde(default)]
    pub entry_requirements: Option<String>,
    #[serde(default)]
    pub atmospheric_hazard: bool,
    #[serde(default)]
    pub atmospheric_hazard_description: Option<String>,
    #[serde(default)]
    pub engulfment_hazard: bool,
    #[serde(default)]
    pub engulfment_hazard_description: Option<String>,
    #[serde(default)]
    pub configuration_hazard: bool,
    #[serde(default)]
    pub configuration_hazard_description: Option<String>,
    #[serde(default)]
    pub other_recognized_hazards: bool,
    #[serde(default)]
    pub other_hazards_description: Option<String>,
    #[serde(default)]
    pub ppe_required: bool,
    #[serde(default)]
    pub ppe_list: Option<String>,
    #[serde(default)]
    pub forced_air_ventilation_sufficient: bool,
    #[serde(default)]
    pub dedicated_continuous_air_monitor: bool,
    #[serde(default)]
    pub warning_sign_posted: bool,
    #[serde(default)]
    pub other_people_working_near_space: bool,
    #[serde(default)]
    pub can_others_see_into_space: bool,
    #[serde(default)]
    pub contractors_enter_space: bool,
    #[serde(default)]
    pub is_entry_point_accessible: bool,
    #[serde(default)]
    pub requires_signage_update: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderInput {
    /// Copy the survey content onto an active model. Identity fields
    /// (`id`, `unique_id`, `user_id`, `pictures`) are left alone.
    pub fn apply_to(self, active: &mut ActiveModel) {
        active.location_id = Set(self.location_id);
        active.date_of_survey = Set(self.date_of_survey);
        active.surveyors = Set(self.surveyors);
        active.confined_space_name_or_id = Set(self.confined_space_name_or_id.trim().to_string());
        active.building = Set(self.building.trim().to_string());
        active.location_description = Set(self.location_description);
        active.confined_space_description = Set(self.confined_space_description);
        active.number_of_entry_points = Set(self.number_of_entry_points);
        active.confined_space = Set(self.confined_space);
        active.permit_required = Set(self.permit_required);
        active.entry_requirements = Set(self.entry_requirements);
        active.atmospheric_hazard = Set(self.atmospheric_hazard);
        active.atmospheric_hazard_description = Set(self.atmospheric_hazard_description);
        active.engulfment_hazard = Set(self.engulfment_hazard);
        active.engulfment_hazard_description = Set(self.engulfment_hazard_description);
        active.configuration_hazard = Set(self.configuration_hazard);
        active.configuration_hazard_description = Set(self.configuration_hazard_description);
        active.other_recognized_hazards = Set(self.other_recognized_hazards);
        active.other_hazards_description = Set(self.other_hazards_description);
        active.ppe_required = Set(self.ppe_required);
        active.ppe_list = Set(self.ppe_list);
        active.forced_air_ventilation_sufficient = Set(self.forced_air_ventilation_sufficient);
        active.dedicated_continuous_air_monitor = Set(self.dedicated_continuous_air_monitor);
        active.warning_sign_posted = Set(self.warning_sign_posted);
        active.other_people_working_near_space = Set(self.other_people_working_near_space);
        active.can_others_see_into_space = Set(self.can_others_see_into_space);
        active.contractors_enter_space = Set(self.contractors_enter_space);
        active.is_entry_point_accessible = Set(self.is_entry_point_accessible);
        active.requires_signage_update = Set(self.requires_signage_update);
        active.notes = Set(self.notes);
        active.last_updated = Set(Utc::now());
    }
}

/// Work order as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub unique_id: String,
    pub user_id: String,
    pub location_id: Option<Uuid>,
    pub date_of_survey: DateTime<Utc>,
    pub surveyors: Option<String>,
    pub confined_space_name_or_id: String,
    pub building: String,
    pub location_description: Option<String>,
    pub confined_space_description: Option<String>,
    pub number_of_entry_points: Option<i32>,
    pub confined_space: bool,
    pub permit_required: bool,
    pub entry_requirements: Option<String>,
    pub atmospheric_hazard: bool,
    pub atmospheric_hazard_description: Option<String>,
    pub engulfment_hazard: bool,
    pub engulfment_hazard_description: Option<String>,
    pub configuration_hazard: bool,
    pub configuration_hazard_description: Option<String>,
    pub other_recognized_hazards: bool,
    pub other_hazards_description: Option<String>,
    pub ppe_required: bool,
    pub ppe_list: Option<String>,
    pub forced_air_ventilation_sufficient: bool,
    pub dedicated_continuous_air_monitor: bool,
    pub warning_sign_posted: bool,
    pub other_people_working_near_space: bool,
    pub can_others_see_into_space: bool,
    pub contractors_enter_space: bool,
    pub is_entry_point_accessible: bool,
    pub requires_signage_update: bool,
    pub notes: Option<String>,
    pub pictures: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<Model> for Order {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            unique_id: model.unique_id,
            user_id: model.user_id,
            location_id: model.location_id,
            date_of_survey: model.date_of_survey,
            surveyors: model.surveyors,
            confined_space_name_or_id: model.confined_space_name_or_id,
            building: model.building,
            location_description: model.location_description,
            confined_space_description: model.confined_space_description,
            number_of_entry_points: model.number_of_entry_points,
            confined_space: model.confined_space,
            permit_required: model.permit_required,
            entry_requirements: model.entry_requirements,
            atmospheric_hazard: model.atmospheric_hazard,
            atmospheric_hazard_description: model.atmospheric_hazard_description,
            engulfment_hazard: model.engulfment_hazard,
            engulfment_hazard_description: model.engulfment_hazard_description,
            configuration_hazard: model.configuration_hazard,
            configuration_hazard_description: model.configuration_hazard_description,
            other_recognized_hazards: model.other_recognized_hazards,
            other_hazards_description: model.other_hazards_description,
            ppe_required: model.ppe_required,
            ppe_list: model.ppe_list,
            forced_air_ventilation_sufficient: model.forced_air_ventilation_sufficient,
            dedicated_continuous_air_monitor: model.dedicated_continuous_air_monitor,
            warning_sign_posted: model.warning_sign_posted,
            other_people_working_near_space: model.other_people_working_near_space,
            can_others_see_into_space: model.can_others_see_into_space,
            contractors_enter_space: model.contractors_enter_space,
            is_entry_point_accessible: model.is_entry_point_accessible,
            requires_signage_update: model.requires_signage_update,
            notes: model.notes,
            pictures: model.pictures.0,
            created_at: model.created_at,
            last_updated: model.last_updated,
        }
    }
}

/// An image received with a create request, not yet uploaded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderSearchParams {
    /// Exact internal id
    pub id: Option<Uuid>,
    /// Partial, case-insensitive match
    pub unique_id: Option<String>,
    /// Partial, case-insensitive match
    pub confined_space_name_or_id: Option<String>,
    /// Partial, case-insensitive match
    pub building: Option<String>,
    /// Every order surveyed on this UTC day (`YYYY-MM-DD`)
    pub date_of_survey: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LocationOrdersParams {
    /// Only count orders filed by this user
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationWorkOrders {
    pub success: bool,
    pub count: u64,
    pub data: Vec<Order>,
}
