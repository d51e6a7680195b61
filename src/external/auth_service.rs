//! Client for the external auth service, which owns users and their
//! `assignedLocations`. The location service never writes users directly.

use super::{ServiceError, json, send, with_bearer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SERVICE: &str = "auth";

#[derive(Clone)]
pub struct AuthServiceClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserLocationAssignment {
    #[serde(alias = "locationId")]
    pub location: String,
    pub assigned_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assigned_locations: Vec<UserLocationAssignment>,
}

impl AuthUser {
    /// When the user was assigned to `location_id`, if the auth service knows.
    pub fn assigned_since(&self, location_id: Uuid) -> Option<DateTime<Utc>> {
        let location_id = location_id.to_string();
        self.assigned_locations
            .iter()
            .find(|assignment| assignment.location == location_id)
            .and_then(|assignment| assignment.assigned_date)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserPayload {
    Wrapped { user: AuthUser },
    Bare(AuthUser),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentConflict {
    pub technician_id: String,
    pub location_id: String,
    #[serde(default)]
    pub technician_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssignmentValidation {
    pub valid: bool,
    #[serde(default)]
    pub conflicts: Vec<AssignmentConflict>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateAssignmentsRequest<'a> {
    location_id: Uuid,
    technician_ids: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAssignmentsRequest<'a> {
    location_id: Uuid,
    added_technicians: &'a [String],
    removed_technicians: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoveLocationRequest {
    location_id: Uuid,
}

impl AuthServiceClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/auth{path}", self.base_url)
    }

    /// `GET /api/auth/user/{id}`
    pub async fn get_user(
        &self,
        user_id: &str,
        bearer: Option<&str>,
    ) -> Result<AuthUser, ServiceError> {
        let request = with_bearer(self.http.get(self.url(&format!("/user/{user_id}"))), bearer);
        let response = send(SERVICE, request).await?;
        match json::<UserPayload>(SERVICE, response).await? {
            UserPayload::Wrapped { user } | UserPayload::Bare(user) => Ok(user),
        }
    }

    /// `POST /api/auth/validate-technician-assignments`
    pub async fn validate_technician_assignments(
        &self,
        location_id: Uuid,
        technician_ids: &[String],
        bearer: Option<&str>,
    ) -> Result<AssignmentValidation, ServiceError> {
        let request = with_bearer(
            self.http
                .post(self.url("/validate-technician-assignments"))
                .json(&ValidateAssignmentsRequest {
                    location_id,
                    technician_ids,
                }),
            bearer,
        );
        let response = send(SERVICE, request).await?;
        json(SERVICE, response).await
    }

    /// `POST /api/auth/update-location-assignments`
    pub async fn update_location_assignments(
        &self,
        location_id: Uuid,
        added_technicians: &[String],
        removed_technicians: &[String],
        bearer: Option<&str>,
    ) -> Result<(), ServiceError> {
        let request = with_bearer(
            self.http
                .post(self.url("/update-location-assignments"))
                .json(&UpdateAssignmentsRequest {
                    location_id,
                    added_technicians,
                    removed_technicians,
                }),
            bearer,
        );
        send(SERVICE, request).await?;
        Ok(())
    }

    /// `PATCH /api/auth/remove-location/{userId}`
    pub async fn remove_location(
        &self,
        user_id: &str,
        location_id: Uuid,
        bearer: Option<&str>,
    ) -> Result<(), ServiceError> {
        let request = with_bearer(
            self.http
                .patch(self.url(&format!("/remove-location/{user_id}")))
                .json(&RemoveLocationRequest { location_id }),
            bearer,
        );
        send(SERVICE, request).await?;
        Ok(())
    }
}
