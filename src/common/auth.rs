use crate::common::errors::BusinessError;
use crate::common::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header::AUTHORIZATION, request::Parts};
use axum_keycloak_auth::{PassthroughMode, decode::KeycloakToken, layer::KeycloakAuthLayer};
use utoipa_axum::router::OpenApiRouter;

/// Header carrying the caller id when Keycloak is disabled (local runs, tests).
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller role when Keycloak is disabled.
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Role {
    Administrator,
    Unknown(String),
}
impl axum_keycloak_auth::role::Role for Role {}
impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Administrator => f.write_str(&crate::config::admin_role_name()),
            Role::Unknown(unknown) => f.write_fmt(format_args!("Unknown role: {unknown}")),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value == crate::config::admin_role_name() {
            Role::Administrator
        } else {
            Role::Unknown(value)
        }
    }
}

/// The authenticated caller of a request.
///
/// Built from the decoded Keycloak token when the auth layer is active,
/// otherwise from the `x-user-id` / `x-user-role` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub is_admin: bool,
    /// Raw `Authorization` header, forwarded on inter-service calls
    pub bearer: Option<String>,
}

impl CurrentUser {
    #[cfg(test)]
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
            bearer: None,
        }
    }

    #[cfg(test)]
    pub fn technician(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
            bearer: None,
        }
    }

    /// Admins may touch everything, everyone else only what they own.
    pub fn can_manage(&self, owner_id: &str) -> bool {
        self.is_admin || self.id == owner_id
    }

    fn from_headers(headers: &HeaderMap, bearer: Option<String>) -> Option<Self> {
        let id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())?
            .to_string();
        let is_admin = headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|role| role == "admin" || role == crate::config::admin_role_name());

        Some(Self {
            id,
            is_admin,
            bearer,
        })
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = BusinessError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        if let Some(token) = parts.extensions.get::<KeycloakToken<Role>>() {
            let is_admin = token
                .roles
                .iter()
                .any(|role| *role.role() == Role::Administrator);
            return Ok(Self {
                id: token.subject.clone(),
                is_admin,
                bearer,
            });
        }

        // Identity headers are only trusted when no token validation is configured
        if state.keycloak_auth_instance.is_none() {
            if let Some(user) = Self::from_headers(&parts.headers, bearer) {
                return Ok(user);
            }
        }

        Err(BusinessError::Unauthorized {
            message: "Authentication required".to_string(),
        })
    }
}

/// Require a valid Keycloak token on every route of `router`. Role checks
/// happen in the handlers since technicians and admins share endpoints.
pub fn require_login(router: OpenApiRouter, state: &AppState, resource: &str) -> OpenApiRouter {
    if let Some(instance) = state.keycloak_auth_instance.clone() {
        router.layer(
            KeycloakAuthLayer::<Role>::builder()
                .instance(instance)
                .passthrough_mode(PassthroughMode::Block)
                .persist_raw_claims(false)
                .expected_audiences(vec![String::from("account")])
                .required_roles(vec![])
                .build(),
        )
    } else {
        if !state.config.tests_running {
            tracing::warn!("Routes of the {resource} router are not protected by Keycloak");
        }
        router
    }
}
