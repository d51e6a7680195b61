use crate::common::state::AppState;
use crate::{locations, orders};
use axum::{Router, extract::DefaultBodyLimit};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    security(
        ("bearerAuth" = [])
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

fn finish(api_router: OpenApiRouter) -> Router {
    let (router, api) = api_router.split_for_parts();

    router
        .merge(Scalar::with_url("/api/docs", api))
        .layer(DefaultBodyLimit::max(30 * 1024 * 1024))
}

/// Locations, their buildings and technician assignments.
pub fn build_location_router(state: &AppState) -> Router {
    finish(
        OpenApiRouter::with_openapi(ApiDoc::openapi())
            .merge(crate::common::views::router(state))
            .nest("/api/locations", locations::views::router(state)),
    )
}

/// Work orders and their photos.
pub fn build_inventory_router(state: &AppState) -> Router {
    finish(
        OpenApiRouter::with_openapi(ApiDoc::openapi())
            .merge(crate::common::views::router(state))
            .nest("/api/workorders", orders::views::router(state)),
    )
}
