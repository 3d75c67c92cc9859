//! Role catalog endpoints.
//!
//! Served under `/api/ajustes/roles`. Successful mutations answer with the
//! stored role; every failure answers `{ "error": message }`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use panelerp_auth::RoleSubmission;
use panelerp_core::RoleId;
use panelerp_infra::RoleCatalogStore;

use crate::app::{errors, services::AppServices};

// ─────────────────────────────────────────────────────────────────────────────
// Query Parameters
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteRoleQuery {
    pub id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(list_roles)
                .post(create_role)
                .put(update_role)
                .delete(delete_role),
        )
        .route("/:id/permisos", get(role_grants))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/ajustes/roles - every role plus the permission catalog
pub async fn list_roles(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.roles.list().await {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /api/ajustes/roles - create a role from id lists
pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RoleSubmission>, JsonRejection>,
) -> axum::response::Response {
    let mut submission = match body {
        Ok(Json(s)) => s,
        Err(rejection) => return errors::json_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    // Ids are assigned by the store.
    submission.id = None;

    tracing::debug!(name = %submission.name, ids = submission.all_ids().count(), "create role");

    match services.roles.create(&submission).await {
        Ok(role) => (StatusCode::OK, Json(json!({ "role": role }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// PUT /api/ajustes/roles - replace a role wholesale
pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RoleSubmission>, JsonRejection>,
) -> axum::response::Response {
    let submission = match body {
        Ok(Json(s)) => s,
        Err(rejection) => return errors::json_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    tracing::debug!(
        role_id = submission.id.as_ref().map(|id| id.as_str()),
        ids = submission.all_ids().count(),
        "update role"
    );

    match services.roles.update(&submission).await {
        Ok(role) => (StatusCode::OK, Json(json!({ "role": role }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// DELETE /api/ajustes/roles?id=<id>
pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<DeleteRoleQuery>,
) -> axum::response::Response {
    let id: RoleId = match query.id.unwrap_or_default().parse() {
        Ok(id) => id,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "ID del rol es obligatorio"),
    };

    tracing::debug!(role_id = %id, "delete role");

    match services.roles.delete(&id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /api/ajustes/roles/:id/permisos - flat grants of one role
pub async fn role_grants(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = RoleId::new(id);
    match services.roles.grants(&id).await {
        Ok(grants) => (StatusCode::OK, Json(grants)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
