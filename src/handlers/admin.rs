use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, Role, Service};
use crate::services::{appointments, auth};
use crate::state::AppState;

/// User summary for the admin listing; sensitive fields excluded.
#[derive(Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct GrantAccessRequest {
    pub role: String,
}

#[derive(Deserialize)]
pub struct DecisionRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let principal = auth::authenticate(&headers, &state.config)?;
    auth::require_role(&principal, Role::Admin)?;

    let db = state.db.lock().unwrap();
    let users = queries::list_users(&db)?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| UserSummary {
                id: u.id,
                username: u.username,
                email: u.email,
                role: u.role,
            })
            .collect(),
    ))
}

// PUT /api/admin/users/:id/grant-access
pub async fn grant_access(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
    Json(body): Json<GrantAccessRequest>,
) -> Result<&'static str, AppError> {
    let principal = auth::authenticate(&headers, &state.config)?;
    auth::require_role(&principal, Role::Admin)?;

    let role = Role::parse(&body.role)
        .ok_or_else(|| AppError::Validation(format!("unknown role {:?}", body.role)))?;

    let db = state.db.lock().unwrap();
    if !queries::update_user_role(&db, user_id, role)? {
        return Err(AppError::NotFound(format!("user {user_id}")));
    }
    tracing::info!(user_id, role = role.as_str(), by = %principal.username, "role granted");
    Ok("Access granted")
}

// PUT /api/admin/appointments/:id/approve
pub async fn decide_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(appointment_id): Path<i64>,
    Json(body): Json<DecisionRequest>,
) -> Result<&'static str, AppError> {
    let principal = auth::authenticate(&headers, &state.config)?;
    auth::require_role(&principal, Role::Admin)?;

    let db = state.db.lock().unwrap();
    appointments::decide(&db, appointment_id, &body.status)?;
    Ok("Appointment updated")
}

// GET /api/admin/appointments/pending
pub async fn pending_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let principal = auth::authenticate(&headers, &state.config)?;
    auth::require_role(&principal, Role::Admin)?;

    let db = state.db.lock().unwrap();
    let pending = queries::list_appointments_by_status(&db, AppointmentStatus::Pending)?;
    Ok(Json(pending))
}

// POST /api/admin/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateServiceRequest>,
) -> Result<Json<Service>, AppError> {
    let principal = auth::authenticate(&headers, &state.config)?;
    auth::require_role(&principal, Role::Admin)?;

    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if body.price < 0.0 {
        return Err(AppError::Validation("price must not be negative".to_string()));
    }

    let db = state.db.lock().unwrap();
    let service = queries::create_service(&db, &body.name, body.price, body.description.as_deref())?;
    Ok(Json(service))
}
