use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, Notification};
use crate::services::{appointments, auth, notifications};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BookRequest {
    pub service_type: String,
    pub appointment_time: String,
}

/// Appointment as shown to its owner; the owning user reference is
/// implicit.
#[derive(Serialize)]
pub struct AppointmentView {
    pub id: i64,
    pub service_type: String,
    pub appointment_time: NaiveDateTime,
    pub status: AppointmentStatus,
}

#[derive(Serialize)]
pub struct NotificationView {
    pub id: i64,
    pub message: String,
    pub read: bool,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub appointments: Vec<AppointmentView>,
    pub notifications: Vec<NotificationView>,
}

impl From<Appointment> for AppointmentView {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            service_type: a.service_type,
            appointment_time: a.appointment_time,
            status: a.status,
        }
    }
}

impl From<Notification> for NotificationView {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            message: n.message,
            read: n.read,
        }
    }
}

// POST /api/user/appointments
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookRequest>,
) -> Result<&'static str, AppError> {
    let principal = auth::authenticate(&headers, &state.config)?;

    let db = state.db.lock().unwrap();
    appointments::book(&db, principal.user_id, &body.service_type, &body.appointment_time)?;
    Ok("Appointment booked, awaiting approval")
}

// GET /api/user/dashboard
//
// Side effect: every notification returned here is marked read.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, AppError> {
    let principal = auth::authenticate(&headers, &state.config)?;

    let db = state.db.lock().unwrap();
    let appointments = queries::list_appointments_for_user(&db, principal.user_id)?;
    let notifications = notifications::take_unread(&db, principal.user_id)?;

    Ok(Json(DashboardResponse {
        appointments: appointments.into_iter().map(Into::into).collect(),
        notifications: notifications.into_iter().map(Into::into).collect(),
    }))
}
