use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Role;
use crate::services::auth::{self, TokenResponse};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// POST /api/auth/register/user
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<&'static str, AppError> {
    let db = state.db.lock().unwrap();
    auth::register(&db, &body.username, &body.email, &body.password, Role::User)?;
    Ok("User registered successfully")
}

// POST /api/auth/register/admin
pub async fn register_admin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<&'static str, AppError> {
    let db = state.db.lock().unwrap();
    auth::register(&db, &body.username, &body.email, &body.password, Role::Admin)?;
    Ok("Admin registered successfully")
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let token = auth::login(&db, &state.config, &body.username, &body.password)?;
    Ok(Json(token))
}
