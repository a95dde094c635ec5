use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User};

/// Signed token payload binding identity and role to an expiry.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: i64,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated identity resolved from a request's bearer token.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// Outcome of an authorization check, evaluated before any handler logic.
#[derive(Debug, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(String),
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn register(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password must not be empty".to_string()));
    }

    let password_hash = hash_password(password)?;
    match queries::create_user(conn, username, email, &password_hash, role) {
        Ok(user) => {
            tracing::info!(username, role = role.as_str(), "registered user");
            Ok(user)
        }
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(AppError::DuplicateIdentity(username.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Verifies credentials and mints a token. Unknown usernames and wrong
/// passwords surface as the same error.
pub fn login(
    conn: &Connection,
    config: &AppConfig,
    username: &str,
    password: &str,
) -> Result<TokenResponse, AppError> {
    let user = queries::find_user_by_username(conn, username)?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let access_token = issue_token(&user, &config.token_secret, config.token_ttl_minutes)?;
    tracing::debug!(username, "login succeeded");

    Ok(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: config.token_ttl_minutes * 60,
    })
}

pub fn issue_token(user: &User, secret: &str, ttl_minutes: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.username.clone(),
        uid: user.id,
        role: user.role.as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

/// Signature and expiry check; any failure is Unauthorized.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Resolves the request's bearer token to a principal. The secret is never
/// re-queried here; identity and role come from the verified claims.
pub fn authenticate(headers: &HeaderMap, config: &AppConfig) -> Result<Principal, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

    let claims = verify_token(token, &config.token_secret)?;
    let role = Role::parse(&claims.role).ok_or(AppError::Unauthorized)?;

    Ok(Principal {
        user_id: claims.uid,
        username: claims.sub,
        role,
    })
}

pub fn check_role(principal: &Principal, required: Role) -> Access {
    match required {
        // Any authenticated principal may act as a regular user.
        Role::User => Access::Allowed,
        Role::Admin if principal.role == Role::Admin => Access::Allowed,
        Role::Admin => Access::Denied(format!(
            "{} role required, {} has {}",
            Role::Admin.as_str(),
            principal.username,
            principal.role.as_str()
        )),
    }
}

pub fn require_role(principal: &Principal, required: Role) -> Result<(), AppError> {
    match check_role(principal, required) {
        Access::Allowed => Ok(()),
        Access::Denied(reason) => Err(AppError::Forbidden(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(role: Role) -> User {
        User {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            role,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("pw1").unwrap();
        assert_ne!(hash, "pw1");
        assert!(verify_password("pw1", &hash));
        assert!(!verify_password("pw2", &hash));
    }

    #[test]
    fn token_resolves_identity_and_role() {
        let user = test_user(Role::Admin);
        let token = issue_token(&user, "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.role, "ADMIN");
    }

    #[test]
    fn expired_token_rejected() {
        let user = test_user(Role::User);
        // Expired well beyond the default validation leeway.
        let token = issue_token(&user, "secret", -10).unwrap();
        assert!(matches!(
            verify_token(&token, "secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn tampered_token_rejected() {
        let user = test_user(Role::User);
        let token = issue_token(&user, "secret", 60).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            verify_token("not-a-token", "secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn role_check_denies_non_admin() {
        let principal = Principal {
            user_id: 7,
            username: "alice".to_string(),
            role: Role::User,
        };
        assert!(matches!(
            check_role(&principal, Role::Admin),
            Access::Denied(_)
        ));
        assert_eq!(check_role(&principal, Role::User), Access::Allowed);
    }
}
