//! HTTP routes for authentication
//!
//! - POST /auth/register - Create an account
//! - POST /auth/login    - Authenticate and get an access token
//!
//! Registration checks for an existing email before inserting. The check
//! and the insert are not atomic; the unique index on `users.email` turns
//! the losing side of a concurrent race into a duplicate-key failure,
//! which maps to the same DuplicateEmail response as the pre-check.

use bson::doc;
use chrono::Duration;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{verify_password, TokenInput};
use crate::db::schemas::{SanitizedUser, UserDoc, USER_COLLECTION};
use crate::routes::{
    cors_preflight, error_response, json_response, parse_json_body, BoxBody, ErrorResponse,
};
use crate::server::AppState;
use crate::types::ApiError;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "developer".to_string()
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub data: SanitizedUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: SanitizedUser,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /auth/register
///
/// Flow:
/// 1. Check the email is not already registered
/// 2. Persist the new user with stamped timestamps
/// 3. Return the stored record with the password stripped
async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, ApiError> {
    let body: RegisterRequest = parse_json_body(req).await?;

    if body.email.is_empty() || body.password.is_empty() || body.full_name.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required fields: email, password, fullName".into(),
        ));
    }

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;

    if users.find_one(doc! { "email": &body.email }).await?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }

    let mut user = UserDoc::new(body.email, body.password, body.full_name, body.role);

    let inserted_id = match users.insert_one(&mut user).await {
        Ok(id) => id,
        Err(ApiError::Database(msg))
            if msg.contains("duplicate key") || msg.contains("E11000") =>
        {
            // Lost a concurrent registration race; same outcome as the pre-check
            return Err(ApiError::DuplicateEmail);
        }
        Err(e) => return Err(e),
    };
    user.id = Some(inserted_id);

    info!("Registered new user: {}", user.email);

    Ok(json_response(
        StatusCode::OK,
        &RegisterResponse {
            status: "success",
            data: user.sanitized(),
        },
    ))
}

/// POST /auth/login
///
/// Unknown email and wrong password produce the same failure, so callers
/// cannot probe which addresses have accounts.
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, ApiError> {
    let body: LoginRequest = parse_json_body(req).await?;

    if body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required fields: email, password".into(),
        ));
    }

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;

    let user = match users.find_one(doc! { "email": &body.email }).await? {
        Some(u) => u,
        None => {
            warn!("Login failed - user not found: {}", body.email);
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&body.password, &user.password) {
        warn!("Login failed - invalid password: {}", body.email);
        return Err(ApiError::InvalidCredentials);
    }

    let subject = user.id.map(|oid| oid.to_hex()).unwrap_or_default();
    let ttl = Duration::minutes(state.args.access_token_expire_minutes as i64);

    let token = state
        .codec
        .issue(
            TokenInput {
                subject: subject.clone(),
                email: user.email.clone(),
                role: user.role.clone(),
            },
            Some(ttl),
        )
        .map_err(|e| ApiError::Database(format!("Failed to generate token: {}", e)))?;

    info!("Login successful: {}", user.email);

    Ok(json_response(
        StatusCode::OK,
        &LoginResponse {
            access_token: token,
            token_type: "bearer",
            user: SanitizedUser {
                id: subject,
                email: user.email,
                full_name: user.full_name,
                role: user.role,
                created_at: None,
                updated_at: None,
            },
        },
    ))
}

// =============================================================================
// Main Router
// =============================================================================

/// Handle auth-related HTTP requests.
///
/// Returns Some(response) if the request was handled, None if not an auth
/// route.
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    if !path.starts_with("/auth") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    // Remove query string for matching
    let path = path.split('?').next().unwrap_or(path).to_string();

    let response = match (method.clone(), path.as_str()) {
        (Method::POST, "/auth/register") => handle_register(req, state)
            .await
            .unwrap_or_else(|e| error_response(&e)),
        (Method::POST, "/auth/login") => handle_login(req, state)
            .await
            .unwrap_or_else(|e| error_response(&e)),

        (_, "/auth/register") | (_, "/auth/login") => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse {
                error: "Method not allowed".into(),
                code: None,
            },
        ),

        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: "Auth endpoint not found".into(),
                code: None,
            },
        ),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_defaults_role() {
        let body: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@x.com","password":"pw","fullName":"A"}"#,
        )
        .unwrap();
        assert_eq!(body.role, "developer");
    }

    #[test]
    fn test_register_request_explicit_role() {
        let body: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@x.com","password":"pw","fullName":"A","role":"manager"}"#,
        )
        .unwrap();
        assert_eq!(body.role, "manager");
    }

    #[test]
    fn test_login_response_shape() {
        let resp = LoginResponse {
            access_token: "t.t.t".to_string(),
            token_type: "bearer",
            user: SanitizedUser {
                id: "1".to_string(),
                email: "a@x.com".to_string(),
                full_name: "A".to_string(),
                role: "developer".to_string(),
                created_at: None,
                updated_at: None,
            },
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"accessToken\":\"t.t.t\""));
        assert!(json.contains("\"tokenType\":\"bearer\""));
        assert!(json.contains("\"fullName\":\"A\""));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_register_response_shape() {
        let resp = RegisterResponse {
            status: "success",
            data: SanitizedUser {
                id: "1".to_string(),
                email: "a@x.com".to_string(),
                full_name: "A".to_string(),
                role: "developer".to_string(),
                created_at: Some("2025-01-01T00:00:00Z".to_string()),
                updated_at: Some("2025-01-01T00:00:00Z".to_string()),
            },
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"createdAt\""));
    }
}
