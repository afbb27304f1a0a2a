use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use validator::Validate;

use crate::db::repository::{StoreError, TokenRepository, UserRepository};
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::user::{LoginInput, RegisterInput, User, UserRole, UserView};
use crate::services::token_service::{expires_at, generate_token};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    auth_token: String,
    user: UserView,
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("user has no id".to_string()))?;
    Ok(generate_token(
        &user.email,
        user_id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_ttl_hours,
    )?)
}

pub async fn register(
    state: web::Data<AppState>,
    input: web::Json<RegisterInput>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    input.validate()?;

    if let Some(confirmation) = &input.password_confirmation {
        if confirmation != &input.password {
            return Err(ApiError::field(
                "password",
                "The password confirmation does not match.",
            ));
        }
    }

    let email = input.email.trim().to_lowercase();
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::field("email", "The email has already been taken."));
    }

    let now = Utc::now();
    let mut user = User {
        id: None,
        name: input.name.trim().to_string(),
        email,
        password: bcrypt::hash(&input.password, state.config.bcrypt_cost)?,
        role: UserRole::User,
        last_signin: None,
        failed_signins: Some(0),
        created_at: Some(now),
        updated_at: Some(now),
    };

    // The unique index still guards against a concurrent registration.
    let id = match state.store.create_user(&user).await {
        Ok(id) => id,
        Err(StoreError::DuplicateKey(_)) => {
            return Err(ApiError::field("email", "The email has already been taken."))
        }
        Err(err) => return Err(err.into()),
    };
    user.id = Some(id);
    log::info!("Registered user {}", id);

    let token = issue_token(&state, &user)?;
    Ok(HttpResponse::Created().json(TokenResponse {
        auth_token: token,
        user: UserView::from(&user),
    }))
}

pub async fn login(
    state: web::Data<AppState>,
    input: web::Json<LoginInput>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    input.validate()?;

    let email = input.email.trim().to_lowercase();
    let Some(user) = state.store.find_user_by_email(&email).await? else {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };
    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("user has no id".to_string()))?;

    if !bcrypt::verify(&input.password, &user.password).unwrap_or(false) {
        state.store.record_failed_signin(user_id).await?;
        log::info!("Failed sign-in for user {}", user_id);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    state.store.record_signin(user_id, Utc::now()).await?;
    let token = issue_token(&state, &user)?;
    Ok(HttpResponse::Ok().json(TokenResponse {
        auth_token: token,
        user: UserView::from(&user),
    }))
}

/// Revokes the presented token; other tokens of the same user stay valid.
pub async fn logout(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    state
        .store
        .revoke_token(&user.jti, expires_at(user.exp))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out" })))
}

pub async fn user_session(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    match state.store.find_user_by_id(user.user_id).await? {
        Some(account) => Ok(HttpResponse::Ok().json(UserView::from(&account))),
        None => Err(ApiError::not_found("User")),
    }
}
