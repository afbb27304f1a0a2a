use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;
use crate::middleware::auth::{authenticate, bearer_token, Claims};
use crate::models::user::UserRole;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: ObjectId,
    pub email: String,
    pub role: UserRole,
    pub jti: String,
    pub exp: usize,
}

impl AuthenticatedUser {
    fn from_claims(claims: &Claims) -> Result<Self, ApiError> {
        let user_id = ObjectId::parse_str(&claims.user_id)
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;
        Ok(Self {
            user_id,
            email: claims.sub.clone(),
            role: UserRole::parse(&claims.role).unwrap_or_default(),
            jti: claims.jti.clone(),
            exp: claims.exp,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Admins pass every role check.
    pub fn require_role(&self, roles: &[UserRole]) -> Result<(), ApiError> {
        if self.is_admin() || roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Insufficient permissions".to_string()))
        }
    }
}

async fn resolve(req: HttpRequest) -> Result<Option<AuthenticatedUser>, ApiError> {
    // Set by AuthMiddleware on protected scopes.
    let claims = req.extensions().get::<Claims>().cloned();
    if let Some(claims) = claims {
        return AuthenticatedUser::from_claims(&claims).map(Some);
    }

    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        return Ok(None);
    };
    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("application state missing".to_string()))?;

    let claims = authenticate(&state, &token).await?;
    AuthenticatedUser::from_claims(&claims).map(Some)
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            resolve(req)
                .await?
                .ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string()))
        })
    }
}

/// Caller identity on routes that also serve anonymous users. A bad or
/// revoked token is treated as no token.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<ObjectId> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

impl FromRequest for MaybeUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match resolve(req).await {
                Ok(user) => Ok(MaybeUser(user)),
                Err(ApiError::Unauthorized(reason)) => {
                    log::debug!("Ignoring credentials on optional-auth route: {}", reason);
                    Ok(MaybeUser(None))
                }
                Err(err) => Err(err),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: ObjectId::new(),
            email: "kenji@example.com".to_string(),
            role,
            jti: "jti".to_string(),
            exp: 0,
        }
    }

    #[test]
    fn admin_passes_every_role_check() {
        assert!(user(UserRole::Admin).require_role(&[UserRole::Business]).is_ok());
        assert!(user(UserRole::Business).require_role(&[UserRole::Business]).is_ok());
        assert!(matches!(
            user(UserRole::User).require_role(&[UserRole::Business]),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn unknown_role_claim_falls_back_to_user() {
        let claims = Claims {
            sub: "kenji@example.com".to_string(),
            exp: 0,
            iat: 0,
            user_id: ObjectId::new().to_hex(),
            role: "superuser".to_string(),
            jti: "abc".to_string(),
        };
        let user = AuthenticatedUser::from_claims(&claims).unwrap();
        assert_eq!(user.role, UserRole::User);
    }
}
