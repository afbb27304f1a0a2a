use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mongodb::bson::oid::ObjectId;
use uuid::Uuid;

use crate::middleware::auth::Claims;
use crate::models::user::UserRole;

/// Issues an HS256 bearer token with a fresh `jti`.
pub fn generate_token(
    email: &str,
    user_id: ObjectId,
    role: UserRole,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();

    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(ttl_hours)).timestamp() as usize,
        user_id: user_id.to_hex(),
        role: role.as_str().to_string(),
        jti: Uuid::new_v4().to_string(),
    };

    let header = Header::new(Algorithm::HS256);
    encode(&header, &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn expires_at(exp: usize) -> DateTime<Utc> {
    Utc.timestamp_opt(exp as i64, 0)
        .single()
        .unwrap_or_else(Utc::now)
}
