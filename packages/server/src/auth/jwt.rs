use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a short-lived access credential.
///
/// Role and permissions are denormalized into the token so request handling
/// needs no user lookup; `token_id` keys the revocation set.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: i32,
    pub role: String,
    pub permissions: Vec<String>,
    pub token_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh credential.
///
/// Deliberately minimal so a stolen refresh token leaks nothing about the
/// account's rights. `deny_unknown_fields` makes an access token fail to
/// decode here, which is what rejects it on the refresh path.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefreshClaims {
    pub user_id: i32,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed access credential.
pub struct IssuedAccess {
    pub token: String,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Sign a new access token with a fresh token id.
pub fn sign_access(
    user_id: i32,
    role: &str,
    permissions: Vec<String>,
    secret: &str,
    ttl_minutes: i64,
) -> Result<IssuedAccess> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(Duration::minutes(ttl_minutes))
        .expect("valid timestamp");
    let token_id = Uuid::new_v4();

    let claims = AccessClaims {
        user_id,
        role: role.to_owned(),
        permissions,
        token_id,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(IssuedAccess {
        token,
        token_id,
        expires_at,
    })
}

/// Sign a new refresh token.
pub fn sign_refresh(user_id: i32, secret: &str, ttl_days: i64) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::days(ttl_days))
        .expect("valid timestamp");

    let claims = RefreshClaims {
        user_id,
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode an access token.
pub fn verify_access(token: &str, secret: &str) -> Result<AccessClaims> {
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Verify and decode a refresh token. Access tokens fail here because of
/// their extra claims.
pub fn verify_refresh(token: &str, secret: &str) -> Result<RefreshClaims> {
    let data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
