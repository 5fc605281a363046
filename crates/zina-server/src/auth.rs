//! Authorization gate for the back-office.
//!
//! Every admin route passes through [`require_admin`], which calls
//! [`authorize`] once per request: the bearer must be a session JWT issued by
//! the hosted auth provider, and its subject must have an active row in
//! `admins`. On success the request carries an [`AdminPrincipal`] extension;
//! admin mutation handlers take it as an argument, so they cannot be mounted
//! without the gate in front of them.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::api::ApiError;
use crate::middleware::{bearer_token, RequestId};

/// The claim read from a session token; `exp` and `aud` are checked by the
/// validator. `sub` is the account UUID.
#[derive(Debug, Clone, Deserialize)]
struct SessionClaims {
    sub: String,
}

/// Verifies HS256 session tokens against a shared secret and audience.
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("key", &"[redacted]")
            .field("audience", &self.validation.aud)
            .finish()
    }
}

impl SessionVerifier {
    #[must_use]
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decodes `token` and returns the account id from its subject.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] when the signature, expiry or
    /// audience check fails, or the subject is not a UUID.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            AuthError::Unauthenticated
        })?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::Unauthenticated)
    }
}

/// Identity of the admin a request was authorized for.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub admin_id: i64,
    pub user_id: Uuid,
    pub full_name: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or invalid session token")]
    Unauthenticated,
    #[error("account is not an active admin")]
    Forbidden,
    #[error("admin lookup failed: {0}")]
    Persistence(#[from] zina_db::DbError),
}

impl AuthError {
    #[must_use]
    pub fn into_api_error(self, request_id: String) -> ApiError {
        match self {
            AuthError::Unauthenticated => ApiError::new(
                request_id,
                "unauthorized",
                "missing or invalid session token",
            ),
            AuthError::Forbidden => {
                ApiError::new(request_id, "forbidden", "account is not an active admin")
            }
            AuthError::Persistence(e) => {
                tracing::error!(error = %e, "admin lookup failed");
                ApiError::new(request_id, "internal_error", "admin lookup failed")
            }
        }
    }
}

/// Shared state of the gate. Without a verifier every admin request is
/// rejected as unauthenticated.
#[derive(Debug, Clone)]
pub struct AuthState {
    verifier: Option<Arc<SessionVerifier>>,
    pool: PgPool,
}

impl AuthState {
    #[must_use]
    pub fn new(verifier: Option<SessionVerifier>, pool: PgPool) -> Self {
        Self {
            verifier: verifier.map(Arc::new),
            pool,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &zina_core::AppConfig, pool: PgPool) -> Self {
        let verifier = config
            .auth_jwt_secret
            .as_deref()
            .map(|secret| SessionVerifier::new(secret, &config.auth_jwt_audience));
        if verifier.is_none() {
            tracing::warn!("ZINA_AUTH_JWT_SECRET not set; admin routes will reject every request");
        }
        Self::new(verifier, pool)
    }

    /// Resolves the session account id from the request headers.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] when no verifier is configured,
    /// the bearer is missing, or the token does not verify.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let verifier = self.verifier.as_ref().ok_or(AuthError::Unauthenticated)?;
        let token = bearer_token(headers).ok_or(AuthError::Unauthenticated)?;
        verifier.verify(token)
    }
}

/// The single authorization decision for admin operations.
///
/// # Errors
///
/// - [`AuthError::Unauthenticated`] without a valid session.
/// - [`AuthError::Forbidden`] when the session account has no active admin row.
/// - [`AuthError::Persistence`] if the admin lookup fails.
pub async fn authorize(auth: &AuthState, headers: &HeaderMap) -> Result<AdminPrincipal, AuthError> {
    let user_id = auth.authenticate(headers)?;
    let admin = zina_db::find_active_admin(&auth.pool, user_id)
        .await?
        .ok_or(AuthError::Forbidden)?;

    Ok(AdminPrincipal {
        admin_id: admin.id,
        user_id: admin.user_id,
        full_name: admin.full_name,
    })
}

/// Middleware guarding the admin router.
pub async fn require_admin(State(auth): State<AuthState>, mut req: Request, next: Next) -> Response {
    match authorize(&auth, req.headers()).await {
        Ok(principal) => {
            tracing::debug!(
                admin_id = principal.admin_id,
                user_id = %principal.user_id,
                "admin authorized"
            );
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(err) => {
            let request_id = req
                .extensions()
                .get::<RequestId>()
                .map(|id| id.0.clone())
                .unwrap_or_default();
            if !matches!(err, AuthError::Persistence(_)) {
                tracing::info!(reason = %err, "admin request rejected");
            }
            err.into_api_error(request_id).into_response()
        }
    }
}
