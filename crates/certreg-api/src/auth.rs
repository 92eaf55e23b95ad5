//! # Authentication & Authorization Middleware
//!
//! Bearer token middleware with role-based access control for the
//! management API. Public verification never passes through here.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{subject}:{secret}   instructor or admin bound to a subject
//! Bearer {secret}                    legacy format, treated as admin
//! ```
//!
//! The subject is the identifier recorded as `issued_by` on certificates
//! the caller issues. Instructors must carry one.
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions. Handlers extract it via the `FromRequestParts` impl.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;

use certreg_core::IssuedCertificate;

use crate::error::{AppError, ErrorBody};

/// Maximum subject length in a bearer token.
pub const MAX_SUBJECT_LEN: usize = 255;

// ── Role ────────────────────────────────────────────────────────────────────

/// Management roles, ordered by privilege level.
///
/// `Instructor < Admin`, so `>=` is the access check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Issues certificates and revokes the ones they issued.
    Instructor,
    /// Full access to all management endpoints.
    Admin,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's role.
    pub role: Role,
    /// Stable caller identifier, recorded as `issued_by`.
    pub subject: Option<String>,
}

impl CallerIdentity {
    /// Identity injected when authentication is disabled.
    pub fn unauthenticated_admin() -> Self {
        Self {
            role: Role::Admin,
            subject: None,
        }
    }

    /// Check if the caller has at least the given minimum role.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }

    /// Check if the caller may manage (read or revoke) the given certificate.
    ///
    /// - `Admin` can manage any certificate.
    /// - `Instructor` can only manage certificates issued under their subject.
    pub fn can_manage(&self, certificate: &IssuedCertificate) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Instructor => match (&self.subject, &certificate.links().issued_by) {
                (Some(caller), Some(issuer)) => caller == issuer,
                _ => false,
            },
        }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Check that the caller has at least the required role.
/// Returns 403 Forbidden if the caller's role is insufficient.
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer token secrets.
///
/// When lengths differ a dummy comparison still runs so the mismatch
/// path costs about the same as the match path.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token in format `{role}:{subject}:{secret}` or `{secret}`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();
    match parts.as_slice() {
        [secret] => {
            if constant_time_token_eq(secret, expected_secret) {
                Ok(CallerIdentity::unauthenticated_admin())
            } else {
                Err("invalid bearer token".into())
            }
        }
        [role_str, subject, secret] => {
            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }
            let role = match *role_str {
                "admin" => Role::Admin,
                "instructor" => Role::Instructor,
                other => return Err(format!("unknown role: {other}")),
            };
            let subject = subject.trim();
            if subject.chars().count() > MAX_SUBJECT_LEN {
                return Err("token subject too long".into());
            }
            let subject = (!subject.is_empty()).then(|| subject.to_string());
            if role == Role::Instructor && subject.is_none() {
                return Err("instructor tokens must carry a subject".into());
            }
            Ok(CallerIdentity { role, subject })
        }
        _ => Err("invalid token format, expected {role}:{subject}:{secret} or {secret}".into()),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the Bearer token and inject the caller's [`CallerIdentity`].
///
/// When `AuthConfig.token` is `None`, all requests are allowed with an
/// admin identity (auth disabled / development mode).
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
                Some(provided) => match parse_bearer_token(provided, expected) {
                    Ok(identity) => {
                        tracing::debug!(role = identity.role.as_str(), subject = ?identity.subject, "caller authenticated");
                        request.extensions_mut().insert(identity);
                        next.run(request).await
                    }
                    Err(msg) => {
                        tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                        unauthorized_response(&msg)
                    }
                },
                None if auth_header.is_some() => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    unauthorized_response("authorization header must use Bearer scheme")
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    unauthorized_response("missing authorization header")
                }
            }
        }
        _ => {
            request
                .extensions_mut()
                .insert(CallerIdentity::unauthenticated_admin());
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody::new("UNAUTHORIZED", message);
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
