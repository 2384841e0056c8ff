use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Router};

use super::envelope;
use crate::workflows::internships::domain::Caller;

/// Validates bearer tokens issued by the identity collaborator.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Caller, AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingToken,
    #[error("authorization header must use the Bearer scheme")]
    MalformedHeader,
    #[error("token is invalid or expired")]
    InvalidToken,
    #[error("token verifier not configured")]
    VerifierUnavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::VerifierUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        };
        envelope::failure(status, self.to_string())
    }
}

/// Token table populated at startup (demo seeding, fixtures).
#[derive(Default, Clone)]
pub struct StaticTokenVerifier {
    tokens: Arc<RwLock<HashMap<String, Caller>>>,
}

impl StaticTokenVerifier {
    pub fn issue(&self, token: impl Into<String>, caller: Caller) {
        self.tokens
            .write()
            .expect("token table poisoned")
            .insert(token.into(), caller);
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        self.tokens
            .read()
            .expect("token table poisoned")
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

/// Make `verifier` available to the `Caller` extractor on every route of `router`.
pub fn with_token_verifier(router: Router, verifier: Arc<dyn TokenVerifier>) -> Router {
    router.layer(Extension(verifier))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let verifier = parts
            .extensions
            .get::<Arc<dyn TokenVerifier>>()
            .cloned()
            .ok_or(AuthError::VerifierUnavailable)?;

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::MalformedHeader)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MalformedHeader)?;

        verifier.verify(token)
    }
}
