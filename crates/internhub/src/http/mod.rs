//! Transport glue shared by the workflow routers: the response envelope and bearer-token auth.

pub mod auth;
pub mod envelope;

pub use auth::{with_token_verifier, AuthError, StaticTokenVerifier, TokenVerifier};
pub use envelope::Envelope;
