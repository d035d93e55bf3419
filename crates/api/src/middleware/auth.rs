//! Bearer-token authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use markethub_core::AccountId;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires an `Authorization: Bearer <token>` header naming
/// a live account session.
///
/// Rejects with `401 Unauthorized` when the header is missing, malformed, or
/// the token is unknown or expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn show(RequireAccount(account): RequireAccount) -> String {
///     format!("cart for {account}")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAccount(pub AccountId);

impl FromRequestParts<AppState> for RequireAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let account = state
            .sessions()
            .resolve(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown or expired token".to_string()))?;

        set_sentry_user(&account);
        tracing::Span::current().record("account_id", account.as_str());
        Ok(Self(account))
    }
}

/// The token of an `Authorization: Bearer` header, if present.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/cart");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc "))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
