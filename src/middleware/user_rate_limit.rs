use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::KeyExtractor, GovernorError, GovernorLayer,
};
use uuid::Uuid;

use crate::middleware::rate_limit::rate_limit_error_handler;
use crate::utils::jwt::Claims;

/// Keys requests by the user id in the JWT claims set by `auth_middleware`
#[derive(Debug, Clone, Copy)]
pub struct UserIdExtractor;

impl KeyExtractor for UserIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let claims = req
            .extensions()
            .get::<Claims>()
            .ok_or(GovernorError::UnableToExtractKey)?;

        Ok(claims.sub)
    }
}

pub type UserGovernorLayer = GovernorLayer<
    UserIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Per-user limit on company routes: 300 requests per minute.
/// Admin routes are not limited per user.
pub fn create_user_governor() -> UserGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(200)
            .burst_size(300)
            .key_extractor(UserIdExtractor)
            .finish()
            .expect("rate limit period and burst must be non-zero"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::Role;

    #[test]
    fn test_key_is_user_id() {
        let user = Uuid::new_v4();
        let mut req = Request::new(());
        req.extensions_mut().insert(Claims {
            sub: user,
            company_id: Uuid::new_v4(),
            role: Role::Member,
            exp: 0,
            iat: 0,
        });
        assert_eq!(UserIdExtractor.extract(&req).unwrap(), user);
    }

    #[test]
    fn test_missing_claims_cannot_be_keyed() {
        let req = Request::new(());
        assert!(UserIdExtractor.extract(&req).is_err());
    }
}
