use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

/// Claims carried by tokens issued by the identity service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,        // user id
    pub company_id: Uuid,
    pub role: Role,
    pub exp: i64,         // expiration timestamp
    pub iat: i64,         // issued at timestamp
}

pub fn create_token(
    user_id: Uuid,
    company_id: Uuid,
    role: Role,
    secret: &str,
    expiration_hours: i64,
) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user_id,
        company_id,
        role,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies_with_same_secret() {
        let user = Uuid::new_v4();
        let company = Uuid::new_v4();
        let token = create_token(user, company, Role::Member, "s3cret", 1).unwrap();

        let claims = verify_token(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.company_id, company);
        assert_eq!(claims.role, Role::Member);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = create_token(Uuid::new_v4(), Uuid::new_v4(), Role::Admin, "a", 1).unwrap();
        assert!(matches!(
            verify_token(&token, "b"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = create_token(Uuid::new_v4(), Uuid::new_v4(), Role::Member, "s", -2).unwrap();
        assert!(verify_token(&token, "s").is_err());
    }
}
