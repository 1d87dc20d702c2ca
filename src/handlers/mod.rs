pub mod admin;
pub mod cargos;
pub mod matches;
pub mod places;
pub mod vehicles;

use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::entities::company;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{Claims, Role};

/// Only the owning company (or an admin) may change a record
pub(crate) fn ensure_owner(claims: &Claims, company_id: Uuid) -> AppResult<()> {
    if claims.role == Role::Admin || claims.company_id == company_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "This record belongs to another company".to_string(),
        ))
    }
}

/// Companies are provisioned by the identity service; records may only be
/// posted for one that exists here
pub(crate) async fn ensure_company(db: &DatabaseConnection, company_id: Uuid) -> AppResult<()> {
    company::Entity::find_by_id(company_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Forbidden("Unknown company".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(company_id: Uuid, role: Role) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            company_id,
            role,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_ensure_owner() {
        let company = Uuid::new_v4();
        assert!(ensure_owner(&claims(company, Role::Member), company).is_ok());
        assert!(ensure_owner(&claims(Uuid::new_v4(), Role::Admin), company).is_ok());
        assert!(matches!(
            ensure_owner(&claims(Uuid::new_v4(), Role::Member), company),
            Err(AppError::Forbidden(_))
        ));
    }
}
