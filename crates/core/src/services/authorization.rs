//! Authorization gate evaluated before each mutating lifecycle operation.
//!
//! Authentication itself happens at the request boundary; by the time these
//! predicates run, the caller identity has already been resolved. The gate
//! only answers role and ownership questions.

use wastewatch_db::entities::{user, user::UserRole, waste_report};
use wastewatch_common::{AppError, AppResult};

/// Resolved caller identity, threaded explicitly into every lifecycle call.
#[derive(Debug, Clone)]
pub struct Identity {
    /// User ID.
    pub id: String,
    /// Role attached to the account.
    pub role: UserRole,
}

impl Identity {
    /// Build an identity from an authenticated user record.
    #[must_use]
    pub fn of(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
        }
    }
}

impl From<&user::Model> for Identity {
    fn from(user: &user::Model) -> Self {
        Self::of(user)
    }
}

/// Require the admin role.
pub fn require_admin(identity: &Identity) -> AppResult<()> {
    if identity.role == UserRole::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Require that the caller owns the report.
pub fn require_owner(identity: &Identity, report: &waste_report::Model) -> AppResult<()> {
    if identity.id == report.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the report owner may do this".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wastewatch_db::entities::waste_report::{ReportStatus, WasteType};

    fn identity(id: &str, role: UserRole) -> Identity {
        Identity {
            id: id.to_string(),
            role,
        }
    }

    fn report_owned_by(owner: &str) -> waste_report::Model {
        waste_report::Model {
            id: "r1".to_string(),
            user_id: owner.to_string(),
            description: "overflowing bin".to_string(),
            waste_type: WasteType::Organic,
            lat: 27.7,
            lng: 85.3,
            image_key: "k".to_string(),
            image_url: "/files/k".to_string(),
            status: ReportStatus::Pending,
            points_awarded: 0,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&identity("a1", UserRole::Admin)).is_ok());
        assert!(matches!(
            require_admin(&identity("u1", UserRole::User)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_owner() {
        let report = report_owned_by("u1");
        assert!(require_owner(&identity("u1", UserRole::User), &report).is_ok());
        assert!(matches!(
            require_owner(&identity("u2", UserRole::User), &report),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_role_does_not_imply_ownership() {
        let report = report_owned_by("u1");
        assert!(require_owner(&identity("a1", UserRole::Admin), &report).is_err());
    }
}
