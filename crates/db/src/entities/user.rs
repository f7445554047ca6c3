//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    #[default]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name
    pub name: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash. NULL for identity-provider-only accounts.
    #[sea_orm(nullable)]
    pub password_hash: Option<String>,

    /// Opaque API token presented as a Bearer credential
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    pub role: UserRole,

    /// Reward point balance. Only ever incremented, by report approval.
    #[sea_orm(default_value = 0)]
    pub points: i32,

    /// Profile image URL
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Pending password-reset token
    #[sea_orm(nullable)]
    pub reset_token: Option<String>,

    /// Expiry of the pending password-reset token
    #[sea_orm(nullable)]
    pub reset_token_expires_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::waste_report::Entity")]
    WasteReports,
}

impl Related<super::waste_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WasteReports.def()
    }
}

impl Model {
    /// Whether this account carries the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl ActiveModelBehavior for ActiveModel {}
