//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    /// Bearer token used for API access
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Site administrator (holds every capability)
    #[sea_orm(default_value = false)]
    pub is_admin: bool,

    #[sea_orm(default_value = false)]
    pub is_suspended: bool,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// Display name, "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_enrolment::Entity")]
    UserEnrolment,
    #[sea_orm(has_many = "super::role_assignment::Entity")]
    RoleAssignment,
}

impl Related<super::user_enrolment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserEnrolment.def()
    }
}

impl Related<super::role_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleAssignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
