//! User enrolment entity (join of user and enrolment instance).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Participation status of an enrolment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EnrolmentStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_enrolment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(indexed)]
    pub enrol_id: String,

    pub status: EnrolmentStatus,

    pub time_start: DateTimeUtc,

    #[sea_orm(nullable)]
    pub time_end: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::enrol_instance::Entity",
        from = "Column::EnrolId",
        to = "super::enrol_instance::Column::Id",
        on_delete = "Cascade"
    )]
    EnrolInstance,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::enrol_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnrolInstance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
