//! Course entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub short_name: String,

    pub full_name: String,

    /// Hidden courses are only visible to staff of the course
    #[sea_orm(default_value = true)]
    pub visible: bool,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::enrol_instance::Entity")]
    EnrolInstance,
    #[sea_orm(has_many = "super::course_group::Entity")]
    CourseGroup,
}

impl Related<super::enrol_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnrolInstance.def()
    }
}

impl Related<super::course_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
