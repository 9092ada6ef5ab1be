//! Enrolment instance entity (one enrolment method attached to one course).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Instance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    #[sea_orm(string_value = "enabled")]
    Enabled,
    #[sea_orm(string_value = "disabled")]
    Disabled,
}

impl InstanceStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrol_instance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub course_id: String,

    /// Method tag, e.g. "self" or "manual"
    pub method: String,

    /// Custom instance name; the method supplies a default when unset
    #[sea_orm(nullable)]
    pub name: Option<String>,

    pub status: InstanceStatus,

    /// Enrolment key. Empty or NULL accepts any key.
    #[sea_orm(nullable)]
    pub password: Option<String>,

    /// Validate the supplied key against the course's group keys
    #[sea_orm(default_value = false)]
    pub use_group_key: bool,

    /// Reveal the first character of the key after a wrong attempt.
    /// NULL follows the method-level setting.
    #[sea_orm(nullable)]
    pub show_hint: Option<bool>,

    #[sea_orm(nullable)]
    pub enrol_start: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub enrol_end: Option<DateTimeUtc>,

    /// 0 = unlimited
    #[sea_orm(default_value = 0)]
    pub max_enrolled: i32,

    #[sea_orm(default_value = true)]
    pub allow_new_enrols: bool,

    #[sea_orm(default_value = 0)]
    pub sort_order: i32,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// Whether a key must be supplied to enrol through this instance.
    #[must_use]
    pub fn requires_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status == InstanceStatus::Enabled
    }

    /// Instance hint flag, falling back to `default` when unset.
    #[must_use]
    pub fn show_hint_or(&self, default: bool) -> bool {
        self.show_hint.unwrap_or(default)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(has_many = "super::user_enrolment::Entity")]
    UserEnrolment,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::user_enrolment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserEnrolment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
