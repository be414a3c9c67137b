//! A `Member` is a user's participation record within a topic.
//!
//! `user_id` is nullable in storage (reserved for guest members), which is
//! why (topic, user) uniqueness is enforced by the engine rather than by a
//! database constraint.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "member" => Ok(Self::Member),
            other => Err(EngineError::InvalidInput(format!(
                "invalid member role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub topic_id: String,
    pub user_id: Option<String>,
    pub display_name: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        topic_id: &str,
        user_id: &str,
        display_name: &str,
        role: MemberRole,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic_id: topic_id.to_string(),
            user_id: Some(user_id.to_string()),
            display_name: display_name.to_string(),
            role,
            joined_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "topic_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub topic_id: String,
    pub user_id: Option<String>,
    pub display_name: String,
    pub role: String,
    pub joined_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::topics::Entity",
        from = "Column::TopicId",
        to = "super::topics::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Topics,
}

impl Related<super::topics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Member> for ActiveModel {
    fn from(member: &Member) -> Self {
        Self {
            id: ActiveValue::Set(member.id.clone()),
            topic_id: ActiveValue::Set(member.topic_id.clone()),
            user_id: ActiveValue::Set(member.user_id.clone()),
            display_name: ActiveValue::Set(member.display_name.clone()),
            role: ActiveValue::Set(member.role.as_str().to_string()),
            joined_at: ActiveValue::Set(member.joined_at),
        }
    }
}

impl TryFrom<Model> for Member {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            topic_id: model.topic_id,
            user_id: model.user_id,
            display_name: model.display_name,
            role: MemberRole::try_from(model.role.as_str())?,
            joined_at: model.joined_at,
        })
    }
}
