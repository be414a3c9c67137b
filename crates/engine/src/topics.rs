//! A `Topic` is a shared-expense group (a trip, a flat, a dinner club) with
//! exactly one owner and any number of members.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{CurrencyCode, EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopicStatus {
    Open,
    Closed,
}

impl TopicStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl TryFrom<&str> for TopicStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(EngineError::InvalidInput(format!(
                "invalid topic status: {other}"
            ))),
        }
    }
}

/// Shared-expense group.
///
/// The owner is set at creation and never changes; status gates expense
/// creation only (a closed topic still answers membership and balance
/// queries).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub owner_user_id: String,
    pub title: String,
    pub currency: CurrencyCode,
    pub invite_token: String,
    pub status: TopicStatus,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(
        owner_user_id: &str,
        title: String,
        currency: CurrencyCode,
        invite_token: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_user_id: owner_user_id.to_string(),
            title,
            currency,
            invite_token,
            status: TopicStatus::Open,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "topics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_user_id: String,
    pub title: String,
    pub currency: String,
    pub invite_token: String,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::members::Entity")]
    Members,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
    #[sea_orm(has_many = "super::join_requests::Entity")]
    JoinRequests,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::join_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JoinRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Topic> for ActiveModel {
    fn from(topic: &Topic) -> Self {
        Self {
            id: ActiveValue::Set(topic.id.clone()),
            owner_user_id: ActiveValue::Set(topic.owner_user_id.clone()),
            title: ActiveValue::Set(topic.title.clone()),
            currency: ActiveValue::Set(topic.currency.as_str().to_string()),
            invite_token: ActiveValue::Set(topic.invite_token.clone()),
            status: ActiveValue::Set(topic.status.as_str().to_string()),
            created_at: ActiveValue::Set(topic.created_at),
        }
    }
}

impl TryFrom<Model> for Topic {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            owner_user_id: model.owner_user_id,
            title: model.title,
            currency: CurrencyCode::try_from(model.currency.as_str())?,
            invite_token: model.invite_token,
            status: TopicStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}
