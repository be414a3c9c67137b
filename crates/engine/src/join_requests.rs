//! Join-request rows and their three-state lifecycle.
//!
//! The storage layer keeps a unique index on (topic_id, requester_user_id,
//! status). That index is deliberately used as a concurrency guard: two
//! writers racing to record the same decision cannot both commit, and the
//! loser converges instead of failing (see `ops::join_requests`).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinRequestStatus {
    Pending,
    Approved,
    Denied,
}

impl JoinRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }
}

impl TryFrom<&str> for JoinRequestStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "denied" => Ok(Self::Denied),
            other => Err(EngineError::InvalidInput(format!(
                "invalid join request status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinRequest {
    pub id: String,
    pub topic_id: String,
    pub requester_user_id: String,
    pub status: JoinRequestStatus,
    pub message: Option<String>,
    pub decided_by_user_id: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl JoinRequest {
    pub fn new(
        topic_id: &str,
        requester_user_id: &str,
        message: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic_id: topic_id.to_string(),
            requester_user_id: requester_user_id.to_string(),
            status: JoinRequestStatus::Pending,
            message,
            decided_by_user_id: None,
            decided_at: None,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "join_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub topic_id: String,
    pub requester_user_id: String,
    pub status: String,
    pub message: Option<String>,
    pub decided_by_user_id: Option<String>,
    pub decided_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
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

impl From<&JoinRequest> for ActiveModel {
    fn from(request: &JoinRequest) -> Self {
        Self {
            id: ActiveValue::Set(request.id.clone()),
            topic_id: ActiveValue::Set(request.topic_id.clone()),
            requester_user_id: ActiveValue::Set(request.requester_user_id.clone()),
            status: ActiveValue::Set(request.status.as_str().to_string()),
            message: ActiveValue::Set(request.message.clone()),
            decided_by_user_id: ActiveValue::Set(request.decided_by_user_id.clone()),
            decided_at: ActiveValue::Set(request.decided_at),
            created_at: ActiveValue::Set(request.created_at),
        }
    }
}

impl TryFrom<Model> for JoinRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            topic_id: model.topic_id,
            requester_user_id: model.requester_user_id,
            status: JoinRequestStatus::try_from(model.status.as_str())?,
            message: model.message,
            decided_by_user_id: model.decided_by_user_id,
            decided_at: model.decided_at,
            created_at: model.created_at,
        })
    }
}
