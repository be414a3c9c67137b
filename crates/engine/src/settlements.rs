//! Recorded settlement payments between two members of a topic.
//!
//! An audit log of money actually handed over, next to the *suggested*
//! transfers the balance engine produces. Recorded settlements do not feed
//! balance computation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub id: String,
    pub topic_id: String,
    pub from_member_id: String,
    pub to_member_id: String,
    pub amount: MoneyCents,
    pub note: Option<String>,
    pub settled_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(
        topic_id: &str,
        from_member_id: &str,
        to_member_id: &str,
        amount: MoneyCents,
        note: Option<String>,
        settled_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            topic_id: topic_id.to_string(),
            from_member_id: from_member_id.to_string(),
            to_member_id: to_member_id.to_string(),
            amount,
            note,
            settled_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub topic_id: String,
    pub from_member_id: String,
    pub to_member_id: String,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub settled_at: DateTimeUtc,
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

impl From<&Settlement> for ActiveModel {
    fn from(settlement: &Settlement) -> Self {
        Self {
            id: ActiveValue::Set(settlement.id.clone()),
            topic_id: ActiveValue::Set(settlement.topic_id.clone()),
            from_member_id: ActiveValue::Set(settlement.from_member_id.clone()),
            to_member_id: ActiveValue::Set(settlement.to_member_id.clone()),
            amount_minor: ActiveValue::Set(settlement.amount.cents()),
            note: ActiveValue::Set(settlement.note.clone()),
            settled_at: ActiveValue::Set(settlement.settled_at),
        }
    }
}

impl From<Model> for Settlement {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            topic_id: model.topic_id,
            from_member_id: model.from_member_id,
            to_member_id: model.to_member_id,
            amount: MoneyCents::new(model.amount_minor),
            note: model.note,
            settled_at: model.settled_at,
        }
    }
}
