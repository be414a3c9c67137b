//! Shared-expense records: who paid, how much, when.
//!
//! Expenses are append-only (created and deleted, never edited). The payer
//! is a user identity rather than a member row, so responsibility survives a
//! later membership change. The currency is copied from the topic at
//! creation time and kept verbatim afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{CurrencyCode, EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: String,
    pub topic_id: String,
    pub payer_user_id: String,
    pub description: String,
    pub amount: MoneyCents,
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        topic_id: &str,
        payer_user_id: &str,
        description: String,
        amount: MoneyCents,
        currency: CurrencyCode,
        date: NaiveDate,
        notes: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            topic_id: topic_id.to_string(),
            payer_user_id: payer_user_id.to_string(),
            description,
            amount,
            currency,
            date,
            notes,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub topic_id: String,
    pub payer_user_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub currency: String,
    pub date: Date,
    pub notes: Option<String>,
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
    #[sea_orm(has_many = "super::expense_splits::Entity")]
    ExpenseSplits,
}

impl Related<super::topics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topics.def()
    }
}

impl Related<super::expense_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseSplits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.clone()),
            topic_id: ActiveValue::Set(expense.topic_id.clone()),
            payer_user_id: ActiveValue::Set(expense.payer_user_id.clone()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount.cents()),
            currency: ActiveValue::Set(expense.currency.as_str().to_string()),
            date: ActiveValue::Set(expense.date),
            notes: ActiveValue::Set(expense.notes.clone()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            topic_id: model.topic_id,
            payer_user_id: model.payer_user_id,
            description: model.description,
            amount: MoneyCents::new(model.amount_minor),
            currency: CurrencyCode::try_from(model.currency.as_str())?,
            date: model.date,
            notes: model.notes,
            created_at: model.created_at,
        })
    }
}
