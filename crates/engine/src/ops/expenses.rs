use chrono::{NaiveDate, Utc};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    CurrencyCode, EngineError, Expense, MemberRole, MoneyCents, ResultEngine, TopicStatus,
    balance::equal_split, expense_splits, expenses,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Records a shared expense paid by the caller.
    ///
    /// The caller must be the owner or a current member and the topic must
    /// be open. The currency is copied from the topic; an equal-split
    /// snapshot over the current members is stored alongside for audit (the
    /// balance engine never reads it). A topic with no members at all gets
    /// its owner membership backfilled first (tolerates an expense racing
    /// topic creation).
    pub async fn create_expense(
        &self,
        topic_id: &str,
        user_id: &str,
        description: &str,
        amount: MoneyCents,
        date: Option<NaiveDate>,
        notes: Option<&str>,
    ) -> ResultEngine<String> {
        let description = normalize_required_text(description, "description", 255)?;
        let notes = normalize_optional_text(notes);
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let topic = self.require_topic_read(&db_tx, topic_id, user_id).await?;
            if TopicStatus::try_from(topic.status.as_str())? == TopicStatus::Closed {
                return Err(EngineError::TopicClosed(
                    "cannot add expenses to a closed topic".to_string(),
                ));
            }

            // Backfill the owner membership if the topic somehow has no
            // members at all (e.g. an expense racing topic creation).
            let mut member_models = self.current_members_ordered(&db_tx, topic_id).await?;
            if member_models.is_empty() {
                self.ensure_member(&db_tx, topic_id, &topic.owner_user_id, MemberRole::Owner)
                    .await?;
                member_models = self.current_members_ordered(&db_tx, topic_id).await?;
            }

            let now = Utc::now();
            let expense = Expense::new(
                topic_id,
                user_id,
                description.clone(),
                amount,
                CurrencyCode::try_from(topic.currency.as_str())?,
                date.unwrap_or_else(|| now.date_naive()),
                notes.clone(),
                now,
            )?;
            let expense_id = expense.id.clone();
            let expense_model: expenses::ActiveModel = (&expense).into();
            expense_model.insert(&db_tx).await?;

            for (member, share) in member_models
                .iter()
                .zip(equal_split(amount, member_models.len()))
            {
                expense_splits::new_row(&expense_id, &member.id, share)
                    .insert(&db_tx)
                    .await?;
            }

            Ok(expense_id)
        })
    }

    /// All expenses of a topic, newest first, plus the topic status so
    /// clients can disable entry on closed topics (owner or member only).
    pub async fn list_expenses(
        &self,
        topic_id: &str,
        user_id: &str,
    ) -> ResultEngine<(Vec<Expense>, TopicStatus)> {
        with_tx!(self, |db_tx| {
            let topic = self.require_topic_read(&db_tx, topic_id, user_id).await?;

            let models = expenses::Entity::find()
                .filter(expenses::Column::TopicId.eq(topic_id.to_string()))
                .order_by_desc(expenses::Column::CreatedAt)
                .order_by_desc(expenses::Column::Id)
                .all(&db_tx)
                .await?;

            let mut expense_list = Vec::with_capacity(models.len());
            for model in models {
                expense_list.push(Expense::try_from(model)?);
            }
            Ok((expense_list, TopicStatus::try_from(topic.status.as_str())?))
        })
    }

    /// Deletes an expense and its split snapshot atomically.
    ///
    /// Allowed to the topic owner or the original payer, regardless of topic
    /// status. An expense belonging to a different topic is a not-found, not
    /// a forbidden.
    pub async fn delete_expense(
        &self,
        topic_id: &str,
        expense_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let topic = self
                .find_topic_by_id(&db_tx, topic_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("topic not exists".to_string()))?;

            let expense = expenses::Entity::find_by_id(expense_id.to_string())
                .filter(expenses::Column::TopicId.eq(topic_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;

            if topic.owner_user_id != user_id && expense.payer_user_id != user_id {
                return Err(EngineError::Forbidden(
                    "only the topic owner or the payer can delete this expense".to_string(),
                ));
            }

            expense_splits::Entity::delete_many()
                .filter(expense_splits::Column::ExpenseId.eq(expense.id.clone()))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_by_id(expense.id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
