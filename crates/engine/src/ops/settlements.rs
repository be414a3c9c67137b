use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, MoneyCents, ResultEngine, Settlement, members, settlements,
};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Records a settlement payment between two members (owner or member
    /// only).
    ///
    /// Pure audit log: recorded settlements are not read by the balance
    /// engine. Both member rows must belong to the topic and differ.
    pub async fn record_settlement(
        &self,
        topic_id: &str,
        user_id: &str,
        from_member_id: &str,
        to_member_id: &str,
        amount: MoneyCents,
        note: Option<&str>,
    ) -> ResultEngine<String> {
        if from_member_id == to_member_id {
            return Err(EngineError::InvalidInput(
                "from and to member must differ".to_string(),
            ));
        }
        let note = normalize_optional_text(note);

        with_tx!(self, |db_tx| {
            self.require_topic_read(&db_tx, topic_id, user_id).await?;
            self.require_member_in_topic(&db_tx, topic_id, from_member_id)
                .await?;
            self.require_member_in_topic(&db_tx, topic_id, to_member_id)
                .await?;

            let settlement = Settlement::new(
                topic_id,
                from_member_id,
                to_member_id,
                amount,
                note.clone(),
                Utc::now(),
            )?;
            let settlement_id = settlement.id.clone();
            let model: settlements::ActiveModel = (&settlement).into();
            model.insert(&db_tx).await?;
            Ok(settlement_id)
        })
    }

    /// Recorded settlements for a topic, newest first (owner or member
    /// only).
    pub async fn list_settlements(
        &self,
        topic_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<Settlement>> {
        with_tx!(self, |db_tx| {
            self.require_topic_read(&db_tx, topic_id, user_id).await?;

            let models = settlements::Entity::find()
                .filter(settlements::Column::TopicId.eq(topic_id.to_string()))
                .order_by_desc(settlements::Column::SettledAt)
                .order_by_desc(settlements::Column::Id)
                .all(&db_tx)
                .await?;

            Ok(models.into_iter().map(Settlement::from).collect())
        })
    }

    async fn require_member_in_topic(
        &self,
        db: &sea_orm::DatabaseTransaction,
        topic_id: &str,
        member_id: &str,
    ) -> ResultEngine<()> {
        members::Entity::find_by_id(member_id.to_string())
            .filter(members::Column::TopicId.eq(topic_id.to_string()))
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))
    }
}
