use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};

use crate::{EngineError, ResultEngine, members, topics};

use super::Engine;

impl Engine {
    pub(super) async fn find_topic_by_id(
        &self,
        db: &DatabaseTransaction,
        topic_id: &str,
    ) -> ResultEngine<Option<topics::Model>> {
        topics::Entity::find_by_id(topic_id.to_string())
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn is_topic_member(
        &self,
        db: &DatabaseTransaction,
        topic_id: &str,
        user_id: &str,
    ) -> ResultEngine<bool> {
        members::Entity::find()
            .filter(members::Column::TopicId.eq(topic_id.to_string()))
            .filter(members::Column::UserId.eq(Some(user_id.to_string())))
            .one(db)
            .await
            .map(|row| row.is_some())
            .map_err(Into::into)
    }

    /// Owner-only access: topic settings, join-request decisions.
    pub(super) async fn require_topic_owner(
        &self,
        db: &DatabaseTransaction,
        topic_id: &str,
        user_id: &str,
    ) -> ResultEngine<topics::Model> {
        let model = self
            .find_topic_by_id(db, topic_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("topic not exists".to_string()))?;
        if model.owner_user_id != user_id {
            return Err(EngineError::Forbidden(
                "only the topic owner can do this".to_string(),
            ));
        }
        Ok(model)
    }

    /// Read access: the caller must be the owner or a current member.
    pub(super) async fn require_topic_read(
        &self,
        db: &DatabaseTransaction,
        topic_id: &str,
        user_id: &str,
    ) -> ResultEngine<topics::Model> {
        let model = self
            .find_topic_by_id(db, topic_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("topic not exists".to_string()))?;
        if model.owner_user_id != user_id && !self.is_topic_member(db, topic_id, user_id).await? {
            return Err(EngineError::Forbidden(
                "not part of this topic".to_string(),
            ));
        }
        Ok(model)
    }

    /// Current members in the stable order shared by the split snapshot and
    /// the balance engine: ascending joined-at, id as tie-break.
    pub(super) async fn current_members_ordered(
        &self,
        db: &DatabaseTransaction,
        topic_id: &str,
    ) -> ResultEngine<Vec<members::Model>> {
        members::Entity::find()
            .filter(members::Column::TopicId.eq(topic_id.to_string()))
            .order_by_asc(members::Column::JoinedAt)
            .order_by_asc(members::Column::Id)
            .all(db)
            .await
            .map_err(Into::into)
    }
}
