use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use rand::RngCore;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};

use crate::{
    CurrencyCode, EngineError, Member, MemberRole, ResultEngine, Topic, TopicStatus, members,
    topics,
};

use super::{Engine, is_unique_violation_db, normalize_required_text, with_tx};

/// A topic together with its current member count, as shown in listings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicSummary {
    pub topic: Topic,
    pub member_count: u64,
}

/// Everything a member sees on the members screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembersOverview {
    pub members: Vec<Member>,
    pub invite_token: String,
    pub is_owner: bool,
    pub status: TopicStatus,
}

/// Opaque invite token: 32 random bytes, URL-safe base64 without padding.
fn generate_invite_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl Engine {
    /// Creates a topic and, atomically, its owner membership row.
    ///
    /// Returns `(topic_id, invite_token)`.
    pub async fn create_topic(
        &self,
        title: &str,
        currency: &str,
        user_id: &str,
    ) -> ResultEngine<(String, String)> {
        let title = normalize_required_text(title, "title", 255)?;
        let currency = CurrencyCode::try_from(currency)?;

        let now = Utc::now();
        let topic = Topic::new(user_id, title, currency, generate_invite_token(), now);
        let topic_id = topic.id.clone();
        let invite_token = topic.invite_token.clone();
        let topic_model: topics::ActiveModel = (&topic).into();
        let owner = Member::new(&topic_id, user_id, user_id, MemberRole::Owner, now);
        let owner_model: members::ActiveModel = (&owner).into();

        with_tx!(self, |db_tx| {
            topic_model.insert(&db_tx).await?;
            owner_model.insert(&db_tx).await?;
            Ok((topic_id, invite_token))
        })
    }

    /// Lists topics the user owns or is a member of, newest first, with
    /// member counts.
    pub async fn list_topics(&self, user_id: &str) -> ResultEngine<Vec<TopicSummary>> {
        with_tx!(self, |db_tx| {
            let membership_rows = members::Entity::find()
                .filter(members::Column::UserId.eq(Some(user_id.to_string())))
                .all(&db_tx)
                .await?;
            let member_topic_ids: Vec<String> = membership_rows
                .into_iter()
                .map(|row| row.topic_id)
                .collect();

            let topic_models = topics::Entity::find()
                .filter(
                    Condition::any()
                        .add(topics::Column::OwnerUserId.eq(user_id.to_string()))
                        .add(topics::Column::Id.is_in(member_topic_ids)),
                )
                .order_by_desc(topics::Column::CreatedAt)
                .order_by_desc(topics::Column::Id)
                .all(&db_tx)
                .await?;

            let mut summaries = Vec::with_capacity(topic_models.len());
            for model in topic_models {
                let member_count = members::Entity::find()
                    .filter(members::Column::TopicId.eq(model.id.clone()))
                    .count(&db_tx)
                    .await?;
                summaries.push(TopicSummary {
                    topic: Topic::try_from(model)?,
                    member_count,
                });
            }
            Ok(summaries)
        })
    }

    /// Replaces the invite token (owner-only). Old links stop working
    /// immediately.
    pub async fn rotate_invite(&self, topic_id: &str, user_id: &str) -> ResultEngine<String> {
        with_tx!(self, |db_tx| {
            self.require_topic_owner(&db_tx, topic_id, user_id).await?;

            let token = generate_invite_token();
            let model = topics::ActiveModel {
                id: ActiveValue::Set(topic_id.to_string()),
                invite_token: ActiveValue::Set(token.clone()),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(token)
        })
    }

    /// Opens or closes a topic (owner-only). Setting the current status is a
    /// no-op, not an error.
    pub async fn set_topic_status(
        &self,
        topic_id: &str,
        status: TopicStatus,
        user_id: &str,
    ) -> ResultEngine<TopicStatus> {
        with_tx!(self, |db_tx| {
            let topic = self.require_topic_owner(&db_tx, topic_id, user_id).await?;
            if topic.status != status.as_str() {
                let model = topics::ActiveModel {
                    id: ActiveValue::Set(topic_id.to_string()),
                    status: ActiveValue::Set(status.as_str().to_string()),
                    ..Default::default()
                };
                model.update(&db_tx).await?;
            }
            Ok(status)
        })
    }

    /// Redeems an invite token. Idempotent: joining twice with the same user
    /// leaves exactly one membership row.
    pub async fn join_by_token(&self, token: &str, user_id: &str) -> ResultEngine<String> {
        with_tx!(self, |db_tx| {
            let topic = topics::Entity::find()
                .filter(topics::Column::InviteToken.eq(token.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("invite not exists".to_string()))?;

            self.ensure_member(&db_tx, &topic.id, user_id, MemberRole::Member)
                .await?;
            Ok(topic.id)
        })
    }

    /// Removes the caller's membership row. Past expenses and splits are
    /// untouched; balances stop counting the member at the next
    /// recomputation.
    pub async fn leave_topic(&self, topic_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.find_topic_by_id(&db_tx, topic_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("topic not exists".to_string()))?;

            members::Entity::delete_many()
                .filter(members::Column::TopicId.eq(topic_id.to_string()))
                .filter(members::Column::UserId.eq(Some(user_id.to_string())))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Members in stable order plus the invite token, caller's owner flag
    /// and the topic status (owner or member only).
    pub async fn list_members(&self, topic_id: &str, user_id: &str) -> ResultEngine<MembersOverview> {
        with_tx!(self, |db_tx| {
            let topic = self.require_topic_read(&db_tx, topic_id, user_id).await?;

            let member_models = self.current_members_ordered(&db_tx, topic_id).await?;
            let mut member_list = Vec::with_capacity(member_models.len());
            for model in member_models {
                member_list.push(Member::try_from(model)?);
            }

            Ok(MembersOverview {
                members: member_list,
                invite_token: topic.invite_token.clone(),
                is_owner: topic.owner_user_id == user_id,
                status: TopicStatus::try_from(topic.status.as_str())?,
            })
        })
    }

    /// Inserts the (topic, user) membership row if absent.
    ///
    /// Safe to race: the existence check covers the common path, and a
    /// duplicate-key conflict from a concurrent insert is treated as the row
    /// already existing.
    pub(super) async fn ensure_member(
        &self,
        db: &DatabaseTransaction,
        topic_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> ResultEngine<()> {
        if self.is_topic_member(db, topic_id, user_id).await? {
            return Ok(());
        }

        let member = Member::new(topic_id, user_id, user_id, role, Utc::now());
        let model: members::ActiveModel = (&member).into();
        match model.insert(db).await {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation_db(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
