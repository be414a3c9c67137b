//! The join-request state machine.
//!
//! States: pending → approved | denied, with approved/denied as idempotent
//! targets. The storage unique index on (topic, requester, status) means two
//! writers racing to record the same decision cannot both commit; the loser
//! detects the duplicate-key signal and converges to the winner's outcome
//! instead of surfacing an error. Every operation here is safe to retry and
//! safe to race.

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, JoinRequest, JoinRequestStatus, MemberRole, ResultEngine, join_requests,
};

use super::{Engine, is_unique_violation, normalize_optional_text, with_tx};

/// Result of asking to join a topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinRequestOutcome {
    /// The requester already has a membership row; no request was created.
    AlreadyMember,
    /// A pending request exists (newly created or found); the owner decides.
    Pending { request_id: String },
}

impl Engine {
    /// Creates a join request for `user_id`, idempotently.
    ///
    /// Members get `AlreadyMember`; an existing pending request is returned
    /// instead of duplicated — including when a concurrent create wins the
    /// insert race.
    pub async fn create_join_request(
        &self,
        topic_id: &str,
        user_id: &str,
        message: Option<&str>,
    ) -> ResultEngine<JoinRequestOutcome> {
        let message = normalize_optional_text(message);
        if let Some(text) = &message
            && text.chars().count() > 500
        {
            return Err(EngineError::InvalidInput(
                "message must not exceed 500 characters".to_string(),
            ));
        }

        let attempt = with_tx!(self, |db_tx| {
            self.find_topic_by_id(&db_tx, topic_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("topic not exists".to_string()))?;

            let outcome = if self.is_topic_member(&db_tx, topic_id, user_id).await? {
                JoinRequestOutcome::AlreadyMember
            } else if let Some(existing) = self.find_pending(&db_tx, topic_id, user_id).await? {
                JoinRequestOutcome::Pending {
                    request_id: existing.id,
                }
            } else {
                let request = JoinRequest::new(topic_id, user_id, message.clone(), Utc::now());
                let request_id = request.id.clone();
                let model: join_requests::ActiveModel = (&request).into();
                model.insert(&db_tx).await?;
                JoinRequestOutcome::Pending { request_id }
            };
            Ok(outcome)
        });

        match attempt {
            Err(err) if is_unique_violation(&err) => {
                // A concurrent create inserted the pending row first; report
                // that one.
                with_tx!(self, |db_tx| {
                    match self.find_pending(&db_tx, topic_id, user_id).await? {
                        Some(existing) => Ok(JoinRequestOutcome::Pending {
                            request_id: existing.id,
                        }),
                        None => Err(err),
                    }
                })
            }
            other => other,
        }
    }

    /// All join requests for a topic with their decision metadata,
    /// newest-first (owner-only).
    pub async fn list_join_requests(
        &self,
        topic_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<JoinRequest>> {
        with_tx!(self, |db_tx| {
            self.require_topic_owner(&db_tx, topic_id, user_id).await?;

            let models = join_requests::Entity::find()
                .filter(join_requests::Column::TopicId.eq(topic_id.to_string()))
                .order_by_desc(join_requests::Column::CreatedAt)
                .order_by_desc(join_requests::Column::Id)
                .all(&db_tx)
                .await?;

            let mut requests = Vec::with_capacity(models.len());
            for model in models {
                requests.push(JoinRequest::try_from(model)?);
            }
            Ok(requests)
        })
    }

    /// Approves a join request (owner-only).
    ///
    /// Idempotent: an already-approved request ensures membership and
    /// reports `Approved` again; an already-denied one reports `Denied`
    /// without flipping. A duplicate-key conflict from a concurrent decision
    /// converges: the requester is a member either way, the redundant row is
    /// discarded, and the caller sees `Approved`.
    pub async fn approve_join_request(
        &self,
        topic_id: &str,
        request_id: &str,
        user_id: &str,
    ) -> ResultEngine<JoinRequestStatus> {
        let attempt = self.try_approve(topic_id, request_id, user_id).await;
        match attempt {
            Err(err) if is_unique_violation(&err) => {
                self.converge_approved(topic_id, request_id, user_id).await
            }
            other => other,
        }
    }

    /// Denies a join request (owner-only).
    ///
    /// Idempotent, and an approval always wins: denying an approved request
    /// reports `Approved` and changes nothing.
    pub async fn deny_join_request(
        &self,
        topic_id: &str,
        request_id: &str,
        user_id: &str,
    ) -> ResultEngine<JoinRequestStatus> {
        let attempt = self.try_deny(topic_id, request_id, user_id).await;
        match attempt {
            Err(err) if is_unique_violation(&err) => {
                self.converge_denied(topic_id, request_id, user_id).await
            }
            other => other,
        }
    }

    async fn try_approve(
        &self,
        topic_id: &str,
        request_id: &str,
        user_id: &str,
    ) -> ResultEngine<JoinRequestStatus> {
        with_tx!(self, |db_tx| {
            self.require_topic_owner(&db_tx, topic_id, user_id).await?;
            let request = self.require_request(&db_tx, topic_id, request_id).await?;

            match JoinRequestStatus::try_from(request.status.as_str())? {
                JoinRequestStatus::Approved => {
                    self.ensure_member(
                        &db_tx,
                        topic_id,
                        &request.requester_user_id,
                        MemberRole::Member,
                    )
                    .await?;
                    Ok(JoinRequestStatus::Approved)
                }
                JoinRequestStatus::Denied => Ok(JoinRequestStatus::Denied),
                JoinRequestStatus::Pending => {
                    self.ensure_member(
                        &db_tx,
                        topic_id,
                        &request.requester_user_id,
                        MemberRole::Member,
                    )
                    .await?;

                    let stale = self
                        .sibling_with_status(&db_tx, &request, JoinRequestStatus::Approved)
                        .await?;
                    if stale {
                        // A previously approved request for the same
                        // requester makes this pending row redundant: keep
                        // the membership, drop the row.
                        join_requests::Entity::delete_by_id(request.id)
                            .exec(&db_tx)
                            .await?;
                    } else {
                        // One decision per requester: any other pending
                        // request is denied as part of this approval.
                        let now = Utc::now();
                        join_requests::Entity::update_many()
                            .col_expr(
                                join_requests::Column::Status,
                                Expr::value(JoinRequestStatus::Denied.as_str()),
                            )
                            .col_expr(
                                join_requests::Column::DecidedByUserId,
                                Expr::value(Some(user_id.to_string())),
                            )
                            .col_expr(join_requests::Column::DecidedAt, Expr::value(Some(now)))
                            .filter(join_requests::Column::TopicId.eq(topic_id.to_string()))
                            .filter(
                                join_requests::Column::RequesterUserId
                                    .eq(request.requester_user_id.clone()),
                            )
                            .filter(
                                join_requests::Column::Status
                                    .eq(JoinRequestStatus::Pending.as_str()),
                            )
                            .filter(join_requests::Column::Id.ne(request.id.clone()))
                            .exec(&db_tx)
                            .await?;

                        let model = join_requests::ActiveModel {
                            id: ActiveValue::Set(request.id),
                            status: ActiveValue::Set(
                                JoinRequestStatus::Approved.as_str().to_string(),
                            ),
                            decided_by_user_id: ActiveValue::Set(Some(user_id.to_string())),
                            decided_at: ActiveValue::Set(Some(now)),
                            ..Default::default()
                        };
                        model.update(&db_tx).await?;
                    }
                    Ok(JoinRequestStatus::Approved)
                }
            }
        })
    }

    /// Recovery path after losing an approval race: the requester is a
    /// member either way, so ensure the membership, drop this row if it did
    /// not end up approved, and report success.
    async fn converge_approved(
        &self,
        topic_id: &str,
        request_id: &str,
        user_id: &str,
    ) -> ResultEngine<JoinRequestStatus> {
        with_tx!(self, |db_tx| {
            self.require_topic_owner(&db_tx, topic_id, user_id).await?;

            let request = join_requests::Entity::find_by_id(request_id.to_string())
                .filter(join_requests::Column::TopicId.eq(topic_id.to_string()))
                .one(&db_tx)
                .await?;

            // A missing row means the winner already cleaned it up.
            if let Some(request) = request {
                self.ensure_member(
                    &db_tx,
                    topic_id,
                    &request.requester_user_id,
                    MemberRole::Member,
                )
                .await?;
                if JoinRequestStatus::try_from(request.status.as_str())?
                    != JoinRequestStatus::Approved
                {
                    join_requests::Entity::delete_by_id(request.id)
                        .exec(&db_tx)
                        .await?;
                }
            }
            Ok(JoinRequestStatus::Approved)
        })
    }

    async fn try_deny(
        &self,
        topic_id: &str,
        request_id: &str,
        user_id: &str,
    ) -> ResultEngine<JoinRequestStatus> {
        with_tx!(self, |db_tx| {
            self.require_topic_owner(&db_tx, topic_id, user_id).await?;
            let request = self.require_request(&db_tx, topic_id, request_id).await?;

            match JoinRequestStatus::try_from(request.status.as_str())? {
                JoinRequestStatus::Denied => Ok(JoinRequestStatus::Denied),
                JoinRequestStatus::Approved => Ok(JoinRequestStatus::Approved),
                JoinRequestStatus::Pending => {
                    let collides = self
                        .sibling_with_status(&db_tx, &request, JoinRequestStatus::Denied)
                        .await?;
                    if collides {
                        // A denied row for the same requester already
                        // exists: this one would collide, so it is dropped.
                        join_requests::Entity::delete_by_id(request.id)
                            .exec(&db_tx)
                            .await?;
                    } else {
                        let model = join_requests::ActiveModel {
                            id: ActiveValue::Set(request.id),
                            status: ActiveValue::Set(
                                JoinRequestStatus::Denied.as_str().to_string(),
                            ),
                            decided_by_user_id: ActiveValue::Set(Some(user_id.to_string())),
                            decided_at: ActiveValue::Set(Some(Utc::now())),
                            ..Default::default()
                        };
                        model.update(&db_tx).await?;
                    }
                    Ok(JoinRequestStatus::Denied)
                }
            }
        })
    }

    /// Recovery path after losing a denial race: a denied row for the same
    /// requester committed first, so this one is dropped.
    async fn converge_denied(
        &self,
        topic_id: &str,
        request_id: &str,
        user_id: &str,
    ) -> ResultEngine<JoinRequestStatus> {
        with_tx!(self, |db_tx| {
            self.require_topic_owner(&db_tx, topic_id, user_id).await?;

            let request = join_requests::Entity::find_by_id(request_id.to_string())
                .filter(join_requests::Column::TopicId.eq(topic_id.to_string()))
                .one(&db_tx)
                .await?;

            if let Some(request) = request
                && JoinRequestStatus::try_from(request.status.as_str())?
                    != JoinRequestStatus::Denied
            {
                join_requests::Entity::delete_by_id(request.id)
                    .exec(&db_tx)
                    .await?;
            }
            Ok(JoinRequestStatus::Denied)
        })
    }

    async fn require_request(
        &self,
        db: &DatabaseTransaction,
        topic_id: &str,
        request_id: &str,
    ) -> ResultEngine<join_requests::Model> {
        join_requests::Entity::find_by_id(request_id.to_string())
            .filter(join_requests::Column::TopicId.eq(topic_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("join request not exists".to_string()))
    }

    async fn find_pending(
        &self,
        db: &DatabaseTransaction,
        topic_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<join_requests::Model>> {
        join_requests::Entity::find()
            .filter(join_requests::Column::TopicId.eq(topic_id.to_string()))
            .filter(join_requests::Column::RequesterUserId.eq(user_id.to_string()))
            .filter(join_requests::Column::Status.eq(JoinRequestStatus::Pending.as_str()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    async fn sibling_with_status(
        &self,
        db: &DatabaseTransaction,
        request: &join_requests::Model,
        status: JoinRequestStatus,
    ) -> ResultEngine<bool> {
        join_requests::Entity::find()
            .filter(join_requests::Column::TopicId.eq(request.topic_id.clone()))
            .filter(join_requests::Column::RequesterUserId.eq(request.requester_user_id.clone()))
            .filter(join_requests::Column::Status.eq(status.as_str()))
            .filter(join_requests::Column::Id.ne(request.id.clone()))
            .one(db)
            .await
            .map(|row| row.is_some())
            .map_err(Into::into)
    }
}
