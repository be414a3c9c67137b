use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub mod topic {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TopicStatus {
        Open,
        Closed,
    }

    /// Request body for creating a topic.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopicNew {
        pub title: String,
        /// 3-letter currency code, e.g. `EUR`.
        pub currency: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopicCreated {
        pub topic_id: String,
        pub invite_token: String,
    }

    /// One row in the caller's topic listing.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopicView {
        pub id: String,
        pub title: String,
        pub currency: String,
        pub status: TopicStatus,
        pub members: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopicsResponse {
        pub topics: Vec<TopicView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InviteTokenResponse {
        pub invite_token: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopicJoined {
        pub topic_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StatusResponse {
        pub topic_id: String,
        pub status: TopicStatus,
    }
}

pub mod membership {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MemberRole {
        Owner,
        Member,
    }

    /// A member with their role and join time.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: String,
        pub user_id: Option<String>,
        pub display_name: String,
        pub role: MemberRole,
        pub joined_at: DateTime<Utc>,
    }

    /// Response body for listing members.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
        pub invite_token: String,
        pub is_owner: bool,
        pub status: super::topic::TopicStatus,
    }
}

pub mod join_request {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum JoinRequestStatus {
        Pending,
        Approved,
        Denied,
    }

    /// Request body for asking to join a topic.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinRequestNew {
        pub message: Option<String>,
    }

    /// Outcome of a join-request creation: `already_member` carries no
    /// request id.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinRequestCreated {
        pub request_id: Option<String>,
        pub status: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinRequestView {
        pub id: String,
        pub requester_user_id: String,
        pub status: JoinRequestStatus,
        pub message: Option<String>,
        pub decided_by_user_id: Option<String>,
        pub decided_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinRequestsResponse {
        pub requests: Vec<JoinRequestView>,
    }

    /// Outcome of an approve/deny call.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinRequestDecision {
        pub status: JoinRequestStatus,
    }
}

pub mod expense {
    use super::*;

    /// Request body for recording a shared expense.
    ///
    /// The amount is a decimal string (`"12.34"`); the server converts to
    /// integer cents at the boundary.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub description: String,
        pub amount: String,
        pub date: Option<NaiveDate>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub expense_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: String,
        pub description: String,
        /// 2-decimal string, e.g. `"12.34"`.
        pub amount: String,
        pub currency: String,
        pub payer_user_id: String,
        pub date: NaiveDate,
        pub notes: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpensesResponse {
        pub expenses: Vec<ExpenseView>,
        /// Topic status, so clients can disable entry on closed topics.
        pub status: super::topic::TopicStatus,
    }
}

pub mod balance {
    use super::*;

    /// A member's net position: positive = owed by the group, negative =
    /// owes the group.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub member_id: String,
        pub display_name: String,
        /// 2-decimal string, e.g. `"-40.00"`.
        pub net: String,
        pub net_minor: i64,
    }

    /// A suggested settling payment.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from_member_id: String,
        pub to_member_id: String,
        pub amount: String,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalancesResponse {
        pub members: Vec<super::membership::MemberView>,
        pub balances: Vec<BalanceView>,
        pub transfers: Vec<TransferView>,
    }
}

pub mod settlement {
    use super::*;

    /// Request body for recording a settlement payment.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub from_member_id: String,
        pub to_member_id: String,
        /// Decimal string, converted to cents at the boundary.
        pub amount: String,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementCreated {
        pub settlement_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementView {
        pub id: String,
        pub from_member_id: String,
        pub to_member_id: String,
        pub amount: String,
        pub note: Option<String>,
        pub settled_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementsResponse {
        pub settlements: Vec<SettlementView>,
    }
}
