//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Quotaparte:
//!
//! - `users`: authentication
//! - `topics`: shared-expense groups with one owner
//! - `topic_members`: a user's participation record within a topic
//! - `expenses`: shared expenses (payer, integer-cent amount, date)
//! - `expense_splits`: equal-split snapshot at expense-creation time
//! - `join_requests`: pending/approved/denied entry requests
//! - `settlements`: recorded repayments between two members
//!
//! The unique index on join_requests (topic_id, requester_user_id, status)
//! doubles as the concurrency guard for racing decisions. topic_members has
//! no (topic_id, user_id) unique constraint because user_id is nullable
//! (guest scaffolding); the engine enforces that pair.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Topics {
    Table,
    Id,
    OwnerUserId,
    Title,
    Currency,
    InviteToken,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum TopicMembers {
    Table,
    Id,
    TopicId,
    UserId,
    DisplayName,
    Role,
    JoinedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    TopicId,
    PayerUserId,
    Description,
    AmountMinor,
    Currency,
    Date,
    Notes,
    CreatedAt,
}

#[derive(Iden)]
enum ExpenseSplits {
    Table,
    Id,
    ExpenseId,
    MemberId,
    ShareMinor,
}

#[derive(Iden)]
enum JoinRequests {
    Table,
    Id,
    TopicId,
    RequesterUserId,
    Status,
    Message,
    DecidedByUserId,
    DecidedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Settlements {
    Table,
    Id,
    TopicId,
    FromMemberId,
    ToMemberId,
    AmountMinor,
    Note,
    SettledAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Topics
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Topics::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Topics::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Topics::OwnerUserId).string().not_null())
                    .col(ColumnDef::new(Topics::Title).string().not_null())
                    .col(ColumnDef::new(Topics::Currency).string().not_null())
                    .col(ColumnDef::new(Topics::InviteToken).string().not_null())
                    .col(
                        ColumnDef::new(Topics::Status)
                            .string()
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Topics::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-topics-owner_user_id")
                            .from(Topics::Table, Topics::OwnerUserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-topics-invite_token-unique")
                    .table(Topics::Table)
                    .col(Topics::InviteToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-topics-owner_user_id")
                    .table(Topics::Table)
                    .col(Topics::OwnerUserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Topic Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TopicMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TopicMembers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TopicMembers::TopicId).string().not_null())
                    .col(ColumnDef::new(TopicMembers::UserId).string())
                    .col(
                        ColumnDef::new(TopicMembers::DisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TopicMembers::Role)
                            .string()
                            .not_null()
                            .default("member"),
                    )
                    .col(
                        ColumnDef::new(TopicMembers::JoinedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-topic_members-topic_id")
                            .from(TopicMembers::Table, TopicMembers::TopicId)
                            .to(Topics::Table, Topics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-topic_members-user_id")
                            .from(TopicMembers::Table, TopicMembers::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-topic_members-topic_id-user_id")
                    .table(TopicMembers::Table)
                    .col(TopicMembers::TopicId)
                    .col(TopicMembers::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-topic_members-user_id")
                    .table(TopicMembers::Table)
                    .col(TopicMembers::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::TopicId).string().not_null())
                    .col(ColumnDef::new(Expenses::PayerUserId).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(
                        ColumnDef::new(Expenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Currency).string().not_null())
                    .col(ColumnDef::new(Expenses::Date).date().not_null())
                    .col(ColumnDef::new(Expenses::Notes).string())
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-topic_id")
                            .from(Expenses::Table, Expenses::TopicId)
                            .to(Topics::Table, Topics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-topic_id-created_at")
                    .table(Expenses::Table)
                    .col(Expenses::TopicId)
                    .col(Expenses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-payer_user_id")
                    .table(Expenses::Table)
                    .col(Expenses::PayerUserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Expense Splits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ExpenseSplits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseSplits::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseSplits::ExpenseId).string().not_null())
                    .col(ColumnDef::new(ExpenseSplits::MemberId).string().not_null())
                    .col(
                        ColumnDef::new(ExpenseSplits::ShareMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_splits-expense_id")
                            .from(ExpenseSplits::Table, ExpenseSplits::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_splits-member_id")
                            .from(ExpenseSplits::Table, ExpenseSplits::MemberId)
                            .to(TopicMembers::Table, TopicMembers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_splits-expense_id")
                    .table(ExpenseSplits::Table)
                    .col(ExpenseSplits::ExpenseId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Join Requests
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(JoinRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JoinRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JoinRequests::TopicId).string().not_null())
                    .col(
                        ColumnDef::new(JoinRequests::RequesterUserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JoinRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(JoinRequests::Message).string())
                    .col(ColumnDef::new(JoinRequests::DecidedByUserId).string())
                    .col(ColumnDef::new(JoinRequests::DecidedAt).timestamp())
                    .col(
                        ColumnDef::new(JoinRequests::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-join_requests-topic_id")
                            .from(JoinRequests::Table, JoinRequests::TopicId)
                            .to(Topics::Table, Topics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-join_requests-requester_user_id")
                            .from(JoinRequests::Table, JoinRequests::RequesterUserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per status per (topic, requester). The state machine
        // deliberately leans on this as its concurrency guard.
        manager
            .create_index(
                Index::create()
                    .name("idx-join_requests-topic-requester-status-unique")
                    .table(JoinRequests::Table)
                    .col(JoinRequests::TopicId)
                    .col(JoinRequests::RequesterUserId)
                    .col(JoinRequests::Status)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-join_requests-topic_id")
                    .table(JoinRequests::Table)
                    .col(JoinRequests::TopicId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Settlements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Settlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settlements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settlements::TopicId).string().not_null())
                    .col(
                        ColumnDef::new(Settlements::FromMemberId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Settlements::ToMemberId).string().not_null())
                    .col(
                        ColumnDef::new(Settlements::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Settlements::Note).string())
                    .col(
                        ColumnDef::new(Settlements::SettledAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-topic_id")
                            .from(Settlements::Table, Settlements::TopicId)
                            .to(Topics::Table, Topics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-from_member_id")
                            .from(Settlements::Table, Settlements::FromMemberId)
                            .to(TopicMembers::Table, TopicMembers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-to_member_id")
                            .from(Settlements::Table, Settlements::ToMemberId)
                            .to(TopicMembers::Table, TopicMembers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-settlements-topic_id")
                    .table(Settlements::Table)
                    .col(Settlements::TopicId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Settlements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JoinRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseSplits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TopicMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Topics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
