use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{
    Member, MoneyCents, ResultEngine,
    balance::{self, ExpenseCharge, NetPosition, Participant, TransferSuggestion},
    expenses,
};

use super::{Engine, with_tx};

/// Net positions and suggested transfers for a topic, recomputed fresh on
/// every call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceReport {
    pub members: Vec<Member>,
    pub balances: Vec<NetPosition>,
    pub transfers: Vec<TransferSuggestion>,
}

impl Engine {
    /// Computes the balance report (owner or member only).
    ///
    /// A point-in-time read: members and expenses are loaded in one
    /// transaction and handed to the pure balance functions. No balance
    /// state is persisted anywhere. A topic with zero members yields empty
    /// lists, not an error.
    pub async fn topic_balances(
        &self,
        topic_id: &str,
        user_id: &str,
    ) -> ResultEngine<BalanceReport> {
        with_tx!(self, |db_tx| {
            self.require_topic_read(&db_tx, topic_id, user_id).await?;

            let member_models = self.current_members_ordered(&db_tx, topic_id).await?;
            let mut members = Vec::with_capacity(member_models.len());
            for model in member_models {
                members.push(Member::try_from(model)?);
            }

            let expense_models = expenses::Entity::find()
                .filter(expenses::Column::TopicId.eq(topic_id.to_string()))
                .all(&db_tx)
                .await?;

            let participants: Vec<Participant> = members
                .iter()
                .map(|member| Participant {
                    member_id: member.id.clone(),
                    user_id: member.user_id.clone(),
                    display_name: member.display_name.clone(),
                })
                .collect();
            let charges: Vec<ExpenseCharge> = expense_models
                .into_iter()
                .map(|model| ExpenseCharge {
                    payer_user_id: model.payer_user_id,
                    amount: MoneyCents::new(model.amount_minor),
                })
                .collect();

            let balances = balance::net_positions(&participants, &charges);
            let transfers = balance::suggest_transfers(&balances);

            Ok(BalanceReport {
                members,
                balances,
                transfers,
            })
        })
    }
}
