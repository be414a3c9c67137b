//! Pure balance computation over current members and the full expense list.
//!
//! Nothing here touches storage: the functions take the ordered member list
//! and the expense charges as plain data and return net positions and
//! suggested transfers. `ops::balances` is the thin loader on top. Balances
//! are never persisted; every call recomputes from scratch, so the output
//! always reflects *current* membership even for historical expenses (a new
//! member retroactively shares all past costs, a removed member's share
//! vanishes at the next call).
//!
//! All arithmetic is integer cents. The zero-sum invariant is exact: when
//! every expense's payer is still a current member, the net positions sum to
//! exactly zero.

use std::collections::HashMap;

use crate::MoneyCents;

/// A current member, as the balance engine sees it.
///
/// The slice passed to [`net_positions`] must already be in the stable
/// member order (ascending joined-at, then id) — the same order the split
/// snapshot uses. Remainder cents go to the earliest entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub member_id: String,
    pub user_id: Option<String>,
    pub display_name: String,
}

/// One expense reduced to what balance computation needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseCharge {
    pub payer_user_id: String,
    pub amount: MoneyCents,
}

/// A member's net position: positive = the group owes them, negative = they
/// owe the group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetPosition {
    pub member_id: String,
    pub display_name: String,
    pub net: MoneyCents,
}

/// A suggested settling payment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferSuggestion {
    pub from_member_id: String,
    pub to_member_id: String,
    pub amount: MoneyCents,
}

/// Splits `amount` into `n` integer-cent shares that sum exactly to
/// `amount`, giving the leftover cents (amount mod n) to the earliest
/// positions.
pub fn equal_split(amount: MoneyCents, n: usize) -> Vec<MoneyCents> {
    if n == 0 {
        return Vec::new();
    }
    let n_i64 = n as i64;
    let base = amount.cents().div_euclid(n_i64);
    let rem = amount.cents().rem_euclid(n_i64);
    (0..n_i64)
        .map(|i| MoneyCents::new(base + i64::from(i < rem)))
        .collect()
}

/// Computes every member's net position from the full expense list.
///
/// Each expense is shared equally (with remainder cents to the earliest
/// members) by all *current* members; the payer is credited the full amount
/// if — and only if — they are still a current member. A departed payer's
/// paid amounts credit no one.
pub fn net_positions(participants: &[Participant], expenses: &[ExpenseCharge]) -> Vec<NetPosition> {
    if participants.is_empty() {
        return Vec::new();
    }

    let mut net: Vec<MoneyCents> = vec![MoneyCents::ZERO; participants.len()];
    let index_by_user: HashMap<&str, usize> = participants
        .iter()
        .enumerate()
        .filter_map(|(idx, p)| p.user_id.as_deref().map(|user| (user, idx)))
        .collect();

    for expense in expenses {
        for (idx, share) in equal_split(expense.amount, participants.len())
            .into_iter()
            .enumerate()
        {
            net[idx] -= share;
        }
        if let Some(idx) = index_by_user.get(expense.payer_user_id.as_str()) {
            net[*idx] += expense.amount;
        }
    }

    participants
        .iter()
        .zip(net)
        .map(|(p, net)| NetPosition {
            member_id: p.member_id.clone(),
            display_name: p.display_name.clone(),
            net,
        })
        .collect()
}

/// Suggests settling transfers with the greedy largest-first heuristic.
///
/// Debtors and creditors are each sorted descending by absolute amount
/// (stable, so ties keep the member order); the largest debtor repeatedly
/// pays the largest creditor `min` of their remaining amounts. Produces at
/// most `min(|debtors|, |creditors|)` transfers — reproducible, but not
/// guaranteed minimum-cardinality.
pub fn suggest_transfers(positions: &[NetPosition]) -> Vec<TransferSuggestion> {
    let mut debtors: Vec<(&NetPosition, MoneyCents)> = positions
        .iter()
        .filter(|p| p.net.is_negative())
        .map(|p| (p, -p.net))
        .collect();
    let mut creditors: Vec<(&NetPosition, MoneyCents)> = positions
        .iter()
        .filter(|p| p.net.is_positive())
        .map(|p| (p, p.net))
        .collect();

    debtors.sort_by(|a, b| b.1.cmp(&a.1));
    creditors.sort_by(|a, b| b.1.cmp(&a.1));

    let mut transfers = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < debtors.len() && j < creditors.len() {
        let amount = debtors[i].1.min(creditors[j].1);
        transfers.push(TransferSuggestion {
            from_member_id: debtors[i].0.member_id.clone(),
            to_member_id: creditors[j].0.member_id.clone(),
            amount,
        });
        debtors[i].1 -= amount;
        creditors[j].1 -= amount;
        if debtors[i].1.is_zero() {
            i += 1;
        }
        if creditors[j].1.is_zero() {
            j += 1;
        }
    }

    transfers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(member_id: &str, user_id: &str) -> Participant {
        Participant {
            member_id: member_id.to_string(),
            user_id: Some(user_id.to_string()),
            display_name: user_id.to_string(),
        }
    }

    fn charge(payer: &str, cents: i64) -> ExpenseCharge {
        ExpenseCharge {
            payer_user_id: payer.to_string(),
            amount: MoneyCents::new(cents),
        }
    }

    fn net_of(positions: &[NetPosition], member_id: &str) -> i64 {
        positions
            .iter()
            .find(|p| p.member_id == member_id)
            .map(|p| p.net.cents())
            .unwrap()
    }

    #[test]
    fn equal_split_distributes_remainder_to_earliest() {
        let shares = equal_split(MoneyCents::new(1000), 3);
        assert_eq!(
            shares,
            vec![
                MoneyCents::new(334),
                MoneyCents::new(333),
                MoneyCents::new(333)
            ]
        );
        let total: i64 = shares.iter().map(|s| s.cents()).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn equal_split_even_amount_has_no_remainder() {
        let shares = equal_split(MoneyCents::new(900), 3);
        assert!(shares.iter().all(|s| s.cents() == 300));
    }

    #[test]
    fn equal_split_zero_members_is_empty() {
        assert!(equal_split(MoneyCents::new(1000), 0).is_empty());
    }

    #[test]
    fn net_positions_sum_to_zero_when_payers_are_current() {
        let members = vec![
            participant("m1", "anna"),
            participant("m2", "bruno"),
            participant("m3", "carla"),
        ];
        let expenses = vec![charge("anna", 9000), charge("bruno", 3000), charge("carla", 101)];

        let positions = net_positions(&members, &expenses);
        let total: i64 = positions.iter().map(|p| p.net.cents()).sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn worked_three_member_scenario() {
        // anna pays 90.00, bruno pays 30.00: anna +50.00, bruno -10.00,
        // carla -40.00; greedy settles carla->anna 40.00 then bruno->anna
        // 10.00.
        let members = vec![
            participant("m1", "anna"),
            participant("m2", "bruno"),
            participant("m3", "carla"),
        ];
        let expenses = vec![charge("anna", 9000), charge("bruno", 3000)];

        let positions = net_positions(&members, &expenses);
        assert_eq!(net_of(&positions, "m1"), 5000);
        assert_eq!(net_of(&positions, "m2"), -1000);
        assert_eq!(net_of(&positions, "m3"), -4000);

        let transfers = suggest_transfers(&positions);
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].from_member_id, "m3");
        assert_eq!(transfers[0].to_member_id, "m1");
        assert_eq!(transfers[0].amount.cents(), 4000);
        assert_eq!(transfers[1].from_member_id, "m2");
        assert_eq!(transfers[1].to_member_id, "m1");
        assert_eq!(transfers[1].amount.cents(), 1000);
    }

    #[test]
    fn departed_payer_credits_no_one() {
        let members = vec![participant("m1", "anna"), participant("m2", "bruno")];
        // carla paid 10.00 but is no longer a member: both remaining members
        // owe 5.00 and no one is credited.
        let expenses = vec![charge("carla", 1000)];

        let positions = net_positions(&members, &expenses);
        assert_eq!(net_of(&positions, "m1"), -500);
        assert_eq!(net_of(&positions, "m2"), -500);
    }

    #[test]
    fn no_members_yields_empty_output() {
        assert!(net_positions(&[], &[charge("anna", 100)]).is_empty());
        assert!(suggest_transfers(&[]).is_empty());
    }

    #[test]
    fn remainder_cents_go_to_earliest_members() {
        let members = vec![
            participant("m1", "anna"),
            participant("m2", "bruno"),
            participant("m3", "carla"),
        ];
        // 1.00 over three members: 34/33/33, paid by anna.
        let positions = net_positions(&members, &[charge("anna", 100)]);
        assert_eq!(net_of(&positions, "m1"), 66);
        assert_eq!(net_of(&positions, "m2"), -33);
        assert_eq!(net_of(&positions, "m3"), -33);
    }

    #[test]
    fn transfers_cover_each_debtor_and_creditor_exactly() {
        let members = vec![
            participant("m1", "anna"),
            participant("m2", "bruno"),
            participant("m3", "carla"),
            participant("m4", "dario"),
        ];
        let expenses = vec![
            charge("anna", 7300),
            charge("bruno", 2100),
            charge("carla", 999),
        ];
        let positions = net_positions(&members, &expenses);
        let transfers = suggest_transfers(&positions);

        for transfer in &transfers {
            assert!(transfer.amount.is_positive());
        }
        for position in &positions {
            let paid: i64 = transfers
                .iter()
                .filter(|t| t.from_member_id == position.member_id)
                .map(|t| t.amount.cents())
                .sum();
            let received: i64 = transfers
                .iter()
                .filter(|t| t.to_member_id == position.member_id)
                .map(|t| t.amount.cents())
                .sum();
            assert_eq!(received - paid, position.net.cents());
        }
    }

    #[test]
    fn greedy_matches_largest_debtor_to_largest_creditor_first() {
        let positions = vec![
            NetPosition {
                member_id: "m1".to_string(),
                display_name: "anna".to_string(),
                net: MoneyCents::new(3000),
            },
            NetPosition {
                member_id: "m2".to_string(),
                display_name: "bruno".to_string(),
                net: MoneyCents::new(1000),
            },
            NetPosition {
                member_id: "m3".to_string(),
                display_name: "carla".to_string(),
                net: MoneyCents::new(-2500),
            },
            NetPosition {
                member_id: "m4".to_string(),
                display_name: "dario".to_string(),
                net: MoneyCents::new(-1500),
            },
        ];
        let transfers = suggest_transfers(&positions);
        assert_eq!(transfers.len(), 3);
        // carla (largest debtor) pays anna (largest creditor) first.
        assert_eq!(transfers[0].from_member_id, "m3");
        assert_eq!(transfers[0].to_member_id, "m1");
        assert_eq!(transfers[0].amount.cents(), 2500);
        assert_eq!(transfers[1].from_member_id, "m4");
        assert_eq!(transfers[1].to_member_id, "m1");
        assert_eq!(transfers[1].amount.cents(), 500);
        assert_eq!(transfers[2].from_member_id, "m4");
        assert_eq!(transfers[2].to_member_id, "m2");
        assert_eq!(transfers[2].amount.cents(), 1000);
    }
}
