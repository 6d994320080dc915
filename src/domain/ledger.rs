//! Balance derivation over the append-only transaction history.
//!
//! The spendable balance is not stored anywhere. It is recomputed from
//! scratch on every read by folding the user's full history, which
//! trades O(n) work per read for zero cached-balance drift. The fold is
//! commutative over addition, so the result does not depend on the
//! order in which transactions are visited.

use super::transaction::Transaction;

/// Computes the spendable balance for one user's transaction history.
///
/// Earning kinds add their amount, redemptions subtract theirs, and the
/// final result is clamped to zero. The clamp is a reconciliation
/// policy: a history whose raw signed sum is negative (possible under
/// historical redemption races) reads as an empty balance rather than
/// an overdraft.
#[must_use]
pub fn spendable_balance<'a, I>(transactions: I) -> i64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let raw = transactions.into_iter().fold(0i64, |acc, tx| {
        if tx.kind.is_earning() {
            acc.saturating_add(tx.amount)
        } else {
            acc.saturating_sub(tx.amount)
        }
    });
    raw.max(0)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ids::{TransactionId, UserId};
    use crate::domain::transaction::TransactionKind;
    use chrono::Utc;

    fn tx(id: i64, kind: TransactionKind, amount: i64) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            user_id: UserId::new(1),
            kind,
            amount,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_is_zero() {
        let history: [Transaction; 0] = [];
        assert_eq!(spendable_balance(&history), 0);
    }

    #[test]
    fn earnings_accumulate() {
        // Scenario A: earn 10 reporting, earn 15 collecting.
        let history = [
            tx(1, TransactionKind::EarnedReport, 10),
            tx(2, TransactionKind::EarnedCollect, 15),
        ];
        assert_eq!(spendable_balance(&history), 25);
    }

    #[test]
    fn redemption_consumes_earnings() {
        // Scenario B: earn 10, redeem 10.
        let history = [
            tx(1, TransactionKind::EarnedReport, 10),
            tx(2, TransactionKind::Redeemed, 10),
        ];
        assert_eq!(spendable_balance(&history), 0);
    }

    #[test]
    fn overdrawn_history_clamps_to_zero() {
        // Scenario C: a redemption race left more redeemed than earned.
        let history = [
            tx(1, TransactionKind::EarnedReport, 10),
            tx(2, TransactionKind::Redeemed, 25),
        ];
        assert_eq!(spendable_balance(&history), 0);
    }

    #[test]
    fn fold_order_does_not_matter() {
        let mut history = vec![
            tx(1, TransactionKind::EarnedReport, 10),
            tx(2, TransactionKind::EarnedCollect, 40),
            tx(3, TransactionKind::Redeemed, 30),
            tx(4, TransactionKind::EarnedReport, 5),
        ];
        let forward = spendable_balance(&history);
        history.reverse();
        assert_eq!(spendable_balance(&history), forward);
        assert_eq!(forward, 25);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let history = [
            tx(1, TransactionKind::EarnedCollect, 12),
            tx(2, TransactionKind::Redeemed, 4),
        ];
        assert_eq!(spendable_balance(&history), spendable_balance(&history));
    }
}
