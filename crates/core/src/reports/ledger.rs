//! Ledger account running balances.

use rust_decimal::Decimal;

use super::types::{LedgerAccount, LedgerAccountDetail, LedgerAccountRaw, LedgerRowMode};

/// Raw rows of one account: its opening row and its transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAccountGroup {
    /// Opening row (`row_mode = -1`).
    pub opening: LedgerAccountRaw,
    /// Transaction rows in chronological order.
    pub transactions: Vec<LedgerAccountRaw>,
}

impl LedgerAccountGroup {
    fn implicit_opening(first: &LedgerAccountRaw) -> LedgerAccountRaw {
        LedgerAccountRaw {
            row_mode: LedgerRowMode::Opening,
            doc_no: String::new(),
            account_description: String::new(),
            debit_amount: Decimal::ZERO,
            credit_amount: Decimal::ZERO,
            amount: Decimal::ZERO,
            ..first.clone()
        }
    }

    /// Flattens back into the repository row order.
    #[must_use]
    pub fn into_rows(self) -> Vec<LedgerAccountRaw> {
        let mut rows = Vec::with_capacity(self.transactions.len() + 1);
        rows.push(self.opening);
        rows.extend(self.transactions);
        rows
    }

    /// Computes the running balance for this account.
    ///
    /// The opening amount is taken as-is. Each transaction moves the balance by
    /// `debit - credit` regardless of category.
    #[must_use]
    pub fn into_ledger_account(self) -> LedgerAccount {
        let balance = self.opening.amount;
        let mut running = balance;

        let details = self
            .transactions
            .into_iter()
            .map(|row| {
                running += row.debit_amount - row.credit_amount;
                LedgerAccountDetail {
                    doc_no: row.doc_no,
                    doc_date: row.doc_date,
                    account_description: row.account_description,
                    debit: row.debit_amount,
                    credit: row.credit_amount,
                    amount: running,
                }
            })
            .collect();

        LedgerAccount {
            account_code: self.opening.account_code,
            account_name: self.opening.account_name,
            account_group: self.opening.account_group,
            consolidate_account_code: self.opening.consolidate_account_code,
            balance,
            next_balance: running,
            details,
        }
    }
}

/// Groups raw rows by account, preserving repository order.
///
/// A new group starts at every opening row whose account differs from the
/// current group; a repeated opening row for the same account is ignored.
/// A transaction row for an account with no opening row starts a group with a
/// zero opening balance.
#[must_use]
pub fn group_ledger_rows(rows: Vec<LedgerAccountRaw>) -> Vec<LedgerAccountGroup> {
    let mut groups: Vec<LedgerAccountGroup> = Vec::new();

    for row in rows {
        let same_account = groups
            .last()
            .is_some_and(|g| g.opening.account_code == row.account_code);

        match (row.row_mode, same_account) {
            (LedgerRowMode::Opening, true) => {}
            (LedgerRowMode::Opening, false) => groups.push(LedgerAccountGroup {
                opening: row,
                transactions: Vec::new(),
            }),
            (LedgerRowMode::Transaction, true) => {
                if let Some(group) = groups.last_mut() {
                    group.transactions.push(row);
                }
            }
            (LedgerRowMode::Transaction, false) => groups.push(LedgerAccountGroup {
                opening: LedgerAccountGroup::implicit_opening(&row),
                transactions: vec![row],
            }),
        }
    }

    groups
}

/// Builds one ledger account per group, in repository order.
#[must_use]
pub fn build_ledger_accounts(rows: Vec<LedgerAccountRaw>) -> Vec<LedgerAccount> {
    group_ledger_rows(rows)
        .into_iter()
        .map(LedgerAccountGroup::into_ledger_account)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;

    fn row(mode: LedgerRowMode, code: &str, debit: Decimal, credit: Decimal, amount: Decimal) -> LedgerAccountRaw {
        LedgerAccountRaw {
            row_mode: mode,
            doc_date: Utc.with_ymd_and_hms(2022, 5, 1, 0, 0, 0).unwrap(),
            doc_no: String::new(),
            account_code: code.to_string(),
            account_name: format!("{code} name"),
            account_description: String::new(),
            account_group: "01".to_string(),
            consolidate_account_code: None,
            debit_amount: debit,
            credit_amount: credit,
            amount,
        }
    }

    #[test]
    fn test_transaction_without_opening_starts_at_zero() {
        let rows = vec![row(LedgerRowMode::Transaction, "AC9", dec!(10), dec!(0), dec!(0))];

        let accounts = build_ledger_accounts(rows);

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, Decimal::ZERO);
        assert_eq!(accounts[0].next_balance, dec!(10));
    }

    #[test]
    fn test_duplicate_opening_row_is_ignored() {
        let rows = vec![
            row(LedgerRowMode::Opening, "AC1", dec!(0), dec!(0), dec!(5)),
            row(LedgerRowMode::Opening, "AC1", dec!(0), dec!(0), dec!(99)),
            row(LedgerRowMode::Transaction, "AC1", dec!(1), dec!(0), dec!(0)),
        ];

        let accounts = build_ledger_accounts(rows);

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, dec!(5));
        assert_eq!(accounts[0].next_balance, dec!(6));
    }

    #[test]
    fn test_group_round_trips_to_rows() {
        let rows = vec![
            row(LedgerRowMode::Opening, "AC1", dec!(0), dec!(0), dec!(5)),
            row(LedgerRowMode::Transaction, "AC1", dec!(1), dec!(0), dec!(0)),
            row(LedgerRowMode::Opening, "AC2", dec!(0), dec!(0), dec!(0)),
        ];

        let flattened: Vec<_> = group_ledger_rows(rows.clone())
            .into_iter()
            .flat_map(LedgerAccountGroup::into_rows)
            .collect();

        assert_eq!(flattened, rows);
    }
}
