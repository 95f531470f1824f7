//! Account consolidation.
//!
//! The chart of accounts is a forest: each account optionally points at one
//! consolidation parent. [`AccountForest::roll_up`] folds report items into
//! their consolidation targets and is shared by every report that needs it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::ledger::LedgerAccountGroup;
use super::types::{AccountCategory, AccountInfo, TrialBalanceRow};

/// Where items are rolled up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollUpScope<'a> {
    /// Every account folds into the root of its tree.
    Roots,
    /// Accounts under this code (and the code itself) fold into it; others stay.
    Into(&'a str),
}

/// A report item that can be merged into its consolidation parent.
pub trait Consolidate {
    /// Account code the item is keyed by.
    fn account_code(&self) -> &str;

    /// Re-labels the item as the parent account.
    fn relabel(&mut self, parent: &AccountInfo);

    /// Adds another item of the same target into this one.
    fn absorb(&mut self, other: Self);

    /// Label for a target code that has no chart row of its own.
    fn stand_in(&self, code: &str) -> AccountInfo;
}

/// Chart of accounts indexed for consolidation lookups.
#[derive(Debug, Clone, Default)]
pub struct AccountForest {
    accounts: HashMap<String, AccountInfo>,
}

impl AccountForest {
    /// Builds the forest from chart rows.
    pub fn new(accounts: impl IntoIterator<Item = AccountInfo>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|a| (a.account_code.clone(), a))
                .collect(),
        }
    }

    /// Looks up an account by code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&AccountInfo> {
        self.accounts.get(code)
    }

    /// Every account code in the chart, in no particular order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    /// Consolidation code of `code`.
    ///
    /// The parent need not have a chart row: accounts sharing a bare
    /// consolidation code still roll up together under it.
    fn parent_of(&self, code: &str) -> Option<&str> {
        self.accounts
            .get(code)
            .and_then(|a| a.consolidate_account_code.as_deref())
            .filter(|parent| !parent.is_empty() && *parent != code)
    }

    /// Walks from `code` up to the root, stopping at the first repeated node.
    fn ancestry<'a>(&'a self, code: &'a str) -> Vec<&'a str> {
        let mut chain = vec![code];
        let mut seen = HashSet::from([code]);
        let mut current = code;

        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }

        chain
    }

    /// Root of the tree containing `code`.
    #[must_use]
    pub fn root_of<'a>(&'a self, code: &'a str) -> &'a str {
        self.ancestry(code).last().copied().unwrap_or(code)
    }

    /// Whether `code` is `ancestor` or sits anywhere below it.
    #[must_use]
    pub fn is_within(&self, code: &str, ancestor: &str) -> bool {
        self.ancestry(code).contains(&ancestor)
    }

    /// `code` plus every chart account below it, sorted.
    #[must_use]
    pub fn subtree(&self, code: &str) -> Vec<String> {
        self.codes()
            .filter(|candidate| self.is_within(candidate, code))
            .chain(std::iter::once(code))
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn target_of<'a>(&'a self, code: &'a str, scope: RollUpScope<'a>) -> &'a str {
        match scope {
            RollUpScope::Roots => self.root_of(code),
            RollUpScope::Into(target) if code == target || self.is_within(code, target) => target,
            RollUpScope::Into(_) => code,
        }
    }

    /// Folds items into their consolidation targets.
    ///
    /// Output is ordered by target account code.
    pub fn roll_up<T: Consolidate>(&self, items: Vec<T>, scope: RollUpScope<'_>) -> Vec<T> {
        let mut merged: BTreeMap<String, T> = BTreeMap::new();

        for mut item in items {
            let target = self.target_of(item.account_code(), scope).to_string();
            if target != item.account_code() {
                match self.accounts.get(&target) {
                    Some(parent) => item.relabel(parent),
                    None => {
                        let parent = item.stand_in(&target);
                        item.relabel(&parent);
                    }
                }
            }

            match merged.get_mut(&target) {
                Some(existing) => existing.absorb(item),
                None => {
                    merged.insert(target, item);
                }
            }
        }

        merged.into_values().collect()
    }
}

impl Consolidate for TrialBalanceRow {
    fn account_code(&self) -> &str {
        &self.account.account_code
    }

    fn relabel(&mut self, parent: &AccountInfo) {
        self.account = parent.clone();
    }

    fn absorb(&mut self, other: Self) {
        self.balance_debit_amount += other.balance_debit_amount;
        self.balance_credit_amount += other.balance_credit_amount;
        self.debit_amount += other.debit_amount;
        self.credit_amount += other.credit_amount;
        self.next_balance_debit_amount += other.next_balance_debit_amount;
        self.next_balance_credit_amount += other.next_balance_credit_amount;
    }

    fn stand_in(&self, code: &str) -> AccountInfo {
        AccountInfo {
            account_code: code.to_string(),
            account_name: code.to_string(),
            consolidate_account_code: None,
            ..self.account.clone()
        }
    }
}

impl Consolidate for LedgerAccountGroup {
    fn account_code(&self) -> &str {
        &self.opening.account_code
    }

    fn relabel(&mut self, parent: &AccountInfo) {
        for row in std::iter::once(&mut self.opening).chain(self.transactions.iter_mut()) {
            row.account_code.clone_from(&parent.account_code);
            row.account_name.clone_from(&parent.account_name);
            row.account_group.clone_from(&parent.account_group);
            row.consolidate_account_code
                .clone_from(&parent.consolidate_account_code);
        }
    }

    fn absorb(&mut self, other: Self) {
        self.opening.amount += other.opening.amount;
        self.transactions.extend(other.transactions);
        self.transactions
            .sort_by(|a, b| (a.doc_date, &a.doc_no).cmp(&(b.doc_date, &b.doc_no)));
    }

    fn stand_in(&self, code: &str) -> AccountInfo {
        AccountInfo {
            account_code: code.to_string(),
            account_group: self.opening.account_group.clone(),
            ..AccountInfo::synthetic(code, AccountCategory::Asset)
        }
    }
}
