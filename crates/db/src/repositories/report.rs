//! Report repository backed by the journal tables.
//!
//! Every query is a single parameterized statement. Sums come back unsigned;
//! the report service applies the category sign convention.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, FromQueryResult, QueryResult, Statement, Value,
};
use tracing::{debug, warn};

use glreport_core::reports::{
    AccountAmountRow, AccountForest, AccountInfo, BalanceSheetQuery, LedgerAccountCodeRange,
    LedgerAccountGroup, LedgerAccountRaw, LedgerQuery, LedgerRowMode, ReportError, ReportQuery,
    ReportRepository, RollUpScope, TrialBalanceRow, group_ledger_rows,
};

// ============================================================================
// SQL fragments
// ============================================================================

/// Chart columns selected by every account-level query, from alias `chart`.
const CHART_COLUMNS: &str = "chart.accountcode, \
    COALESCE(chart.accountname, '') AS accountname, \
    chart.accountcategory::int2 AS accountcategory, \
    COALESCE(chart.accountbalancetype, 0)::int2 AS accountbalancetype, \
    COALESCE(chart.accountgroup, '') AS accountgroup, \
    COALESCE(chart.accountlevel, 0)::int2 AS accountlevel, \
    NULLIF(chart.consolidateaccountcode, '') AS consolidateaccountcode";

/// Journal lines joined to their header, from aliases `d` and `h`.
const JOURNAL_LINES: &str = "FROM journals_detail AS d \
    JOIN journals AS h ON h.shopid = d.shopid AND h.docno = d.docno";

/// Positional bind collector.
///
/// Each pushed value gets the next `$n` placeholder.
#[derive(Debug, Default)]
pub(crate) struct SqlParams {
    values: Vec<Value>,
}

impl SqlParams {
    /// Adds a value and returns its placeholder.
    pub(crate) fn push(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }

    /// Adds each value and returns the comma-separated placeholders.
    pub(crate) fn push_list<I, V>(&mut self, values: I) -> String
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .map(|value| self.push(value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Journal header predicate for closing entries.
///
/// Regular journals always count. Closing journals (`journaltype = 1`) count
/// when dated before `window_start`, or anywhere when `include_closing` holds.
pub(crate) fn closing_filter(window_start: &str, include_closing: &str) -> String {
    format!("(COALESCE(h.journaltype, 0) = 0 OR h.docdate < {window_start} OR {include_closing})")
}

/// Builds the trial balance statement: opening, movement, and closing sums
/// for every chart account.
pub(crate) fn trial_balance_sql(query: &ReportQuery) -> (String, Vec<Value>) {
    let mut params = SqlParams::default();
    let shop = params.push(query.shop_id.clone());
    let group = params.push(query.account_group.clone());
    let start = params.push(query.start_date);
    let end = params.push(query.end_date);
    let ica = params.push(query.include_closing_mode);
    let closing = closing_filter(&start, &ica);

    let sql = format!(
        "WITH journal_doc AS ( \
            SELECT d.accountcode, h.docdate, \
                d.debitamount::numeric AS debitamount, d.creditamount::numeric AS creditamount \
            {JOURNAL_LINES} \
            WHERE h.shopid = {shop} AND h.accountgroup = {group} AND h.docdate <= {end} \
                AND {closing} \
        ), sums AS ( \
            SELECT accountcode, \
                SUM(CASE WHEN docdate < {start} THEN debitamount ELSE 0 END) AS balancedebitamount, \
                SUM(CASE WHEN docdate < {start} THEN creditamount ELSE 0 END) AS balancecreditamount, \
                SUM(CASE WHEN docdate >= {start} THEN debitamount ELSE 0 END) AS debitamount, \
                SUM(CASE WHEN docdate >= {start} THEN creditamount ELSE 0 END) AS creditamount, \
                SUM(debitamount) AS nextbalancedebitamount, \
                SUM(creditamount) AS nextbalancecreditamount \
            FROM journal_doc GROUP BY accountcode \
        ) \
        SELECT {CHART_COLUMNS}, \
            COALESCE(s.balancedebitamount, 0)::numeric AS balancedebitamount, \
            COALESCE(s.balancecreditamount, 0)::numeric AS balancecreditamount, \
            COALESCE(s.debitamount, 0)::numeric AS debitamount, \
            COALESCE(s.creditamount, 0)::numeric AS creditamount, \
            COALESCE(s.nextbalancedebitamount, 0)::numeric AS nextbalancedebitamount, \
            COALESCE(s.nextbalancecreditamount, 0)::numeric AS nextbalancecreditamount \
        FROM chartofaccounts AS chart \
        LEFT JOIN sums AS s ON s.accountcode = chart.accountcode \
        WHERE chart.shopid = {shop} AND chart.accountgroup = {group} \
        ORDER BY chart.accountcode"
    );

    (sql, params.into_values())
}

/// Builds a single-window debit/credit sum per chart account.
///
/// Lines dated in `[window_start, end]` are summed, except that with
/// `cumulative` everything up to `end` is summed and `window_start` only
/// bounds which closing journals obey the flag.
fn amount_sql(
    shop_id: &str,
    account_group: &str,
    include_closing: bool,
    window_start: DateTime<Utc>,
    end_date: DateTime<Utc>,
    cumulative: bool,
    categories: Option<&[i16]>,
) -> (String, Vec<Value>) {
    let mut params = SqlParams::default();
    let shop = params.push(shop_id.to_string());
    let group = params.push(account_group.to_string());
    let start = params.push(window_start);
    let end = params.push(end_date);
    let ica = params.push(include_closing);
    let closing = closing_filter(&start, &ica);

    let window = if cumulative {
        format!("h.docdate <= {end}")
    } else {
        format!("h.docdate BETWEEN {start} AND {end}")
    };
    let category_filter = categories.map_or_else(String::new, |codes| {
        let placeholders = params.push_list(codes.iter().copied());
        format!(" AND chart.accountcategory IN ({placeholders})")
    });

    let sql = format!(
        "WITH sums AS ( \
            SELECT d.accountcode, \
                SUM(d.debitamount)::numeric AS debitamount, \
                SUM(d.creditamount)::numeric AS creditamount \
            {JOURNAL_LINES} \
            WHERE h.shopid = {shop} AND h.accountgroup = {group} AND {window} \
                AND {closing} \
            GROUP BY d.accountcode \
        ) \
        SELECT {CHART_COLUMNS}, \
            COALESCE(s.debitamount, 0)::numeric AS debitamount, \
            COALESCE(s.creditamount, 0)::numeric AS creditamount \
        FROM chartofaccounts AS chart \
        LEFT JOIN sums AS s ON s.accountcode = chart.accountcode \
        WHERE chart.shopid = {shop} AND chart.accountgroup = {group}{category_filter} \
        ORDER BY chart.accountcode"
    );

    (sql, params.into_values())
}

/// Profit and loss: movement within the window for Income and Expense accounts.
pub(crate) fn profit_and_loss_sql(query: &ReportQuery) -> (String, Vec<Value>) {
    amount_sql(
        &query.shop_id,
        &query.account_group,
        query.include_closing_mode,
        query.start_date,
        query.end_date,
        false,
        Some(&[4, 5]),
    )
}

/// Balance sheet: cumulative sums up to the cut-off for every account.
pub(crate) fn balance_sheet_sql(query: &BalanceSheetQuery) -> (String, Vec<Value>) {
    amount_sql(
        &query.shop_id,
        &query.account_group,
        query.include_closing_mode,
        query.closing_window_start(),
        query.end_date,
        true,
        None,
    )
}

/// Builds the ledger statement.
///
/// `account_codes`, when given, restricts the chart to exactly those codes
/// (the consolidated subtree). Output is one opening row per account followed
/// by its transactions, ordered by account, row mode, date, and document.
pub(crate) fn ledger_sql(query: &LedgerQuery, account_codes: Option<&[String]>) -> (String, Vec<Value>) {
    let mut params = SqlParams::default();
    let shop = params.push(query.shop_id.clone());
    let start = params.push(query.start_date);
    let end = params.push(query.end_date);

    let mut account_filter = String::new();
    let mut journal_filter = String::new();
    if !query.account_group.is_empty() {
        let group = params.push(query.account_group.clone());
        account_filter.push_str(&format!(" AND a.accountgroup = {group}"));
        journal_filter.push_str(&format!(" AND h.accountgroup = {group}"));
    }
    if let Some(codes) = account_codes {
        let placeholders = params.push_list(codes.iter().cloned());
        account_filter.push_str(&format!(" AND a.accountcode IN ({placeholders})"));
    }
    if !query.account_code_ranges.is_empty() {
        let ranges = range_filter(&mut params, &query.account_code_ranges);
        account_filter.push_str(&format!(" AND ({ranges})"));
    }

    if let Some(code) = query.creditor_code.as_deref().filter(|c| !c.is_empty()) {
        let creditor = params.push(code.to_string());
        journal_filter.push_str(&format!(" AND h.creditor->>'code' = {creditor}"));
    }
    if let Some(code) = query.debtor_code.as_deref().filter(|c| !c.is_empty()) {
        let debtor = params.push(code.to_string());
        journal_filter.push_str(&format!(" AND h.debtor->>'code' = {debtor}"));
    }

    let sql = format!(
        "WITH acc AS ( \
            SELECT a.accountcode, COALESCE(a.accountname, '') AS accountname, \
                COALESCE(a.accountgroup, '') AS accountgroup, \
                NULLIF(a.consolidateaccountcode, '') AS consolidateaccountcode \
            FROM chartofaccounts AS a \
            WHERE a.shopid = {shop}{account_filter} \
        ), doc AS ( \
            SELECT d.accountcode, h.docno, h.docdate, \
                COALESCE(h.accountdescription, '') AS accountdescription, \
                d.debitamount::numeric AS debitamount, d.creditamount::numeric AS creditamount \
            {JOURNAL_LINES} \
            WHERE h.shopid = {shop} AND h.docdate <= {end}{journal_filter} \
        ), opening AS ( \
            SELECT accountcode, SUM(debitamount - creditamount) AS amount \
            FROM doc WHERE docdate < {start} GROUP BY accountcode \
        ) \
        SELECT * FROM ( \
            SELECT -1 AS rowmode, {start}::timestamptz AS docdate, '' AS docno, \
                acc.accountcode, acc.accountname, '' AS accountdescription, \
                acc.accountgroup, acc.consolidateaccountcode, \
                0::numeric AS debitamount, 0::numeric AS creditamount, \
                COALESCE(opening.amount, 0)::numeric AS amount \
            FROM acc LEFT JOIN opening ON opening.accountcode = acc.accountcode \
            UNION ALL \
            SELECT 0 AS rowmode, doc.docdate::timestamptz, doc.docno, \
                acc.accountcode, acc.accountname, doc.accountdescription, \
                acc.accountgroup, acc.consolidateaccountcode, \
                doc.debitamount, doc.creditamount, 0::numeric \
            FROM doc JOIN acc ON acc.accountcode = doc.accountcode \
            WHERE doc.docdate >= {start} \
        ) AS ledger \
        ORDER BY accountcode, rowmode, docdate, docno"
    );

    (sql, params.into_values())
}

fn range_filter(params: &mut SqlParams, ranges: &[LedgerAccountCodeRange]) -> String {
    ranges
        .iter()
        .map(|range| {
            let start = params.push(range.start.clone());
            let end = params.push(range.end.clone());
            format!("a.accountcode BETWEEN {start} AND {end}")
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Chart query for the consolidation forest; an empty group spans every book.
pub(crate) fn chart_sql(shop_id: &str, account_group: &str) -> (String, Vec<Value>) {
    let mut params = SqlParams::default();
    let shop = params.push(shop_id.to_string());
    let group_filter = if account_group.is_empty() {
        String::new()
    } else {
        let group = params.push(account_group.to_string());
        format!(" AND chart.accountgroup = {group}")
    };
    let sql = format!(
        "SELECT {CHART_COLUMNS} FROM chartofaccounts AS chart \
        WHERE chart.shopid = {shop}{group_filter} ORDER BY chart.accountcode"
    );
    (sql, params.into_values())
}

// ============================================================================
// Row decoding
// ============================================================================

#[derive(Debug, FromQueryResult)]
struct ChartRecord {
    accountcode: String,
    accountname: String,
    accountcategory: i16,
    accountbalancetype: i16,
    accountgroup: String,
    accountlevel: i16,
    consolidateaccountcode: Option<String>,
}

impl TryFrom<ChartRecord> for AccountInfo {
    type Error = ReportError;

    fn try_from(record: ChartRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            account_code: record.accountcode,
            account_name: record.accountname,
            account_category: record.accountcategory.try_into()?,
            account_balance_type: record.accountbalancetype,
            account_group: record.accountgroup,
            account_level: record.accountlevel,
            consolidate_account_code: record.consolidateaccountcode,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct TrialBalanceSums {
    balancedebitamount: Decimal,
    balancecreditamount: Decimal,
    debitamount: Decimal,
    creditamount: Decimal,
    nextbalancedebitamount: Decimal,
    nextbalancecreditamount: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct AmountSums {
    debitamount: Decimal,
    creditamount: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct LedgerRecord {
    rowmode: i32,
    docdate: DateTime<Utc>,
    docno: String,
    accountcode: String,
    accountname: String,
    accountdescription: String,
    accountgroup: String,
    consolidateaccountcode: Option<String>,
    debitamount: Decimal,
    creditamount: Decimal,
    amount: Decimal,
}

impl TryFrom<LedgerRecord> for LedgerAccountRaw {
    type Error = ReportError;

    fn try_from(record: LedgerRecord) -> Result<Self, Self::Error> {
        let row_mode = i16::try_from(record.rowmode)
            .map_err(ReportError::repository)
            .and_then(|mode| LedgerRowMode::try_from(mode).map_err(ReportError::Repository))?;

        Ok(Self {
            row_mode,
            doc_date: record.docdate,
            doc_no: record.docno,
            account_code: record.accountcode,
            account_name: record.accountname,
            account_description: record.accountdescription,
            account_group: record.accountgroup,
            consolidate_account_code: record.consolidateaccountcode,
            debit_amount: record.debitamount,
            credit_amount: record.creditamount,
            amount: record.amount,
        })
    }
}

fn decode<T: FromQueryResult>(row: &QueryResult) -> Result<T, ReportError> {
    T::from_query_result(row, "").map_err(ReportError::repository)
}

fn decode_account(row: &QueryResult) -> Result<AccountInfo, ReportError> {
    decode::<ChartRecord>(row)?.try_into()
}

fn decode_ledger(row: &QueryResult) -> Result<LedgerAccountRaw, ReportError> {
    decode::<LedgerRecord>(row)?.try_into()
}

// ============================================================================
// Repository
// ============================================================================

/// Postgres implementation of [`ReportRepository`].
#[derive(Debug, Clone)]
pub struct PgReportRepository {
    db: DatabaseConnection,
}

impl PgReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn fetch(&self, (sql, values): (String, Vec<Value>)) -> Result<Vec<QueryResult>, ReportError> {
        let statement = Statement::from_sql_and_values(self.db.get_database_backend(), sql, values);
        self.db
            .query_all(statement)
            .await
            .map_err(ReportError::repository)
    }

    async fn chart(&self, shop_id: &str, account_group: &str) -> Result<Vec<AccountInfo>, ReportError> {
        self.fetch(chart_sql(shop_id, account_group))
            .await?
            .iter()
            .map(decode_account)
            .collect()
    }

    async fn fetch_amounts(&self, statement: (String, Vec<Value>)) -> Result<Vec<AccountAmountRow>, ReportError> {
        self.fetch(statement)
            .await?
            .iter()
            .map(|row| {
                let sums: AmountSums = decode(row)?;
                Ok(AccountAmountRow {
                    account: decode_account(row)?,
                    debit_amount: sums.debitamount,
                    credit_amount: sums.creditamount,
                })
            })
            .collect()
    }
}

impl ReportRepository for PgReportRepository {
    async fn get_data_trial_balance(
        &self,
        query: &ReportQuery,
    ) -> Result<Vec<TrialBalanceRow>, ReportError> {
        self.fetch(trial_balance_sql(query))
            .await?
            .iter()
            .map(|row| {
                let sums: TrialBalanceSums = decode(row)?;
                Ok(TrialBalanceRow {
                    account: decode_account(row)?,
                    balance_debit_amount: sums.balancedebitamount,
                    balance_credit_amount: sums.balancecreditamount,
                    debit_amount: sums.debitamount,
                    credit_amount: sums.creditamount,
                    next_balance_debit_amount: sums.nextbalancedebitamount,
                    next_balance_credit_amount: sums.nextbalancecreditamount,
                })
            })
            .collect()
    }

    async fn get_data_profit_and_loss(
        &self,
        query: &ReportQuery,
    ) -> Result<Vec<AccountAmountRow>, ReportError> {
        self.fetch_amounts(profit_and_loss_sql(query)).await
    }

    async fn get_data_balance_sheet(
        &self,
        query: &BalanceSheetQuery,
    ) -> Result<Vec<AccountAmountRow>, ReportError> {
        self.fetch_amounts(balance_sheet_sql(query)).await
    }

    async fn get_data_ledger_account(
        &self,
        query: &LedgerQuery,
    ) -> Result<Vec<LedgerAccountRaw>, ReportError> {
        let target = query
            .consolidate_account_code
            .as_deref()
            .filter(|code| !code.is_empty());

        let Some(target) = target else {
            return self
                .fetch(ledger_sql(query, None))
                .await?
                .iter()
                .map(decode_ledger)
                .collect();
        };

        let forest = AccountForest::new(self.chart(&query.shop_id, &query.account_group).await?);
        let subtree = forest.subtree(target);
        if subtree.len() == 1 && forest.get(target).is_none() {
            warn!(shop_id = %query.shop_id, code = %target, "no account consolidates into code");
        }
        debug!(code = %target, accounts = subtree.len(), "consolidating ledger");

        let rows = self
            .fetch(ledger_sql(query, Some(&subtree)))
            .await?
            .iter()
            .map(decode_ledger)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(forest
            .roll_up(group_ledger_rows(rows), RollUpScope::Into(target))
            .into_iter()
            .flat_map(LedgerAccountGroup::into_rows)
            .collect())
    }

    async fn get_chart_of_accounts(
        &self,
        shop_id: &str,
        account_group: &str,
    ) -> Result<Vec<AccountInfo>, ReportError> {
        self.chart(shop_id, account_group).await
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
