//! Metrics aggregation
//!
//! Filters a record snapshot into the current and previous windows and
//! derives financial, client, operational and inventory KPIs. Every compared
//! KPI is paired with its previous-window value and a growth delta.
//!
//! Window membership uses [`Period::contains`] (closed interval), so a record
//! stamped exactly on the shared boundary counts in both windows.
//!
//! All ratios route through [`ratio`] and [`growth`]: a zero denominator
//! yields exactly `0.0`, never NaN or infinity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Appointment, AppointmentStatus, Product, Snapshot, Transaction, TransactionKind};
use crate::period::{Period, PeriodPair};

/// `numerator / denominator`, or 0 when the result would not be finite
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `ratio × 100`
pub fn percent(numerator: f64, denominator: f64) -> f64 {
    ratio(numerator, denominator) * 100.0
}

/// Period-over-period change in percent: `(current − previous) / previous × 100`.
/// Undefined growth (previous == 0) is reported as 0.
pub fn growth(current: f64, previous: f64) -> f64 {
    percent(current - previous, previous)
}

/// A KPI value paired with its previous-window counterpart
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Comparison {
    pub current: f64,
    pub previous: f64,
    /// Percent change; 0 when `previous` is 0
    pub growth: f64,
}

impl Comparison {
    pub fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            growth: growth(current, previous),
        }
    }
}

/// Money in and out of the business
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub income: Comparison,
    pub expense: Comparison,
    pub profit: Comparison,
    /// profit / income × 100
    pub profit_margin: Comparison,
    /// income / number of income transactions
    pub average_ticket: Comparison,
    pub income_transactions: Comparison,
}

/// Client acquisition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientMetrics {
    /// Clients whose creation timestamp falls in the window
    pub new_clients: Comparison,
    /// All clients in the snapshot regardless of window
    pub total_clients: usize,
}

/// Appointment counts by status for one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
}

impl StatusCounts {
    fn record(&mut self, status: AppointmentStatus) {
        self.total += 1;
        match status {
            AppointmentStatus::Confirmed => self.confirmed += 1,
            AppointmentStatus::Completed => self.completed += 1,
            AppointmentStatus::Cancelled => self.cancelled += 1,
            AppointmentStatus::NoShow => self.no_show += 1,
        }
    }

    pub fn show_rate(&self) -> f64 {
        percent(self.completed as f64, self.total as f64)
    }

    pub fn cancel_rate(&self) -> f64 {
        percent(self.cancelled as f64, self.total as f64)
    }

    pub fn no_show_rate(&self) -> f64 {
        percent(self.no_show as f64, self.total as f64)
    }
}

/// Scheduling health
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationalMetrics {
    pub appointments: Comparison,
    pub current: StatusCounts,
    pub previous: StatusCounts,
    /// completed / total × 100 in the current window
    pub show_rate: f64,
    pub cancel_rate: f64,
    pub no_show_rate: f64,
}

/// Stock alerts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InventoryMetrics {
    /// Products at or below a non-zero reorder threshold, in snapshot order
    pub low_stock: Vec<Product>,
    pub low_stock_count: usize,
    /// Products with a non-zero reorder threshold
    pub tracked_products: usize,
}

/// Every KPI for one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBundle {
    pub periods: PeriodPair,
    pub financial: FinancialMetrics,
    pub clients: ClientMetrics,
    pub operations: OperationalMetrics,
    pub inventory: InventoryMetrics,
}

impl MetricBundle {
    /// Flatten into `group.kpi[_previous|_growth]` → value, sorted by key
    pub fn to_flat_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();

        let f = &self.financial;
        insert_comparison(&mut map, "financial.income", &f.income);
        insert_comparison(&mut map, "financial.expense", &f.expense);
        insert_comparison(&mut map, "financial.profit", &f.profit);
        insert_comparison(&mut map, "financial.profit_margin", &f.profit_margin);
        insert_comparison(&mut map, "financial.average_ticket", &f.average_ticket);
        insert_comparison(
            &mut map,
            "financial.income_transactions",
            &f.income_transactions,
        );

        insert_comparison(&mut map, "clients.new", &self.clients.new_clients);
        map.insert(
            "clients.total".to_string(),
            self.clients.total_clients as f64,
        );

        let o = &self.operations;
        insert_comparison(&mut map, "operations.appointments", &o.appointments);
        map.insert(
            "operations.completed".to_string(),
            o.current.completed as f64,
        );
        map.insert(
            "operations.confirmed".to_string(),
            o.current.confirmed as f64,
        );
        map.insert(
            "operations.cancelled".to_string(),
            o.current.cancelled as f64,
        );
        map.insert("operations.no_show".to_string(), o.current.no_show as f64);
        map.insert("operations.show_rate".to_string(), o.show_rate);
        map.insert("operations.cancel_rate".to_string(), o.cancel_rate);
        map.insert("operations.no_show_rate".to_string(), o.no_show_rate);

        map.insert(
            "inventory.low_stock_count".to_string(),
            self.inventory.low_stock_count as f64,
        );
        map.insert(
            "inventory.tracked_products".to_string(),
            self.inventory.tracked_products as f64,
        );

        map
    }
}

fn insert_comparison(map: &mut BTreeMap<String, f64>, key: &str, value: &Comparison) {
    map.insert(key.to_string(), value.current);
    map.insert(format!("{}_previous", key), value.previous);
    map.insert(format!("{}_growth", key), value.growth);
}

/// Raw cash-flow sums for one window
#[derive(Debug, Clone, Copy, Default)]
struct CashFlow {
    income: f64,
    expense: f64,
    income_count: usize,
}

impl CashFlow {
    fn collect(transactions: &[Transaction], period: &Period) -> Self {
        let mut flow = Self::default();
        for tx in transactions.iter().filter(|t| period.contains(t.date)) {
            if !tx.amount.is_finite() {
                tracing::warn!(transaction = %tx.id, "Skipping transaction with non-finite amount");
                continue;
            }
            match tx.kind {
                TransactionKind::Income => {
                    flow.income += tx.amount;
                    flow.income_count += 1;
                }
                TransactionKind::Expense => flow.expense += tx.amount,
            }
        }
        flow
    }

    fn profit(&self) -> f64 {
        self.income - self.expense
    }

    fn margin(&self) -> f64 {
        percent(self.profit(), self.income)
    }

    fn average_ticket(&self) -> f64 {
        ratio(self.income, self.income_count as f64)
    }
}

/// Financial KPIs for the current window against the previous one
pub fn financial_metrics(transactions: &[Transaction], periods: &PeriodPair) -> FinancialMetrics {
    let cur = CashFlow::collect(transactions, &periods.current);
    let prev = CashFlow::collect(transactions, &periods.previous);

    FinancialMetrics {
        income: Comparison::new(cur.income, prev.income),
        expense: Comparison::new(cur.expense, prev.expense),
        profit: Comparison::new(cur.profit(), prev.profit()),
        profit_margin: Comparison::new(cur.margin(), prev.margin()),
        average_ticket: Comparison::new(cur.average_ticket(), prev.average_ticket()),
        income_transactions: Comparison::new(cur.income_count as f64, prev.income_count as f64),
    }
}

/// New-client counts for both windows
pub fn client_metrics(clients: &[crate::models::Client], periods: &PeriodPair) -> ClientMetrics {
    let count_in = |period: &Period| {
        clients
            .iter()
            .filter(|c| period.contains(c.created_at))
            .count() as f64
    };

    ClientMetrics {
        new_clients: Comparison::new(count_in(&periods.current), count_in(&periods.previous)),
        total_clients: clients.len(),
    }
}

/// Count appointments by status within one window
pub fn status_counts(appointments: &[Appointment], period: &Period) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for appt in appointments.iter().filter(|a| period.contains(a.start_time)) {
        counts.record(appt.status);
    }
    counts
}

/// Appointment volume and attendance rates
pub fn operational_metrics(
    appointments: &[Appointment],
    periods: &PeriodPair,
) -> OperationalMetrics {
    let current = status_counts(appointments, &periods.current);
    let previous = status_counts(appointments, &periods.previous);

    OperationalMetrics {
        appointments: Comparison::new(current.total as f64, previous.total as f64),
        show_rate: current.show_rate(),
        cancel_rate: current.cancel_rate(),
        no_show_rate: current.no_show_rate(),
        current,
        previous,
    }
}

/// Low-stock products. Products with a zero threshold are never reported.
pub fn inventory_metrics(products: &[Product]) -> InventoryMetrics {
    let low_stock: Vec<Product> = products
        .iter()
        .filter(|p| p.is_low_stock())
        .cloned()
        .collect();

    InventoryMetrics {
        low_stock_count: low_stock.len(),
        low_stock,
        tracked_products: products.iter().filter(|p| p.minimum_stock > 0).count(),
    }
}

/// Compute the full metric bundle for a snapshot and window pair
pub fn aggregate(snapshot: &Snapshot, periods: &PeriodPair) -> MetricBundle {
    let bundle = MetricBundle {
        periods: *periods,
        financial: financial_metrics(&snapshot.transactions, periods),
        clients: client_metrics(&snapshot.clients, periods),
        operations: operational_metrics(&snapshot.appointments, periods),
        inventory: inventory_metrics(&snapshot.products),
    };

    tracing::debug!(
        income = bundle.financial.income.current,
        appointments = bundle.operations.current.total,
        new_clients = bundle.clients.new_clients.current,
        low_stock = bundle.inventory.low_stock_count,
        "Metrics aggregated"
    );

    bundle
}
