//! Top-N rankings
//!
//! Every ranking is a stable descending sort: entities with equal scores
//! keep their input (first-seen) order, so repeated runs over the same
//! snapshot produce identical output.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{AppointmentStatus, SaleStatus, Snapshot};
use crate::period::Period;

/// Default ranking length
pub const DEFAULT_RANKING_LIMIT: usize = 5;

/// One ranked entity and its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked<T> {
    pub entity: T,
    pub score: f64,
}

/// Ordered, bounded ranking
pub type Ranking<T> = Vec<Ranked<T>>;

/// Stable-sort `items` descending by `score`, then keep the first `n`.
///
/// Non-finite scores count as 0.
pub fn top_n<T, F>(items: Vec<T>, score: F, n: usize) -> Ranking<T>
where
    F: Fn(&T) -> f64,
{
    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .map(|entity| {
            let score = score(&entity);
            let score = if score.is_finite() { score } else { 0.0 };
            Ranked { entity, score }
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(n);
    ranked
}

/// Accumulates per-key values while remembering first-seen order
struct OrderedTally<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V: Default> OrderedTally<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut V {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.entries.push((key.to_string(), V::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    fn into_entries(self) -> Vec<(String, V)> {
        self.entries
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRank {
    pub client_id: String,
    pub name: String,
    pub total_spent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRank {
    pub name: String,
    /// Completed appointments in the window
    pub appointments: usize,
    /// Revenue from matching service lines on paid sales in the window
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffRank {
    pub staff_id: String,
    pub name: String,
    pub sales: usize,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRank {
    pub product_id: String,
    pub name: String,
    pub units_sold: f64,
    pub revenue: f64,
}

/// All rankings for one evaluation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rankings {
    pub clients: Ranking<ClientRank>,
    pub services: Ranking<ServiceRank>,
    pub staff: Ranking<StaffRank>,
    pub products: Ranking<ProductRank>,
}

impl Rankings {
    pub fn top_service(&self) -> Option<&Ranked<ServiceRank>> {
        self.services.first()
    }
}

/// Clients by lifetime spend
pub fn top_clients(snapshot: &Snapshot, n: usize) -> Ranking<ClientRank> {
    let items: Vec<ClientRank> = snapshot
        .clients
        .iter()
        .map(|c| ClientRank {
            client_id: c.id.clone(),
            name: c.name.clone(),
            total_spent: c.total_spent,
        })
        .collect();
    top_n(items, |c| c.total_spent, n)
}

/// Ids of paid sales created inside `period`
fn paid_sales_in<'a>(snapshot: &'a Snapshot, period: &Period) -> HashSet<&'a str> {
    snapshot
        .sales
        .iter()
        .filter(|s| s.status == SaleStatus::Paid && period.contains(s.created_at))
        .map(|s| s.id.as_str())
        .collect()
}

/// Services by completed appointments in the window, with revenue
/// cross-referenced from service lines of paid sales in the same window
pub fn top_services(snapshot: &Snapshot, period: &Period, n: usize) -> Ranking<ServiceRank> {
    let mut tally: OrderedTally<usize> = OrderedTally::new();

    for appt in &snapshot.appointments {
        if appt.status != AppointmentStatus::Completed || !period.contains(appt.start_time) {
            continue;
        }
        let Some(name) = appt.service_name.as_deref() else {
            continue;
        };
        *tally.entry(name) += 1;
    }

    let service_names: HashMap<&str, &str> = snapshot
        .services
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();
    let paid = paid_sales_in(snapshot, period);

    let mut revenue_by_name: HashMap<&str, f64> = HashMap::new();
    for line in &snapshot.sale_lines {
        if !paid.contains(line.comanda_id.as_str()) {
            continue;
        }
        let Some(name) = line
            .service_id
            .as_deref()
            .and_then(|id| service_names.get(id).copied())
        else {
            continue;
        };
        *revenue_by_name.entry(name).or_default() += line.line_total();
    }

    let items: Vec<ServiceRank> = tally
        .into_entries()
        .into_iter()
        .map(|(name, appointments)| ServiceRank {
            revenue: revenue_by_name.get(name.as_str()).copied().unwrap_or(0.0),
            name,
            appointments,
        })
        .collect();

    top_n(items, |s| s.appointments as f64, n)
}

/// Staff by paid-sale totals in the window. Staff without a qualifying sale
/// are left out.
pub fn top_staff(snapshot: &Snapshot, period: &Period, n: usize) -> Ranking<StaffRank> {
    let mut tally: OrderedTally<(usize, f64)> = OrderedTally::new();

    for sale in &snapshot.sales {
        if sale.status != SaleStatus::Paid || !period.contains(sale.created_at) {
            continue;
        }
        let Some(staff_id) = sale.staff_id.as_deref() else {
            continue;
        };
        let entry = tally.entry(staff_id);
        entry.0 += 1;
        entry.1 += sale.total;
    }

    let names: HashMap<&str, &str> = snapshot
        .staff
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();

    let items: Vec<StaffRank> = tally
        .into_entries()
        .into_iter()
        .map(|(staff_id, (sales, revenue))| StaffRank {
            name: names
                .get(staff_id.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| staff_id.clone()),
            staff_id,
            sales,
            revenue,
        })
        .collect();

    top_n(items, |s| s.revenue, n)
}

/// Products by units sold on lines of paid sales in the window
pub fn top_products(snapshot: &Snapshot, period: &Period, n: usize) -> Ranking<ProductRank> {
    let paid = paid_sales_in(snapshot, period);
    let mut tally: OrderedTally<(f64, f64)> = OrderedTally::new();

    for line in &snapshot.sale_lines {
        let Some(product_id) = line.product_id.as_deref() else {
            continue;
        };
        if !paid.contains(line.comanda_id.as_str()) {
            continue;
        }
        let entry = tally.entry(product_id);
        entry.0 += line.quantity;
        entry.1 += line.line_total();
    }

    let names: HashMap<&str, &str> = snapshot
        .products
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();

    let items: Vec<ProductRank> = tally
        .into_entries()
        .into_iter()
        .map(|(product_id, (units_sold, revenue))| ProductRank {
            name: names
                .get(product_id.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| product_id.clone()),
            product_id,
            units_sold,
            revenue,
        })
        .collect();

    top_n(items, |p| p.units_sold, n)
}

/// Compute every ranking for the current window
pub fn rank_all(snapshot: &Snapshot, period: &Period, n: usize) -> Rankings {
    Rankings {
        clients: top_clients(snapshot, n),
        services: top_services(snapshot, period, n),
        staff: top_staff(snapshot, period, n),
        products: top_products(snapshot, period, n),
    }
}
