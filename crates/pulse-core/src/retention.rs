//! Client retention and visit cadence
//!
//! Retention compares the cohort of clients who visited in the previous
//! window against those who visited in the current one. Cancelled
//! appointments never count as visits. Inputs are the full appointment
//! history; windowing happens here.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::percent;
use crate::models::{Appointment, Client};
use crate::period::{Period, PeriodPair};

/// Clients without a visit in this many days count as inactive
pub const INACTIVE_CLIENT_DAYS: i64 = 60;

/// Retention and cadence for one evaluation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetentionMetrics {
    /// Share of previous-window visitors who returned, in [0, 100]
    pub retention_rate: f64,
    pub previous_visitors: usize,
    pub current_visitors: usize,
    pub retained_clients: usize,
    /// Mean days between consecutive visits across all clients
    pub average_visit_interval_days: f64,
    /// Clients with no recorded visit or none within [`INACTIVE_CLIENT_DAYS`]
    pub inactive_clients: usize,
}

/// Distinct client ids with at least one non-cancelled appointment in `period`
pub fn visitors(appointments: &[Appointment], period: &Period) -> HashSet<String> {
    appointments
        .iter()
        .filter(|a| a.status.is_visit() && period.contains(a.start_time))
        .filter_map(|a| a.client_id.clone())
        .collect()
}

/// `|prev ∩ cur| / |prev| × 100`, or 0 when the previous cohort is empty
pub fn retention_rate(previous: &HashSet<String>, current: &HashSet<String>) -> f64 {
    let retained = previous.intersection(current).count();
    percent(retained as f64, previous.len() as f64)
}

/// Average gap in days between consecutive visits of the same client.
///
/// Gaps from every client are pooled before averaging; 0 when no client
/// has two or more visits.
pub fn average_visit_interval_days(appointments: &[Appointment]) -> f64 {
    let mut visits_by_client: BTreeMap<&str, Vec<DateTime<Utc>>> = BTreeMap::new();
    for appt in appointments.iter().filter(|a| a.status.is_visit()) {
        if let Some(client_id) = appt.client_id.as_deref() {
            visits_by_client
                .entry(client_id)
                .or_default()
                .push(appt.start_time);
        }
    }

    let mut total_days = 0.0;
    let mut gaps = 0usize;
    for visits in visits_by_client.values_mut() {
        visits.sort();
        for pair in visits.windows(2) {
            total_days += (pair[1] - pair[0]).num_seconds() as f64 / 86_400.0;
            gaps += 1;
        }
    }

    crate::metrics::ratio(total_days, gaps as f64)
}

/// Clients whose last visit is missing or older than the inactivity threshold
pub fn inactive_clients(clients: &[Client], now: DateTime<Utc>) -> usize {
    let cutoff = now - Duration::days(INACTIVE_CLIENT_DAYS);
    clients
        .iter()
        .filter(|c| match c.last_visit {
            None => true,
            Some(last) => last < cutoff,
        })
        .count()
}

/// Compute retention, cadence and inactivity for a window pair
pub fn compute(
    appointments: &[Appointment],
    clients: &[Client],
    periods: &PeriodPair,
    now: DateTime<Utc>,
) -> RetentionMetrics {
    let previous = visitors(appointments, &periods.previous);
    let current = visitors(appointments, &periods.current);

    let metrics = RetentionMetrics {
        retention_rate: retention_rate(&previous, &current),
        previous_visitors: previous.len(),
        current_visitors: current.len(),
        retained_clients: previous.intersection(&current).count(),
        average_visit_interval_days: average_visit_interval_days(appointments),
        inactive_clients: inactive_clients(clients, now),
    };

    tracing::debug!(
        retention = metrics.retention_rate,
        previous_visitors = metrics.previous_visitors,
        current_visitors = metrics.current_visitors,
        inactive = metrics.inactive_clients,
        "Retention computed"
    );

    metrics
}
