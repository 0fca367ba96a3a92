//! Dashboard orchestration
//!
//! Ties the pipeline together: resolve the period, load one snapshot, then
//! compute metrics, retention, rankings and insights synchronously. The
//! narrative is not part of the report; callers request it afterwards from
//! [`DashboardReport::narrative_request`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::insights::{Insight, InsightEngine, InsightInputs, NOT_ENOUGH_DATA};
use crate::metrics::{aggregate, MetricBundle};
use crate::models::Snapshot;
use crate::narrative::NarrativeRequest;
use crate::period::{PeriodPair, PeriodSelector};
use crate::ranking::{rank_all, Rankings};
use crate::retention::{self, RetentionMetrics};
use crate::store::RecordStore;

/// Everything shown on the dashboard for one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub periods: PeriodPair,
    pub metrics: MetricBundle,
    pub retention: RetentionMetrics,
    pub rankings: Rankings,
    pub insights: Vec<Insight>,
    /// Records the report was computed from
    pub record_count: usize,
}

impl DashboardReport {
    /// Insight texts, or the not-enough-data line when nothing fired
    pub fn insight_lines(&self) -> Vec<&str> {
        if self.insights.is_empty() {
            vec![NOT_ENOUGH_DATA]
        } else {
            self.insights.iter().map(|i| i.text.as_str()).collect()
        }
    }

    /// Flat summary sent to the narrative generator
    pub fn narrative_request(&self) -> NarrativeRequest {
        let mut request = NarrativeRequest::new();

        request.insert(
            "period.from",
            self.periods
                .current
                .from
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        request.insert(
            "period.to",
            self.periods
                .current
                .to
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );

        for (key, value) in self.metrics.to_flat_map() {
            request.insert(key, value);
        }

        let r = &self.retention;
        request.insert("retention.rate", r.retention_rate);
        request.insert("retention.previous_visitors", r.previous_visitors as f64);
        request.insert("retention.current_visitors", r.current_visitors as f64);
        request.insert(
            "retention.average_visit_interval_days",
            r.average_visit_interval_days,
        );
        request.insert("retention.inactive_clients", r.inactive_clients as f64);

        if let Some(top) = self.rankings.clients.first() {
            request.insert("rankings.top_client", top.entity.name.as_str());
        }
        if let Some(top) = self.rankings.top_service() {
            request.insert("rankings.top_service", top.entity.name.as_str());
        }
        if let Some(top) = self.rankings.staff.first() {
            request.insert("rankings.top_staff", top.entity.name.as_str());
        }
        if let Some(top) = self.rankings.products.first() {
            request.insert("rankings.top_product", top.entity.name.as_str());
        }

        for insight in &self.insights {
            request.insert(format!("insights.{}", insight.rule_id), insight.text.as_str());
        }

        request
    }
}

/// Compute a report from an in-memory snapshot
///
/// Pure: the same snapshot, periods and `now` always give the same report.
pub fn build_report(
    snapshot: &Snapshot,
    periods: &PeriodPair,
    now: DateTime<Utc>,
    config: &DashboardConfig,
) -> DashboardReport {
    let metrics = aggregate(snapshot, periods);
    let retention = retention::compute(&snapshot.appointments, &snapshot.clients, periods, now);
    let rankings = rank_all(snapshot, &periods.current, config.report.ranking_limit);

    let insights = InsightEngine::new().evaluate(&InsightInputs {
        metrics: &metrics,
        retention: &retention,
        rankings: &rankings,
    });

    DashboardReport {
        generated_at: now,
        periods: *periods,
        metrics,
        retention,
        rankings,
        insights,
        record_count: snapshot.record_count(),
    }
}

/// Resolve the period, read the store once and build the report
///
/// An invalid range fails before the store is touched.
pub async fn load_report(
    store: &dyn RecordStore,
    selector: PeriodSelector,
    now: DateTime<Utc>,
    config: &DashboardConfig,
) -> Result<DashboardReport> {
    let periods = selector.resolve(now)?;
    let snapshot = Snapshot::load(store).await;
    let report = build_report(&snapshot, &periods, now, config);

    tracing::info!(
        period = %selector,
        records = report.record_count,
        income = report.metrics.financial.income.current,
        insights = report.insights.len(),
        "Report built"
    );

    Ok(report)
}
