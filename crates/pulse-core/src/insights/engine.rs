//! Insight Rule Engine - evaluates an ordered rule table against computed KPIs

use crate::metrics::MetricBundle;
use crate::ranking::Rankings;
use crate::retention::{RetentionMetrics, INACTIVE_CLIENT_DAYS};

use super::types::{Insight, RuleId, Severity};

/// No-show rate (%) above which scheduling needs attention
pub const NO_SHOW_RATE_THRESHOLD: f64 = 10.0;
/// Cancellation rate (%) above which scheduling needs attention
pub const CANCEL_RATE_THRESHOLD: f64 = 15.0;
/// Retention rate (%) below which the returning cohort is considered weak
pub const RETENTION_THRESHOLD: f64 = 40.0;
/// Profit margin (%) below which costs are flagged
pub const PROFIT_MARGIN_THRESHOLD: f64 = 30.0;
/// Average-ticket growth (%) above which the increase is called out
pub const TICKET_GROWTH_THRESHOLD: f64 = 5.0;

/// Fallback text for callers when no rule fires
pub const NOT_ENOUGH_DATA: &str = "Not enough data to generate insights for this period yet.";

/// Everything a rule may read
#[derive(Debug, Clone, Copy)]
pub struct InsightInputs<'a> {
    pub metrics: &'a MetricBundle,
    pub retention: &'a RetentionMetrics,
    pub rankings: &'a Rankings,
}

/// Predicate deciding whether a rule fires
pub type Predicate = fn(&InsightInputs<'_>) -> bool;
/// Renders the insight text for a rule that fired
pub type Template = fn(&InsightInputs<'_>) -> String;

/// One entry in the rule table
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: RuleId,
    pub severity: Severity,
    predicate: Predicate,
    template: Template,
}

impl Rule {
    pub fn new(id: RuleId, severity: Severity, predicate: Predicate, template: Template) -> Self {
        Self {
            id,
            severity,
            predicate,
            template,
        }
    }

    /// Evaluate this rule alone
    pub fn apply(&self, inputs: &InsightInputs<'_>) -> Option<Insight> {
        if !(self.predicate)(inputs) {
            return None;
        }
        Some(Insight {
            rule_id: self.id,
            severity: self.severity,
            text: (self.template)(inputs),
        })
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("severity", &self.severity)
            .finish()
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// The built-in rules in evaluation order
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleId::RevenueGrowth,
            Severity::Info,
            |i| i.metrics.financial.income.growth > 0.0,
            |i| {
                format!(
                    "Revenue grew {:.1}% compared to the previous period.",
                    i.metrics.financial.income.growth
                )
            },
        ),
        Rule::new(
            RuleId::RevenueDecline,
            Severity::Warning,
            |i| i.metrics.financial.income.growth < 0.0,
            |i| {
                format!(
                    "Revenue fell {:.1}% compared to the previous period.",
                    i.metrics.financial.income.growth.abs()
                )
            },
        ),
        Rule::new(
            RuleId::ClientGrowth,
            Severity::Info,
            |i| i.metrics.clients.new_clients.growth > 0.0,
            |i| {
                let new_clients = &i.metrics.clients.new_clients;
                format!(
                    "New clients up {:.1}% ({} this period vs {} before).",
                    new_clients.growth, new_clients.current as u64, new_clients.previous as u64
                )
            },
        ),
        Rule::new(
            RuleId::InactiveClients,
            Severity::Attention,
            |i| i.retention.inactive_clients > 0,
            |i| {
                format!(
                    "{} without a visit in over {} days. Consider a win-back campaign.",
                    plural(i.retention.inactive_clients, "client is", "clients are"),
                    INACTIVE_CLIENT_DAYS
                )
            },
        ),
        Rule::new(
            RuleId::TopService,
            Severity::Info,
            |i| i.rankings.top_service().is_some(),
            |i| match i.rankings.top_service() {
                Some(top) => format!(
                    "{} is the most booked service with {}.",
                    top.entity.name,
                    plural(
                        top.entity.appointments,
                        "completed appointment",
                        "completed appointments"
                    )
                ),
                None => String::new(),
            },
        ),
        Rule::new(
            RuleId::HighNoShow,
            Severity::Warning,
            |i| i.metrics.operations.no_show_rate > NO_SHOW_RATE_THRESHOLD,
            |i| {
                format!(
                    "No-show rate is {:.1}%, above the {}% threshold. Consider appointment reminders.",
                    i.metrics.operations.no_show_rate, NO_SHOW_RATE_THRESHOLD
                )
            },
        ),
        Rule::new(
            RuleId::HighCancellation,
            Severity::Warning,
            |i| i.metrics.operations.cancel_rate > CANCEL_RATE_THRESHOLD,
            |i| {
                format!(
                    "Cancellation rate is {:.1}%, above the {}% threshold.",
                    i.metrics.operations.cancel_rate, CANCEL_RATE_THRESHOLD
                )
            },
        ),
        Rule::new(
            RuleId::LowRetention,
            Severity::Attention,
            |i| i.retention.previous_visitors > 0 && i.retention.retention_rate < RETENTION_THRESHOLD,
            |i| {
                format!(
                    "Only {:.1}% of last period's clients returned ({} of {}), below the {}% target.",
                    i.retention.retention_rate,
                    i.retention.retained_clients,
                    i.retention.previous_visitors,
                    RETENTION_THRESHOLD
                )
            },
        ),
        Rule::new(
            RuleId::LowProfitMargin,
            Severity::Warning,
            |i| {
                i.metrics.financial.income.current > 0.0
                    && i.metrics.financial.profit_margin.current < PROFIT_MARGIN_THRESHOLD
            },
            |i| {
                format!(
                    "Profit margin is {:.1}%, below the {}% target. Review expenses.",
                    i.metrics.financial.profit_margin.current, PROFIT_MARGIN_THRESHOLD
                )
            },
        ),
        Rule::new(
            RuleId::TicketGrowth,
            Severity::Info,
            |i| i.metrics.financial.average_ticket.growth > TICKET_GROWTH_THRESHOLD,
            |i| {
                format!(
                    "Average ticket grew {:.1}% compared to the previous period.",
                    i.metrics.financial.average_ticket.growth
                )
            },
        ),
        Rule::new(
            RuleId::LowStock,
            Severity::Alert,
            |i| i.metrics.inventory.low_stock_count > 0,
            |i| {
                format!(
                    "{} at or below minimum stock.",
                    plural(
                        i.metrics.inventory.low_stock_count,
                        "product is",
                        "products are"
                    )
                )
            },
        ),
    ]
}

/// Evaluates every rule in declaration order on each call. Holds no state
/// between evaluations.
#[derive(Debug, Clone)]
pub struct InsightEngine {
    rules: Vec<Rule>,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create an engine with the built-in rule table
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    /// Fire every matching rule, in order. Empty when nothing matched.
    pub fn evaluate(&self, inputs: &InsightInputs<'_>) -> Vec<Insight> {
        let insights: Vec<Insight> = self.rules.iter().filter_map(|r| r.apply(inputs)).collect();

        tracing::debug!(
            rules = self.rules.len(),
            fired = insights.len(),
            "Insight rules evaluated"
        );

        insights
    }
}
