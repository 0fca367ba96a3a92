//! Report command implementations (report, insights, top)

use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use pulse_core::insights::Severity;
use pulse_core::{
    load_report, Comparison, DashboardConfig, DashboardReport, JsonFileStore, NarrativeClient,
    NarrativeOutcome, PeriodSelector,
};

use super::truncate;
use crate::cli::{ReportArgs, TopKind};

const RULE: &str = "   ─────────────────────────────────────────────────────────────";

/// Parse an RFC 3339 instant or a plain date (midnight UTC)
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (use RFC 3339 or YYYY-MM-DD)", value))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

/// Turn --period/--from/--to into a selector
pub fn resolve_selector(args: &ReportArgs) -> Result<PeriodSelector> {
    match (args.from.as_deref(), args.to.as_deref()) {
        (Some(from), Some(to)) => Ok(PeriodSelector::Custom {
            from: parse_instant(from).context("Invalid --from")?,
            to: parse_instant(to).context("Invalid --to")?,
        }),
        (None, None) => {
            if args.period.eq_ignore_ascii_case("custom") {
                bail!("--period custom requires --from and --to");
            }
            args.period.parse().map_err(anyhow::Error::msg)
        }
        _ => bail!("--from and --to must be given together"),
    }
}

/// Load the snapshot named in `args` and build the report
pub async fn build(args: &ReportArgs, config: &DashboardConfig) -> Result<DashboardReport> {
    let selector = resolve_selector(args)?;
    let now = match args.now.as_deref() {
        Some(now) => parse_instant(now).context("Invalid --now")?,
        None => Utc::now(),
    };

    // Reject bad ranges before touching the snapshot file
    selector.resolve(now).context("Invalid period")?;

    let store = JsonFileStore::open(&args.snapshot)
        .await
        .with_context(|| format!("Failed to open snapshot {}", args.snapshot.display()))?;

    load_report(&store, selector, now, config)
        .await
        .context("Failed to build report")
}

pub async fn cmd_report(args: &ReportArgs, config: &DashboardConfig, narrative: bool) -> Result<()> {
    write_report(&mut std::io::stdout(), args, config, narrative).await
}

/// Write the report, then the narrative when one is requested.
///
/// The report is written and flushed before the narrative backend is
/// contacted. With `--json` and a narrative the output is two JSON lines,
/// `{"report": ...}` followed by `{"narrative": ...}`.
pub async fn write_report<W: Write>(
    out: &mut W,
    args: &ReportArgs,
    config: &DashboardConfig,
    narrative: bool,
) -> Result<()> {
    let report = build(args, config).await?;

    let mut narrative_config = config.narrative.clone();
    narrative_config.enabled |= narrative;
    let client = NarrativeClient::from_config(&narrative_config);

    match (args.json, client.is_some()) {
        (true, true) => writeln!(
            out,
            "{}",
            serde_json::to_string(&serde_json::json!({ "report": report }))?
        )?,
        (true, false) => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
        (false, _) => writeln!(out, "{}", render_report(&report))?,
    }
    out.flush()?;

    let client = match client {
        Some(client) => client,
        None => return Ok(()),
    };

    let outcome = client
        .narrate(&report.narrative_request(), narrative_config.timeout())
        .await;

    if args.json {
        writeln!(
            out,
            "{}",
            serde_json::to_string(&serde_json::json!({ "narrative": outcome }))?
        )?;
    } else {
        writeln!(out, "{}", render_narrative(&outcome))?;
    }
    out.flush()?;

    Ok(())
}

pub async fn cmd_insights(args: &ReportArgs, config: &DashboardConfig) -> Result<()> {
    let report = build(args, config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.insights)?);
    } else {
        println!("{}", render_insights(&report));
    }

    Ok(())
}

pub async fn cmd_top(
    kind: TopKind,
    limit: Option<usize>,
    args: &ReportArgs,
    config: &DashboardConfig,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(limit) = limit {
        if limit == 0 {
            bail!("--limit must be at least 1");
        }
        config.report.ranking_limit = limit;
    }

    let report = build(args, &config).await?;

    if args.json {
        let rankings = &report.rankings;
        let json = match kind {
            TopKind::Clients => serde_json::to_string_pretty(&rankings.clients)?,
            TopKind::Services => serde_json::to_string_pretty(&rankings.services)?,
            TopKind::Staff => serde_json::to_string_pretty(&rankings.staff)?,
            TopKind::Products => serde_json::to_string_pretty(&rankings.products)?,
        };
        println!("{}", json);
    } else {
        println!("{}", render_top(&report, kind));
    }

    Ok(())
}

fn date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

fn growth(value: &Comparison) -> String {
    format!("{:+.1}%", value.growth)
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "💡",
        Severity::Attention => "👀",
        Severity::Warning => "⚠️ ",
        Severity::Alert => "🚨",
    }
}

fn header(report: &DashboardReport, title: &str) -> Vec<String> {
    let current = &report.periods.current;
    let previous = &report.periods.previous;
    vec![
        String::new(),
        title.to_string(),
        format!("   Period: {} → {}", date(&current.from), date(&current.to)),
        format!(
            "   Compared with: {} → {}",
            date(&previous.from),
            date(&previous.to)
        ),
        RULE.to_string(),
    ]
}

/// Human-readable dashboard
pub fn render_report(report: &DashboardReport) -> String {
    let mut lines = header(report, "📊 Dashboard");
    let f = &report.metrics.financial;

    lines.push("   💰 Financial".to_string());
    lines.push(format!(
        "      Income:          {:>12.2}  ({})",
        f.income.current,
        growth(&f.income)
    ));
    lines.push(format!(
        "      Expenses:        {:>12.2}  ({})",
        f.expense.current,
        growth(&f.expense)
    ));
    lines.push(format!(
        "      Profit:          {:>12.2}  ({})",
        f.profit.current,
        growth(&f.profit)
    ));
    lines.push(format!(
        "      Profit margin:   {:>11.1}%",
        f.profit_margin.current
    ));
    lines.push(format!(
        "      Average ticket:  {:>12.2}  ({})",
        f.average_ticket.current,
        growth(&f.average_ticket)
    ));

    let c = &report.metrics.clients;
    let r = &report.retention;
    lines.push(String::new());
    lines.push("   👥 Clients".to_string());
    lines.push(format!(
        "      New clients:     {:>12}  ({})",
        c.new_clients.current as u64,
        growth(&c.new_clients)
    ));
    lines.push(format!("      Total clients:   {:>12}", c.total_clients));
    lines.push(format!(
        "      Retention:       {:>11.1}%  ({} of {} returned)",
        r.retention_rate, r.retained_clients, r.previous_visitors
    ));
    lines.push(format!(
        "      Visit interval:  {:>8.1} days",
        r.average_visit_interval_days
    ));
    lines.push(format!("      Inactive:        {:>12}", r.inactive_clients));

    let o = &report.metrics.operations;
    lines.push(String::new());
    lines.push("   📅 Appointments".to_string());
    lines.push(format!(
        "      Scheduled:       {:>12}  ({})",
        o.current.total,
        growth(&o.appointments)
    ));
    lines.push(format!(
        "      Completed:       {:>12}  ({:.1}%)",
        o.current.completed, o.show_rate
    ));
    lines.push(format!(
        "      Cancelled:       {:>12}  ({:.1}%)",
        o.current.cancelled, o.cancel_rate
    ));
    lines.push(format!(
        "      No-show:         {:>12}  ({:.1}%)",
        o.current.no_show, o.no_show_rate
    ));

    let inv = &report.metrics.inventory;
    lines.push(String::new());
    lines.push("   📦 Inventory".to_string());
    if inv.low_stock.is_empty() {
        lines.push(format!(
            "      No low stock ({} tracked products)",
            inv.tracked_products
        ));
    } else {
        for p in &inv.low_stock {
            lines.push(format!(
                "      {:28} {:>4} / min {}",
                truncate(&p.name, 28),
                p.stock_quantity,
                p.minimum_stock
            ));
        }
    }

    lines.push(String::new());
    lines.push("   🏆 Highlights".to_string());
    let rankings = &report.rankings;
    let highlight = |label: &str, name: Option<&str>| {
        format!("      {:16} {}", label, name.unwrap_or("-"))
    };
    lines.push(highlight(
        "Top client:",
        rankings.clients.first().map(|r| r.entity.name.as_str()),
    ));
    lines.push(highlight(
        "Top service:",
        rankings.top_service().map(|r| r.entity.name.as_str()),
    ));
    lines.push(highlight(
        "Top staff:",
        rankings.staff.first().map(|r| r.entity.name.as_str()),
    ));
    lines.push(highlight(
        "Top product:",
        rankings.products.first().map(|r| r.entity.name.as_str()),
    ));

    lines.push(String::new());
    lines.push("   Insights".to_string());
    lines.extend(insight_lines(report));

    lines.join("\n")
}

fn insight_lines(report: &DashboardReport) -> Vec<String> {
    if report.insights.is_empty() {
        return report
            .insight_lines()
            .into_iter()
            .map(|line| format!("      {}", line))
            .collect();
    }
    report
        .insights
        .iter()
        .map(|i| format!("      {} {}", severity_icon(i.severity), i.text))
        .collect()
}

/// Insights only
pub fn render_insights(report: &DashboardReport) -> String {
    let mut lines = header(report, "💡 Insights");
    lines.extend(insight_lines(report));
    lines.join("\n")
}

/// One ranking as a table
pub fn render_top(report: &DashboardReport, kind: TopKind) -> String {
    let rankings = &report.rankings;
    let (title, columns, rows): (&str, (&str, &str), Vec<(String, String, String)>) = match kind {
        TopKind::Clients => (
            "🏆 Top clients",
            ("Spent", ""),
            rankings
                .clients
                .iter()
                .map(|r| {
                    (
                        r.entity.name.clone(),
                        format!("{:.2}", r.entity.total_spent),
                        String::new(),
                    )
                })
                .collect(),
        ),
        TopKind::Services => (
            "🏆 Top services",
            ("Completed", "Revenue"),
            rankings
                .services
                .iter()
                .map(|r| {
                    (
                        r.entity.name.clone(),
                        r.entity.appointments.to_string(),
                        format!("{:.2}", r.entity.revenue),
                    )
                })
                .collect(),
        ),
        TopKind::Staff => (
            "🏆 Top staff",
            ("Sales", "Revenue"),
            rankings
                .staff
                .iter()
                .map(|r| {
                    (
                        r.entity.name.clone(),
                        r.entity.sales.to_string(),
                        format!("{:.2}", r.entity.revenue),
                    )
                })
                .collect(),
        ),
        TopKind::Products => (
            "🏆 Top products",
            ("Units", "Revenue"),
            rankings
                .products
                .iter()
                .map(|r| {
                    (
                        r.entity.name.clone(),
                        format!("{:.0}", r.entity.units_sold),
                        format!("{:.2}", r.entity.revenue),
                    )
                })
                .collect(),
        ),
    };

    let mut lines = header(report, title);
    if rows.is_empty() {
        lines.push("   Nothing to rank in this period.".to_string());
        return lines.join("\n");
    }

    lines.push(format!(
        "   {:>2}  {:30} │ {:>10} │ {:>10}",
        "#", "Name", columns.0, columns.1
    ));
    for (idx, (name, first, second)) in rows.iter().enumerate() {
        lines.push(format!(
            "   {:>2}  {:30} │ {:>10} │ {:>10}",
            idx + 1,
            truncate(name, 30),
            first,
            second
        ));
    }

    lines.join("\n")
}

pub fn render_narrative(outcome: &NarrativeOutcome) -> String {
    let mut lines = vec![String::new(), "   📝 Narrative".to_string(), RULE.to_string()];
    lines.push(format!("   {}", outcome.text()));
    lines.join("\n")
}
