//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pulse_core::test_utils::{sample_now, sample_snapshot, sample_snapshot_json};
use pulse_core::{
    build_report, DashboardConfig, NarrativeBackendKind, NarrativeOutcome, PeriodSelector,
    Snapshot, NARRATIVE_UNAVAILABLE, NOT_ENOUGH_DATA,
};

use crate::cli::{Cli, Commands, ReportArgs, TopKind};
use crate::commands::{self, truncate};

fn args(snapshot: PathBuf) -> ReportArgs {
    ReportArgs {
        snapshot,
        period: "30d".to_string(),
        from: None,
        to: None,
        now: Some("2026-03-31T12:00:00Z".to_string()),
        json: false,
    }
}

fn sample_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(sample_snapshot_json().as_bytes()).unwrap();
    file
}

fn mock_config() -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.narrative.backend = NarrativeBackendKind::Mock;
    config
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_cli_parses_top_command() {
    let cli = Cli::try_parse_from([
        "pulse",
        "top",
        "services",
        "--snapshot",
        "data.json",
        "--limit",
        "3",
        "-p",
        "7d",
    ])
    .unwrap();

    match cli.command {
        Commands::Top { kind, limit, args } => {
            assert_eq!(kind, TopKind::Services);
            assert_eq!(limit, Some(3));
            assert_eq!(args.period, "7d");
        }
        _ => panic!("Expected top command"),
    }
}

#[test]
fn test_cli_rejects_unknown_ranking() {
    assert!(Cli::try_parse_from(["pulse", "top", "suppliers", "--snapshot", "x.json"]).is_err());
}

#[test]
fn test_cli_global_flags() {
    let cli = Cli::try_parse_from([
        "pulse",
        "report",
        "--snapshot",
        "data.json",
        "--narrative",
        "--verbose",
        "--config",
        "pulse.toml",
    ])
    .unwrap();

    assert!(cli.verbose);
    assert_eq!(cli.config, Some(PathBuf::from("pulse.toml")));
    assert!(matches!(cli.command, Commands::Report { narrative: true, .. }));
}

#[test]
fn test_parse_instant_formats() {
    let rfc = commands::parse_instant("2026-03-01T10:30:00-03:00").unwrap();
    assert_eq!(rfc.to_rfc3339(), "2026-03-01T13:30:00+00:00");

    let date = commands::parse_instant("2026-03-01").unwrap();
    assert_eq!(date.to_rfc3339(), "2026-03-01T00:00:00+00:00");

    assert!(commands::parse_instant("03/01/2026").is_err());
}

#[test]
fn test_resolve_selector() {
    let mut report_args = args(PathBuf::from("unused.json"));
    assert_eq!(
        commands::resolve_selector(&report_args).unwrap(),
        PeriodSelector::Last30Days
    );

    report_args.period = "custom".to_string();
    assert!(commands::resolve_selector(&report_args).is_err());

    report_args.from = Some("2026-03-01".to_string());
    assert!(commands::resolve_selector(&report_args).is_err());

    report_args.to = Some("2026-03-15".to_string());
    assert!(matches!(
        commands::resolve_selector(&report_args).unwrap(),
        PeriodSelector::Custom { .. }
    ));

    report_args.from = None;
    report_args.to = None;
    report_args.period = "fortnight".to_string();
    assert!(commands::resolve_selector(&report_args).is_err());
}

// ========== Rendering Tests ==========

fn sample_report() -> pulse_core::DashboardReport {
    let periods = PeriodSelector::Last30Days.resolve(sample_now()).unwrap();
    build_report(
        &sample_snapshot(),
        &periods,
        sample_now(),
        &DashboardConfig::default(),
    )
}

#[test]
fn test_render_report_sections() {
    let text = commands::render_report(&sample_report());

    assert!(text.contains("📊 Dashboard"));
    assert!(text.contains("10000.00"));
    assert!(text.contains("+25.0%"));
    assert!(text.contains("Shampoo"));
    assert!(text.contains("Haircut"));
    assert!(text.contains("No-show rate is 12.0%"));
}

#[test]
fn test_render_insights_empty() {
    let periods = PeriodSelector::Last7Days.resolve(sample_now()).unwrap();
    let report = build_report(
        &Snapshot::default(),
        &periods,
        sample_now(),
        &DashboardConfig::default(),
    );

    let text = commands::render_insights(&report);
    assert!(text.contains(NOT_ENOUGH_DATA));
}

#[test]
fn test_render_top_tables() {
    let report = sample_report();

    let staff = commands::render_top(&report, TopKind::Staff);
    let caio = staff.find("Caio").unwrap();
    let bia = staff.find("Bia").unwrap();
    assert!(caio < bia);

    let empty = build_report(
        &Snapshot::default(),
        &report.periods,
        sample_now(),
        &DashboardConfig::default(),
    );
    assert!(commands::render_top(&empty, TopKind::Products).contains("Nothing to rank"));
}

#[test]
fn test_render_narrative_unavailable() {
    let text = commands::render_narrative(&NarrativeOutcome::Unavailable);
    assert!(text.contains(NARRATIVE_UNAVAILABLE));
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("Haircut", 10), "Haircut");
    assert_eq!(truncate("Coloração completa", 10), "Coloraç...");
    assert_eq!(truncate("abcdefghij", 5), "ab...");
}

// ========== Command Tests ==========

#[tokio::test]
async fn test_build_from_snapshot_file() {
    let file = sample_file();
    let report = commands::build(&args(file.path().to_path_buf()), &DashboardConfig::default())
        .await
        .unwrap();

    assert_eq!(report, sample_report());
}

#[tokio::test]
async fn test_build_missing_snapshot() {
    let err = commands::build(
        &args(PathBuf::from("/nonexistent/pulse/snapshot.json")),
        &DashboardConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to open snapshot"));
}

#[tokio::test]
async fn test_inverted_range_fails_before_reading() {
    let mut report_args = args(PathBuf::from("/nonexistent/pulse/snapshot.json"));
    report_args.from = Some("2026-03-10".to_string());
    report_args.to = Some("2026-03-01".to_string());

    let err = commands::build(&report_args, &DashboardConfig::default())
        .await
        .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("Invalid period"));
    assert!(!message.contains("Failed to open snapshot"));
}

fn lines(output: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_report_text_then_mock_narrative() {
    let file = sample_file();
    let mut output = Vec::new();
    commands::write_report(&mut output, &args(file.path().to_path_buf()), &mock_config(), true)
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    let dashboard = text.find("📊 Dashboard").unwrap();
    let narrative = text.find("📝 Narrative").unwrap();
    assert!(dashboard < narrative);
    assert!(!text.contains(NARRATIVE_UNAVAILABLE));
}

#[tokio::test]
async fn test_report_json_lines_with_narrative() {
    let file = sample_file();
    let mut report_args = args(file.path().to_path_buf());
    report_args.json = true;

    let mut output = Vec::new();
    commands::write_report(&mut output, &report_args, &mock_config(), true)
        .await
        .unwrap();

    let docs = lines(&output);
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["report"]["metrics"]["financial"]["income"]["current"], 10_000.0);
    assert!(!docs[0]["report"]["insights"].as_array().unwrap().is_empty());
    assert!(docs[0].get("narrative").is_none());
    assert_eq!(docs[1]["narrative"]["status"], "text");
}

#[tokio::test]
async fn test_report_json_without_narrative() {
    let file = sample_file();
    let mut report_args = args(file.path().to_path_buf());
    report_args.json = true;

    let mut output = Vec::new();
    commands::write_report(&mut output, &report_args, &mock_config(), false)
        .await
        .unwrap();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["rankings"]["clients"][0]["entity"]["name"], "Ana");
    assert!(report.get("narrative").is_none());
}

#[tokio::test]
async fn test_enabled_config_requests_narrative() {
    let file = sample_file();
    let mut report_args = args(file.path().to_path_buf());
    report_args.json = true;
    let mut config = mock_config();
    config.narrative.enabled = true;

    let mut output = Vec::new();
    commands::write_report(&mut output, &report_args, &config, false)
        .await
        .unwrap();

    assert_eq!(lines(&output).len(), 2);
}

#[tokio::test]
async fn test_report_written_before_stalled_narrative() {
    // Accepts connections and never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let file = sample_file();
    let mut report_args = args(file.path().to_path_buf());
    report_args.json = true;
    let mut config = DashboardConfig::default();
    config.narrative.host = format!("http://{}", addr);
    config.narrative.timeout_secs = 30;

    let mut output = Vec::new();
    let finished = tokio::time::timeout(
        Duration::from_secs(2),
        commands::write_report(&mut output, &report_args, &config, true),
    )
    .await;

    assert!(finished.is_err());
    let docs = lines(&output);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["report"]["record_count"], sample_report().record_count);
}

#[tokio::test]
async fn test_unreachable_backend_reports_unavailable() {
    let file = sample_file();
    let mut report_args = args(file.path().to_path_buf());
    report_args.json = true;
    let mut config = DashboardConfig::default();
    config.narrative.host = "http://127.0.0.1:9".to_string();

    let mut output = Vec::new();
    commands::write_report(&mut output, &report_args, &config, true)
        .await
        .unwrap();

    let docs = lines(&output);
    assert_eq!(docs[1]["narrative"]["status"], "unavailable");
    assert!(docs[0]["report"]["insights"].is_array());
}

#[tokio::test]
async fn test_cmd_top_limit() {
    let file = sample_file();
    let report_args = args(file.path().to_path_buf());
    let config = DashboardConfig::default();

    assert!(
        commands::cmd_top(TopKind::Clients, Some(2), &report_args, &config)
            .await
            .is_ok()
    );
    assert!(
        commands::cmd_top(TopKind::Clients, Some(0), &report_args, &config)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_cmd_insights_json() {
    let file = sample_file();
    let mut report_args = args(file.path().to_path_buf());
    report_args.json = true;

    assert!(commands::cmd_insights(&report_args, &mock_config())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cmd_config_check_with_mock_backend() {
    assert!(commands::cmd_config(&mock_config(), true).await.is_ok());
    assert!(commands::cmd_config(&DashboardConfig::default(), false)
        .await
        .is_ok());
}
