//! Config command implementation

use anyhow::Result;
use pulse_core::{DashboardConfig, NarrativeBackend, NarrativeClient};

/// Show the effective configuration, optionally probing the narrative backend
pub async fn cmd_config(config: &DashboardConfig, check: bool) -> Result<()> {
    println!();
    println!("⚙️  Pulse Configuration");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Source: {}", config.source_label());
    if let Some(path) = pulse_core::config::default_config_path() {
        println!("   Override path: {}", path.display());
    }
    println!();
    for line in config.to_toml()?.lines() {
        println!("   {}", line);
    }

    if !check {
        return Ok(());
    }

    println!();
    let client = NarrativeClient::for_backend(&config.narrative);
    print!(
        "   Checking {} backend at {} ({})... ",
        config.narrative.backend,
        client.host(),
        client.model()
    );
    if check_backend(&client).await {
        println!("✅ Connected");
    } else {
        println!("❌ Unreachable");
        println!("   Reports still work; the narrative will show as unavailable.");
    }

    Ok(())
}

pub async fn check_backend(client: &NarrativeClient) -> bool {
    let healthy = client.health_check().await;
    tracing::debug!(host = client.host(), healthy, "Narrative backend health check");
    healthy
}
