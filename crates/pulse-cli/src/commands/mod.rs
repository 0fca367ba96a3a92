//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `config` - Effective configuration and narrative backend check
//! - `report` - Report, insights and ranking commands

pub mod config;
pub mod report;

// Re-export command functions for main.rs
pub use config::*;
pub use report::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
