//! Core types for the Insight Rule Engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies which rule produced an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    RevenueGrowth,
    RevenueDecline,
    ClientGrowth,
    InactiveClients,
    TopService,
    HighNoShow,
    HighCancellation,
    LowRetention,
    LowProfitMargin,
    TicketGrowth,
    LowStock,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::RevenueGrowth => "revenue_growth",
            RuleId::RevenueDecline => "revenue_decline",
            RuleId::ClientGrowth => "client_growth",
            RuleId::InactiveClients => "inactive_clients",
            RuleId::TopService => "top_service",
            RuleId::HighNoShow => "high_no_show",
            RuleId::HighCancellation => "high_cancellation",
            RuleId::LowRetention => "low_retention",
            RuleId::LowProfitMargin => "low_profit_margin",
            RuleId::TicketGrowth => "ticket_growth",
            RuleId::LowStock => "low_stock",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revenue_growth" => Ok(RuleId::RevenueGrowth),
            "revenue_decline" => Ok(RuleId::RevenueDecline),
            "client_growth" => Ok(RuleId::ClientGrowth),
            "inactive_clients" => Ok(RuleId::InactiveClients),
            "top_service" => Ok(RuleId::TopService),
            "high_no_show" => Ok(RuleId::HighNoShow),
            "high_cancellation" => Ok(RuleId::HighCancellation),
            "low_retention" => Ok(RuleId::LowRetention),
            "low_profit_margin" => Ok(RuleId::LowProfitMargin),
            "ticket_growth" => Ok(RuleId::TicketGrowth),
            "low_stock" => Ok(RuleId::LowStock),
            _ => Err(format!("Unknown insight rule: {}", s)),
        }
    }
}

/// Severity level of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - no action needed
    Info,
    /// Worth attention but not urgent
    Attention,
    /// Should be addressed soon
    Warning,
    /// Requires immediate attention
    Alert,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Attention => "attention",
            Severity::Warning => "warning",
            Severity::Alert => "alert",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "attention" => Ok(Severity::Attention),
            "warning" => Ok(Severity::Warning),
            "alert" => Ok(Severity::Alert),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// A finding produced by one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub rule_id: RuleId,
    pub severity: Severity,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_id_round_trips_through_str() {
        assert_eq!(RuleId::HighNoShow.as_str(), "high_no_show");
        assert_eq!(
            RuleId::from_str("low_profit_margin").unwrap(),
            RuleId::LowProfitMargin
        );
        assert!(RuleId::from_str("unknown").is_err());
    }

    #[test]
    fn test_insight_serializes_rule_id_as_snake_case() {
        let insight = Insight {
            rule_id: RuleId::LowStock,
            severity: Severity::Warning,
            text: "2 products are at or below minimum stock".to_string(),
        };
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["rule_id"], "low_stock");
        assert_eq!(json["severity"], "warning");
    }
}
