//! Pulse Core Library
//!
//! Business metrics and insights for a small service business:
//! - Period resolution (current window plus the comparison window)
//! - Record store boundary with concurrent snapshot loading
//! - KPI aggregation, retention and rankings
//! - Deterministic insight rules
//! - Optional narrative commentary from a local generator (Ollama)
//! - Layered configuration

pub mod config;
pub mod dashboard;
pub mod error;
pub mod insights;
pub mod metrics;
pub mod models;
pub mod narrative;
pub mod period;
pub mod ranking;
pub mod retention;
pub mod store;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{DashboardConfig, NarrativeBackendKind, NarrativeConfig, ReportConfig};
pub use dashboard::{build_report, load_report, DashboardReport};
pub use error::{Error, Result};
pub use insights::{Insight, InsightEngine, RuleId, Severity, NOT_ENOUGH_DATA};
pub use metrics::{Comparison, MetricBundle};
pub use models::{
    Appointment, AppointmentStatus, Client, Product, Sale, SaleLine, SaleStatus, Service,
    Snapshot, Staff, Transaction, TransactionKind,
};
pub use narrative::{
    NarrativeBackend, NarrativeClient, NarrativeOutcome, NarrativeRequest, NarrativeValue,
    NARRATIVE_UNAVAILABLE,
};
pub use period::{Period, PeriodPair, PeriodSelector};
pub use ranking::{Ranked, Rankings};
pub use retention::RetentionMetrics;
pub use store::{JsonFileStore, RecordStore};
