//! Insight Rule Engine - deterministic findings from computed KPIs
//!
//! A fixed, ordered table of independent rules. Each rule reads the metric
//! bundle, retention and rankings (never another rule's output) and
//! contributes at most one insight per evaluation. An empty result means
//! there was nothing notable; callers show [`NOT_ENOUGH_DATA`] instead.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pulse_core::insights::{InsightEngine, InsightInputs};
//!
//! let engine = InsightEngine::new();
//! let insights = engine.evaluate(&InsightInputs {
//!     metrics: &bundle,
//!     retention: &retention,
//!     rankings: &rankings,
//! });
//! ```

pub mod engine;
pub mod types;

pub use engine::{
    builtin_rules, InsightEngine, InsightInputs, Rule, CANCEL_RATE_THRESHOLD, NOT_ENOUGH_DATA,
    NO_SHOW_RATE_THRESHOLD, PROFIT_MARGIN_THRESHOLD, RETENTION_THRESHOLD, TICKET_GROWTH_THRESHOLD,
};
pub use types::{Insight, RuleId, Severity};
