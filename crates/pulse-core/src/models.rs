//! Domain models for Pulse
//!
//! Records are read-only inputs supplied by a [`RecordStore`](crate::store::RecordStore).
//! Optional fields default when absent so a sparse record still loads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cash-flow entry (money in or money out)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    /// Always positive; direction comes from `kind`
    pub amount: f64,
    pub kind: TransactionKind,
    /// Payment method as recorded (cash, card, pix, ...)
    #[serde(default)]
    pub method: Option<String>,
}

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
}

/// Appointment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// Everything except a cancellation counts as a visit for retention
    pub fn is_visit(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "no_show" | "noshow" | "no-show" => Ok(Self::NoShow),
            _ => Err(format!("Unknown appointment status: {}", s)),
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer of the business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_visit: Option<DateTime<Utc>>,
    /// Lifetime spend as maintained by the store
    #[serde(default)]
    pub total_spent: f64,
}

/// A staff member who performs services or closes sales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub name: String,
}

/// A stocked product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stock_quantity: i64,
    /// Reorder threshold; 0 means the product is not tracked for low stock
    #[serde(default)]
    pub minimum_stock: i64,
}

impl Product {
    /// At or below the reorder threshold. Untracked products never qualify.
    pub fn is_low_stock(&self) -> bool {
        self.minimum_stock > 0 && self.stock_quantity <= self.minimum_stock
    }
}

/// A bookable service from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
}

/// A line on a sale (comanda), referencing either a product or a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub comanda_id: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
}

impl SaleLine {
    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// A closed or open sale (comanda)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub total: f64,
    #[serde(default)]
    pub staff_id: Option<String>,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

/// Sale settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Open,
    Paid,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "paid" | "closed" => Ok(Self::Paid),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown sale status: {}", s)),
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every record collection needed for one report evaluation.
///
/// Owned and immutable for the lifetime of the evaluation; a missing
/// collection is simply empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub staff: Vec<Staff>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub sale_lines: Vec<SaleLine>,
    #[serde(default)]
    pub sales: Vec<Sale>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
            && self.appointments.is_empty()
            && self.clients.is_empty()
            && self.staff.is_empty()
            && self.products.is_empty()
            && self.services.is_empty()
            && self.sale_lines.is_empty()
            && self.sales.is_empty()
    }

    /// Total record count across collections (for logging)
    pub fn record_count(&self) -> usize {
        self.transactions.len()
            + self.appointments.len()
            + self.clients.len()
            + self.staff.len()
            + self.products.len()
            + self.services.len()
            + self.sale_lines.len()
            + self.sales.len()
    }
}
