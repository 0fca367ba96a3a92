//! Test utilities for pulse-core
//!
//! A mock Ollama server for narrative tests and builders for a realistic
//! snapshot. Shared by unit tests, integration tests and the CLI tests.

use axum::{
    extract::Json,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

use crate::models::{
    Appointment, AppointmentStatus, Client, Product, Sale, SaleLine, SaleStatus, Service,
    Snapshot, Staff, Transaction, TransactionKind,
};

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start a server that answers every generation request
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate));
        Self::serve(app).await
    }

    /// Start a server whose generate endpoint always returns 500
    pub async fn start_failing() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate_error));
        Self::serve(app).await
    }

    async fn serve(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2026-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let indicators = request
        .prompt
        .lines()
        .filter(|l| l.starts_with("- "))
        .count();

    Json(GenerateResponse {
        model: request.model,
        response: format!(
            "The business reviewed {} indicators this period and results look steady.",
            indicators
        ),
        done: true,
    })
}

async fn handle_generate_error() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Parse an RFC 3339 timestamp
pub fn at(timestamp: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp)
        .unwrap()
        .with_timezone(&Utc)
}

/// Reference "now" used by [`sample_snapshot`]
pub fn sample_now() -> DateTime<Utc> {
    at("2026-03-31T12:00:00Z")
}

pub fn income(id: &str, date: &str, amount: f64) -> Transaction {
    Transaction {
        id: id.to_string(),
        date: at(date),
        amount,
        kind: TransactionKind::Income,
        method: Some("card".to_string()),
    }
}

pub fn expense(id: &str, date: &str, amount: f64) -> Transaction {
    Transaction {
        id: id.to_string(),
        date: at(date),
        amount,
        kind: TransactionKind::Expense,
        method: None,
    }
}

pub fn appointment(
    id: &str,
    start: DateTime<Utc>,
    status: AppointmentStatus,
    client_id: &str,
    service: &str,
) -> Appointment {
    Appointment {
        id: id.to_string(),
        start_time: start,
        status,
        client_id: Some(client_id.to_string()),
        staff_id: None,
        service_name: Some(service.to_string()),
    }
}

pub fn client(id: &str, name: &str, created_at: &str, last_visit: Option<&str>, spent: f64) -> Client {
    Client {
        id: id.to_string(),
        name: name.to_string(),
        created_at: at(created_at),
        last_visit: last_visit.map(at),
        total_spent: spent,
    }
}

pub fn product(id: &str, name: &str, stock: i64, minimum: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        stock_quantity: stock,
        minimum_stock: minimum,
    }
}

pub fn sale(id: &str, total: f64, staff_id: &str, status: SaleStatus, created_at: &str) -> Sale {
    Sale {
        id: id.to_string(),
        total,
        staff_id: Some(staff_id.to_string()),
        status,
        created_at: at(created_at),
    }
}

pub fn product_line(sale_id: &str, product_id: &str, quantity: f64, unit_price: f64) -> SaleLine {
    SaleLine {
        comanda_id: sale_id.to_string(),
        product_id: Some(product_id.to_string()),
        service_id: None,
        quantity,
        unit_price,
    }
}

pub fn service_line(sale_id: &str, service_id: &str, unit_price: f64) -> SaleLine {
    SaleLine {
        comanda_id: sale_id.to_string(),
        product_id: None,
        service_id: Some(service_id.to_string()),
        quantity: 1.0,
        unit_price,
    }
}

/// A small salon over two 30-day windows ending at [`sample_now`]
///
/// Current window: income 10000 (3 tickets), expense 6000, 25 appointments
/// (3 no-shows, 2 cancellations, 15 completed haircuts, 5 completed
/// colorings), visitors {c2, c3, c4}. Previous window: income 8000
/// (2 tickets), expense 4000, visitors {c1, c2, c3}. Two inactive clients
/// and one product below minimum stock.
pub fn sample_snapshot() -> Snapshot {
    let mut appointments = Vec::new();

    let current_start = at("2026-03-10T09:00:00Z");
    let current_clients = ["c2", "c3", "c4"];
    for i in 0..25usize {
        let status = match i {
            0..=2 => AppointmentStatus::NoShow,
            3..=4 => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Completed,
        };
        let service = if i % 4 == 0 { "Coloring" } else { "Haircut" };
        appointments.push(appointment(
            &format!("a-cur-{}", i),
            current_start + Duration::hours(i as i64),
            status,
            current_clients[i % 3],
            service,
        ));
    }

    let previous_start = at("2026-02-10T09:00:00Z");
    let previous_clients = ["c1", "c2", "c3"];
    for i in 0..10usize {
        appointments.push(appointment(
            &format!("a-prev-{}", i),
            previous_start + Duration::hours(i as i64),
            AppointmentStatus::Completed,
            previous_clients[i % 3],
            "Haircut",
        ));
    }

    Snapshot {
        transactions: vec![
            income("t1", "2026-03-05T10:00:00Z", 4000.0),
            income("t2", "2026-03-12T10:00:00Z", 3000.0),
            income("t3", "2026-03-20T10:00:00Z", 3000.0),
            expense("t4", "2026-03-15T10:00:00Z", 6000.0),
            income("t5", "2026-02-05T10:00:00Z", 4000.0),
            income("t6", "2026-02-20T10:00:00Z", 4000.0),
            expense("t7", "2026-02-10T10:00:00Z", 4000.0),
        ],
        appointments,
        clients: vec![
            client("c1", "Ana", "2025-06-01T10:00:00Z", Some("2026-01-01T10:00:00Z"), 1200.0),
            client("c2", "Bruno", "2025-09-01T10:00:00Z", Some("2026-03-25T10:00:00Z"), 900.0),
            client("c3", "Carla", "2026-02-15T10:00:00Z", Some("2026-03-28T10:00:00Z"), 300.0),
            client("c4", "Davi", "2026-03-10T10:00:00Z", Some("2026-03-29T10:00:00Z"), 150.0),
            client("c5", "Elis", "2026-03-20T10:00:00Z", None, 0.0),
        ],
        staff: vec![
            Staff {
                id: "st1".to_string(),
                name: "Bia".to_string(),
            },
            Staff {
                id: "st2".to_string(),
                name: "Caio".to_string(),
            },
        ],
        products: vec![
            product("p1", "Shampoo", 2, 5),
            product("p2", "Conditioner", 10, 0),
        ],
        services: vec![
            Service {
                id: "sv1".to_string(),
                name: "Haircut".to_string(),
            },
            Service {
                id: "sv2".to_string(),
                name: "Coloring".to_string(),
            },
        ],
        sale_lines: vec![
            service_line("s1", "sv1", 100.0),
            product_line("s1", "p1", 2.0, 25.0),
            service_line("s2", "sv2", 200.0),
            product_line("s2", "p2", 1.0, 40.0),
            product_line("s3", "p2", 10.0, 50.0),
            product_line("s4", "p1", 1.0, 80.0),
        ],
        sales: vec![
            sale("s1", 150.0, "st1", SaleStatus::Paid, "2026-03-10T15:00:00Z"),
            sale("s2", 240.0, "st2", SaleStatus::Paid, "2026-03-12T15:00:00Z"),
            sale("s3", 500.0, "st2", SaleStatus::Cancelled, "2026-03-13T15:00:00Z"),
            sale("s4", 80.0, "st1", SaleStatus::Paid, "2026-02-10T15:00:00Z"),
        ],
    }
}

/// The sample snapshot as a JSON document readable by `JsonFileStore`
pub fn sample_snapshot_json() -> String {
    serde_json::to_string_pretty(&sample_snapshot()).unwrap()
}
