//! Record store boundary
//!
//! The engine only ever reads from a [`RecordStore`]. One evaluation issues
//! all collection reads at once, waits for every one of them, and then works
//! on the resulting in-memory [`Snapshot`] without touching the store again.
//!
//! Absent collections are empty, not errors. A read that fails outright is
//! logged and also treated as empty so one broken collection never blocks
//! the rest of the report.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{
    Appointment, Client, Product, Sale, SaleLine, Service, Snapshot, Staff, Transaction,
};

/// Read-only provider of business records
///
/// Each method returns `Ok(None)` when the collection does not exist.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn transactions(&self) -> Result<Option<Vec<Transaction>>>;
    async fn appointments(&self) -> Result<Option<Vec<Appointment>>>;
    async fn clients(&self) -> Result<Option<Vec<Client>>>;
    async fn staff(&self) -> Result<Option<Vec<Staff>>>;
    async fn products(&self) -> Result<Option<Vec<Product>>>;
    async fn services(&self) -> Result<Option<Vec<Service>>>;
    async fn sale_lines(&self) -> Result<Option<Vec<SaleLine>>>;
    async fn sales(&self) -> Result<Option<Vec<Sale>>>;
}

fn collection<T>(name: &str, result: Result<Option<Vec<T>>>) -> Vec<T> {
    match result {
        Ok(Some(items)) => items,
        Ok(None) => {
            tracing::debug!(collection = name, "Collection absent, treating as empty");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(collection = name, error = %e, "Failed to read collection, treating as empty");
            Vec::new()
        }
    }
}

impl Snapshot {
    /// Read every collection concurrently and assemble an owned snapshot
    pub async fn load(store: &dyn RecordStore) -> Snapshot {
        let (transactions, appointments, clients, staff, products, services, sale_lines, sales) = tokio::join!(
            store.transactions(),
            store.appointments(),
            store.clients(),
            store.staff(),
            store.products(),
            store.services(),
            store.sale_lines(),
            store.sales(),
        );

        let snapshot = Snapshot {
            transactions: collection("transactions", transactions),
            appointments: collection("appointments", appointments),
            clients: collection("clients", clients),
            staff: collection("staff", staff),
            products: collection("products", products),
            services: collection("services", services),
            sale_lines: collection("sale_lines", sale_lines),
            sales: collection("sales", sales),
        };

        tracing::debug!(records = snapshot.record_count(), "Snapshot loaded");
        snapshot
    }
}

/// An in-memory snapshot is its own store
#[async_trait]
impl RecordStore for Snapshot {
    async fn transactions(&self) -> Result<Option<Vec<Transaction>>> {
        Ok(Some(self.transactions.clone()))
    }

    async fn appointments(&self) -> Result<Option<Vec<Appointment>>> {
        Ok(Some(self.appointments.clone()))
    }

    async fn clients(&self) -> Result<Option<Vec<Client>>> {
        Ok(Some(self.clients.clone()))
    }

    async fn staff(&self) -> Result<Option<Vec<Staff>>> {
        Ok(Some(self.staff.clone()))
    }

    async fn products(&self) -> Result<Option<Vec<Product>>> {
        Ok(Some(self.products.clone()))
    }

    async fn services(&self) -> Result<Option<Vec<Service>>> {
        Ok(Some(self.services.clone()))
    }

    async fn sale_lines(&self) -> Result<Option<Vec<SaleLine>>> {
        Ok(Some(self.sale_lines.clone()))
    }

    async fn sales(&self) -> Result<Option<Vec<Sale>>> {
        Ok(Some(self.sales.clone()))
    }
}

/// Snapshot exported as a single JSON document
///
/// The document is an object with one array per collection:
///
/// ```json
/// {
///   "transactions": [{"id": "t1", "date": "2026-03-01T10:00:00Z", "amount": 120.0, "kind": "income"}],
///   "clients": [],
///   "products": []
/// }
/// ```
///
/// Missing keys (or `null`) are absent collections. Elements that fail to
/// deserialize are skipped with a warning.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: Option<PathBuf>,
    document: serde_json::Map<String, Value>,
}

impl JsonFileStore {
    /// Read and parse a snapshot file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let mut store = Self::from_json(&content)?;
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Parse a snapshot document held in memory
    pub fn from_json(content: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(content)? {
            Value::Object(document) => Ok(Self {
                path: None,
                document,
            }),
            _ => Err(Error::InvalidData(
                "Snapshot document must be a JSON object".to_string(),
            )),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>> {
        let items = match self.document.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(Error::InvalidData(format!(
                    "Collection '{}' must be an array",
                    key
                )))
            }
        };

        let mut records = Vec::with_capacity(items.len());
        let mut skipped = 0usize;
        for (idx, item) in items.iter().enumerate() {
            match serde_json::from_value::<T>(item.clone()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(collection = key, index = idx, error = %e, "Skipping malformed record");
                }
            }
        }

        if skipped > 0 {
            tracing::info!(
                collection = key,
                loaded = records.len(),
                skipped,
                "Loaded collection with skipped records"
            );
        }

        Ok(Some(records))
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn transactions(&self) -> Result<Option<Vec<Transaction>>> {
        self.read("transactions")
    }

    async fn appointments(&self) -> Result<Option<Vec<Appointment>>> {
        self.read("appointments")
    }

    async fn clients(&self) -> Result<Option<Vec<Client>>> {
        self.read("clients")
    }

    async fn staff(&self) -> Result<Option<Vec<Staff>>> {
        self.read("staff")
    }

    async fn products(&self) -> Result<Option<Vec<Product>>> {
        self.read("products")
    }

    async fn services(&self) -> Result<Option<Vec<Service>>> {
        self.read("services")
    }

    async fn sale_lines(&self) -> Result<Option<Vec<SaleLine>>> {
        self.read("sale_lines")
    }

    async fn sales(&self) -> Result<Option<Vec<Sale>>> {
        self.read("sales")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;
    use std::io::Write;

    const DOCUMENT: &str = r#"{
        "transactions": [
            {"id": "t1", "date": "2026-03-01T10:00:00Z", "amount": 120.0, "kind": "income", "method": "card"},
            {"id": "broken", "date": "not a date", "amount": 5.0, "kind": "income"},
            {"id": "t2", "date": "2026-03-02T10:00:00Z", "amount": 30.0, "kind": "expense"}
        ],
        "clients": [
            {"id": "c1", "name": "Ana", "created_at": "2026-01-05T09:00:00Z", "total_spent": 450.0}
        ],
        "products": null
    }"#;

    /// A store whose reads always fail
    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn transactions(&self) -> Result<Option<Vec<Transaction>>> {
            Err(Error::InvalidData("connection reset".into()))
        }
        async fn appointments(&self) -> Result<Option<Vec<Appointment>>> {
            Ok(None)
        }
        async fn clients(&self) -> Result<Option<Vec<Client>>> {
            Err(Error::InvalidData("permission denied".into()))
        }
        async fn staff(&self) -> Result<Option<Vec<Staff>>> {
            Ok(Some(vec![Staff {
                id: "s1".into(),
                name: "Bia".into(),
            }]))
        }
        async fn products(&self) -> Result<Option<Vec<Product>>> {
            Ok(None)
        }
        async fn services(&self) -> Result<Option<Vec<Service>>> {
            Ok(None)
        }
        async fn sale_lines(&self) -> Result<Option<Vec<SaleLine>>> {
            Ok(None)
        }
        async fn sales(&self) -> Result<Option<Vec<Sale>>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_json_store_skips_malformed_records() {
        let store = JsonFileStore::from_json(DOCUMENT).unwrap();
        let snapshot = Snapshot::load(&store).await;

        assert_eq!(snapshot.transactions.len(), 2);
        assert_eq!(snapshot.transactions[0].id, "t1");
        assert_eq!(snapshot.transactions[1].kind, TransactionKind::Expense);
        assert_eq!(snapshot.clients.len(), 1);
        assert!(snapshot.products.is_empty());
        assert!(snapshot.appointments.is_empty());
    }

    #[tokio::test]
    async fn test_json_store_rejects_non_array_collection() {
        let store = JsonFileStore::from_json(r#"{"sales": {"id": "s1"}}"#).unwrap();
        assert!(store.sales().await.is_err());

        // The load itself still succeeds with an empty collection
        let snapshot = Snapshot::load(&store).await;
        assert!(snapshot.sales.is_empty());
    }

    #[test]
    fn test_json_store_requires_object_document() {
        let err = JsonFileStore::from_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert!(JsonFileStore::from_json("{not json").is_err());
    }

    #[tokio::test]
    async fn test_json_store_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let store = JsonFileStore::open(file.path()).await.unwrap();
        assert_eq!(store.path(), Some(file.path()));
        assert_eq!(store.transactions().await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_json_store_open_missing_file() {
        let err = JsonFileStore::open("/nonexistent/pulse/snapshot.json")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_failed_reads_become_empty_collections() {
        let snapshot = Snapshot::load(&BrokenStore).await;

        assert!(snapshot.transactions.is_empty());
        assert!(snapshot.clients.is_empty());
        assert_eq!(snapshot.staff.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_its_own_store() {
        let original = Snapshot::load(&JsonFileStore::from_json(DOCUMENT).unwrap()).await;
        let copy = Snapshot::load(&original).await;
        assert_eq!(copy, original);
    }
}
