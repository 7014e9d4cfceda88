//! # API Facade
//!
//! The API layer is a **thin facade** over [`RecordStore`]. It is the entry point for
//! callers that address collections by name and exchange plain JSON, the way the
//! storefront and admin views do.
//!
//! ## Role and Responsibilities
//!
//! - **Dispatches** a collection name to the typed store operation for that entity
//! - **Converts** JSON payloads to entities and records back to JSON
//! - **Never fails**: every operation returns a [`Response`], success or failure
//! - **Records activity** in the application log (fire-and-forget)
//!
//! ## Response Shape
//!
//! ```text
//! { "success": true,  "data": <record | [records] | stats> }
//! { "success": true }                          read-by-id miss, delete
//! { "success": false, "error": "<message>" }
//! ```
//!
//! ## What the API Does NOT Do
//!
//! - **Business rules**: those live in the store and in `catalog.rs`
//! - **Presentation**: no formatting, no terminal assumptions

use serde::Serialize;
use serde_json::{json, Value};

use crate::applog::{AppLog, DEFAULT_CAPACITY};
use crate::error::{Result, StoreError};
use crate::model::{Category, Collection, Offer, Product, Shop, User};
use crate::seed::{self, SeedReport};
use crate::store::patch::json_type_name;
use crate::store::{Filter, Patch, RecordStore, StorageBackend, StoreStats};

/// Run `$body` with `$E` bound to the entity type of `$collection`.
macro_rules! with_entity {
    ($collection:expr, $E:ident => $body:expr) => {
        match $collection {
            Collection::Shops => {
                type $E = Shop;
                $body
            }
            Collection::Products => {
                type $E = Product;
                $body
            }
            Collection::Offers => {
                type $E = Offer;
                $body
            }
            Collection::Categories => {
                type $E = Category;
                $body
            }
            Collection::Users => {
                type $E = User;
                $body
            }
        }
    };
}

/// The uniform result of every API operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T> From<Result<T>> for Response<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Response::ok(data),
            Err(e) => Response::failure(e.to_string()),
        }
    }
}

impl<T> Response<T> {
    /// A missing value is still a success, just without data.
    fn from_optional(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(data)) => Response::ok(data),
            Ok(None) => Response::empty(),
            Err(e) => Response::failure(e.to_string()),
        }
    }
}

/// The main API facade.
///
/// Generic over `StorageBackend` so the same facade runs on disk or in memory.
pub struct MallApi<B: StorageBackend> {
    store: RecordStore<B>,
    app_log_capacity: usize,
}

impl<B: StorageBackend> MallApi<B> {
    /// Wrap an opened store. Demo data seeded while opening is recorded in the
    /// application log.
    pub fn new(store: RecordStore<B>) -> Self {
        let api = Self {
            store,
            app_log_capacity: DEFAULT_CAPACITY,
        };
        api.record_seed(api.store.open_seed_report());
        api
    }

    pub fn with_app_log_capacity(mut self, capacity: usize) -> Self {
        self.app_log_capacity = capacity;
        self
    }

    pub fn store(&self) -> &RecordStore<B> {
        &self.store
    }

    pub fn app_log(&self) -> AppLog<'_, B> {
        AppLog::new(self.store.backend()).with_capacity(self.app_log_capacity)
    }

    pub fn create(&mut self, collection: &str, data: Value) -> Response<Value> {
        let result = parse_collection(collection).and_then(|c| {
            with_entity!(c, E => {
                let entity: E = from_payload(data)?;
                let record = self.store.create(entity)?;
                Ok(serde_json::to_value(record)?)
            })
        });
        self.audit(&result, || format!("Created new {} item", collection), || {
            format!("Failed to create {}", collection)
        });
        result.into()
    }

    pub fn read(&self, collection: &str, id: Option<&str>) -> Response<Value> {
        let result: Result<Option<Value>> = parse_collection(collection).and_then(|c| {
            with_entity!(c, E => {
                match id {
                    Some(id) => match self.store.read::<E>(id)? {
                        Some(record) => Ok(Some(serde_json::to_value(record)?)),
                        None => Ok(None),
                    },
                    None => Ok(Some(serde_json::to_value(self.store.read_all::<E>()?)?)),
                }
            })
        });
        Response::from_optional(result)
    }

    pub fn update(&mut self, collection: &str, id: &str, patch: Value) -> Response<Value> {
        let result = parse_collection(collection).and_then(|c| {
            let patch = Patch::from_value(patch)?;
            with_entity!(c, E => {
                let record = self.store.update::<E>(id, &patch)?;
                Ok(serde_json::to_value(record)?)
            })
        });
        self.audit(&result, || format!("Updated {} item", collection), || {
            format!("Failed to update {}", collection)
        });
        result.into()
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> Response<Value> {
        let result = parse_collection(collection).and_then(|c| {
            with_entity!(c, E => self.store.delete::<E>(id))
        });
        self.audit(&result, || format!("Deleted {} item", collection), || {
            format!("Failed to delete {}", collection)
        });
        Response::from_optional(result.map(|()| None))
    }

    pub fn query(&self, collection: &str, filter: &Filter) -> Response<Value> {
        let result = parse_collection(collection).and_then(|c| {
            with_entity!(c, E => Ok(serde_json::to_value(self.store.query::<E>(filter)?)?))
        });
        result.into()
    }

    pub fn stats(&self) -> Response<StoreStats> {
        self.store.stats().into()
    }

    /// Seed demo data unless the sentinel is already set.
    ///
    /// When opening the store already seeded, that report is returned (once) instead
    /// of running the seeder again.
    pub fn seed(&mut self) -> Response<SeedReport> {
        let pending = self.store.take_open_seed_report();
        if pending.seeded {
            return Response::ok(pending);
        }

        let mut rng = rand::rng();
        let result = seed::seed_demo_data(&mut self.store, &mut rng, chrono::Utc::now());
        match &result {
            Ok(report) => self.record_seed(report),
            Err(e) => self.app_log().error(
                "Failed to seed demo data",
                json!({ "error": e.to_string() }),
            ),
        }
        result.into()
    }

    fn record_seed(&self, report: &SeedReport) {
        if !report.seeded {
            return;
        }
        self.app_log().info(
            "Demo data seeded",
            json!({
                "shops": report.shops,
                "products": report.products,
                "offers": report.offers,
                "categories": report.categories,
            }),
        );
    }

    fn audit<T>(
        &self,
        result: &Result<T>,
        ok_message: impl FnOnce() -> String,
        err_message: impl FnOnce() -> String,
    ) {
        let log = self.app_log();
        match result {
            Ok(_) => log.info(&ok_message(), Value::Null),
            Err(e) => log.error(&err_message(), json!({ "error": e.to_string() })),
        }
    }
}

fn parse_collection(name: &str) -> Result<Collection> {
    name.parse()
}

fn from_payload<E: serde::de::DeserializeOwned>(data: Value) -> Result<E> {
    if !data.is_object() {
        return Err(StoreError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            json_type_name(&data)
        )));
    }
    serde_json::from_value(data).map_err(|e| StoreError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applog::LogLevel;
    use crate::store::mem_backend::MemBackend;
    use serde_json::json;

    fn api() -> MallApi<MemBackend> {
        MallApi::new(RecordStore::open_unseeded(MemBackend::new()).unwrap())
    }

    fn shop_payload(name: &str) -> Value {
        json!({
            "name": name,
            "description": "Fresh bakes",
            "category": "cat_3",
            "floor": "Ground Floor",
            "location": "Shop No. 7, Wing A",
            "contactNumber": "+91-90001007",
            "contactEmail": "bakery@supermall.test",
            "image": "",
            "isActive": true
        })
    }

    #[test]
    fn create_then_read_by_id() {
        let mut api = api();
        let created = api.create("shops", shop_payload("Bakery"));
        assert!(created.success);
        let record = created.data.unwrap();
        let id = record["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("shops_"));
        assert_eq!(record["createdAt"], record["updatedAt"]);

        let read = api.read("shops", Some(&id));
        assert_eq!(read.data.unwrap()["name"], "Bakery");
    }

    #[test]
    fn create_ignores_caller_supplied_id() {
        let mut api = api();
        let mut payload = shop_payload("Bakery");
        payload["id"] = json!("shops_mine");
        let record = api.create("shops", payload).data.unwrap();
        assert_ne!(record["id"], "shops_mine");
    }

    #[test]
    fn read_miss_is_empty_success() {
        let api = api();
        let response = api.read("shops", Some("shops_nope"));
        assert!(response.success);
        assert!(response.data.is_none());
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({"success": true}));
    }

    #[test]
    fn update_miss_is_failure() {
        let mut api = api();
        let response = api.update("offers", "offers_nope", json!({"discount": 5}));
        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("Item not found"));
    }

    #[test]
    fn delete_twice_succeeds() {
        let mut api = api();
        let id = api.create("shops", shop_payload("Tmp")).data.unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(api.delete("shops", &id).success);
        assert!(api.delete("shops", &id).success);
        assert!(api.read("shops", Some(&id)).data.is_none());
    }

    #[test]
    fn unknown_collection_and_bad_payload_fail_cleanly() {
        let mut api = api();
        let response = api.read("carts", None);
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Unknown collection: carts"));

        assert!(!api.create("shops", json!([1, 2, 3])).success);
        assert!(!api.create("shops", json!({"name": "No floor"})).success);
        assert!(!api.update("shops", "x", json!("str")).success);
    }

    #[test]
    fn query_by_collection_name() {
        let mut api = api();
        api.create("shops", shop_payload("A"));
        let mut other = shop_payload("B");
        other["floor"] = json!("Third Floor");
        api.create("shops", other);

        let response = api.query("shops", &Filter::new().eq("floor", "Third Floor"));
        let data = response.data.unwrap();
        assert_eq!(data.as_array().unwrap().len(), 1);
        assert_eq!(data[0]["name"], "B");
    }

    #[test]
    fn mutations_are_recorded_in_app_log() {
        let mut api = api();
        api.create("shops", shop_payload("Logged"));
        api.update("shops", "shops_missing", json!({"name": "x"}));

        let entries = api.app_log().entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Created new shops item");
        assert_eq!(entries[1].level, LogLevel::Error);
    }

    #[test]
    fn seed_reports_once() {
        let mut api = api();
        assert!(api.seed().data.unwrap().seeded);
        assert!(!api.seed().data.unwrap().seeded);
        let stats = api.stats().data.unwrap();
        assert_eq!(stats.total_shops, 600);

        let seeded_entries: Vec<_> = api
            .app_log()
            .entries()
            .unwrap()
            .into_iter()
            .filter(|e| e.message == "Demo data seeded")
            .collect();
        assert_eq!(seeded_entries.len(), 1);
        assert_eq!(seeded_entries[0].context["shops"], 600);
    }

    #[test]
    fn seeding_done_while_opening_is_reported_and_logged_once() {
        use rand::SeedableRng;

        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let store = RecordStore::open_with_rng(MemBackend::new(), &mut rng).unwrap();
        let mut api = MallApi::new(store);

        let first = api.seed().data.unwrap();
        assert!(first.seeded);
        assert_eq!(first.offers, 700);
        assert!(!api.seed().data.unwrap().seeded);

        let entries = api.app_log().entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Demo data seeded");
    }

    #[test]
    fn reopening_a_seeded_store_logs_nothing() {
        let store = RecordStore::open(MemBackend::new()).unwrap();
        let api = MallApi::new(RecordStore::open(store.into_backend()).unwrap());
        assert!(api.app_log().entries().unwrap().is_empty());
    }
}
