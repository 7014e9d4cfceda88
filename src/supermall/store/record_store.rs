use super::backend::StorageBackend;
use super::patch::Patch;
use super::query::Filter;
use super::stats::StoreStats;
use crate::error::{Result, StoreError};
use crate::model::{
    now_millis, Category, Collection, Entity, Offer, Product, RecordMeta, Shop, Stored,
};
use crate::seed::{self, SeedReport};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde_json::{Map, Value};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Sentinel key marking that demo data has been written.
pub const SEED_SENTINEL_KEY: &str = "demoDataSeeded_v1";

/// Typed CRUD and query operations over the collections held by a backend.
///
/// Construct it once at startup and hand it to whoever needs it.
pub struct RecordStore<B: StorageBackend> {
    pub(crate) backend: B,
    /// Outcome of the seeding done while opening, until someone takes it.
    open_seed: SeedReport,
}

impl<B: StorageBackend> RecordStore<B> {
    /// Wrap a backend as-is. Nothing is initialized or seeded.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            open_seed: SeedReport::default(),
        }
    }

    /// Open the store: initialize missing collections, then seed demo data once.
    pub fn open(backend: B) -> Result<Self> {
        let mut rng = rand::rng();
        Self::open_with_rng(backend, &mut rng)
    }

    /// Like [`RecordStore::open`], drawing demo-data randomness from `rng`.
    pub fn open_with_rng<R: Rng>(backend: B, rng: &mut R) -> Result<Self> {
        let mut store = Self::open_unseeded(backend)?;
        store.open_seed = seed::seed_demo_data(&mut store, rng, Utc::now())?;
        info!(seeded = store.open_seed.seeded, "Record store initialized");
        Ok(store)
    }

    /// Open the store and initialize missing collections without seeding.
    pub fn open_unseeded(backend: B) -> Result<Self> {
        let store = Self::with_backend(backend);
        store.initialize()?;
        Ok(store)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// What opening the store seeded. A store that found the sentinel already set
    /// (or was opened unseeded) reports `seeded: false`.
    pub fn open_seed_report(&self) -> &SeedReport {
        &self.open_seed
    }

    /// Hand over the open-time seed report, leaving an unseeded one behind so it is
    /// reported only once.
    pub fn take_open_seed_report(&mut self) -> SeedReport {
        std::mem::take(&mut self.open_seed)
    }

    /// Create every collection whose key is absent. Existing collections are left
    /// untouched, even when empty.
    pub fn initialize(&self) -> Result<()> {
        let now = now_millis();
        for collection in Collection::ALL {
            if self.backend.get_item(collection.key())?.is_some() {
                continue;
            }
            let initial = match collection {
                Collection::Categories => serde_json::to_string(&seed::default_categories(now))?,
                Collection::Users => serde_json::to_string(&seed::default_users(now))?,
                _ => "[]".to_string(),
            };
            self.backend.set_item(collection.key(), &initial)?;
            debug!(collection = %collection, "initialized collection");
        }
        Ok(())
    }

    pub fn is_seeded(&self) -> Result<bool> {
        Ok(self
            .backend
            .get_item(SEED_SENTINEL_KEY)?
            .is_some_and(|v| !v.is_empty()))
    }

    pub(crate) fn mark_seeded(&self) -> Result<()> {
        self.backend.set_item(SEED_SENTINEL_KEY, "true")
    }

    fn load_raw(&self, collection: Collection) -> Result<Vec<Value>> {
        match self.backend.get_item(collection.key())? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn load<E: Entity>(&self) -> Result<Vec<Stored<E>>> {
        match self.backend.get_item(E::COLLECTION.key())? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the whole collection with `records`.
    pub(crate) fn save<E: Entity>(&self, records: &[Stored<E>]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.backend.set_item(E::COLLECTION.key(), &raw)
    }

    pub fn create<E: Entity>(&mut self, data: E) -> Result<Stored<E>> {
        let collection = E::COLLECTION;
        let result = (|| -> Result<Stored<E>> {
            let mut records = self.load::<E>()?;
            let id = fresh_id(collection, &records);
            let record = Stored::new(RecordMeta::new(id, now_millis()), data);
            records.push(record.clone());
            self.save(&records)?;
            Ok(record)
        })();

        match &result {
            Ok(record) => info!(collection = %collection, id = %record.id(), "Created new item"),
            Err(e) => error!(collection = %collection, error = %e, "Failed to create item"),
        }
        result
    }

    /// All records of the collection, in insertion order.
    pub fn read_all<E: Entity>(&self) -> Result<Vec<Stored<E>>> {
        let collection = E::COLLECTION;
        let records = self.load::<E>().inspect_err(|e| {
            error!(collection = %collection, error = %e, "Failed to read collection");
        })?;
        debug!(collection = %collection, count = records.len(), "Read all items");
        Ok(records)
    }

    /// A single record, or `None` when no record has that id.
    pub fn read<E: Entity>(&self, id: &str) -> Result<Option<Stored<E>>> {
        let collection = E::COLLECTION;
        let records = self.load::<E>().inspect_err(|e| {
            error!(collection = %collection, error = %e, "Failed to read collection");
        })?;
        debug!(collection = %collection, id, "Read item");
        Ok(records.into_iter().find(|r| r.id() == id))
    }

    /// Shallow-merge `patch` over the record with `id`.
    ///
    /// `id` and `createdAt` are always preserved and `updatedAt` always moves forward,
    /// whatever the patch contains.
    pub fn update<E: Entity>(&mut self, id: &str, patch: &Patch) -> Result<Stored<E>> {
        let collection = E::COLLECTION;
        let result = (|| -> Result<Stored<E>> {
            let mut records = self.load::<E>()?;
            let record = records
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or_else(|| StoreError::NotFound {
                    collection,
                    id: id.to_string(),
                })?;

            let mut fields = match serde_json::to_value(&record.data)? {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            patch.apply_to(&mut fields);
            record.data = serde_json::from_value(Value::Object(fields))?;
            record.meta.updated_at = next_stamp(record.meta.updated_at);

            let updated = record.clone();
            self.save(&records)?;
            Ok(updated)
        })();

        match &result {
            Ok(_) => info!(collection = %collection, id, "Updated item"),
            Err(e) => error!(collection = %collection, id, error = %e, "Failed to update item"),
        }
        result
    }

    /// Remove the record with `id`. Removing an absent id still succeeds.
    pub fn delete<E: Entity>(&mut self, id: &str) -> Result<()> {
        let collection = E::COLLECTION;
        let result = (|| -> Result<()> {
            let mut records = self.load::<E>()?;
            records.retain(|r| r.id() != id);
            self.save(&records)
        })();

        match &result {
            Ok(()) => info!(collection = %collection, id, "Deleted item"),
            Err(e) => error!(collection = %collection, id, error = %e, "Failed to delete item"),
        }
        result
    }

    /// Records matching every clause of `filter`, in insertion order.
    pub fn query<E: Entity>(&self, filter: &Filter) -> Result<Vec<Stored<E>>> {
        let collection = E::COLLECTION;
        let result = (|| -> Result<Vec<Stored<E>>> {
            let mut matched = Vec::new();
            for value in self.load_raw(collection)? {
                let keep = match &value {
                    Value::Object(map) => filter.matches(map),
                    _ => false,
                };
                if keep {
                    matched.push(serde_json::from_value::<Stored<E>>(value)?);
                }
            }
            Ok(matched)
        })();

        match &result {
            Ok(records) => debug!(
                collection = %collection,
                fields = ?filter.fields().collect::<Vec<_>>(),
                result_count = records.len(),
                "Queried collection"
            ),
            Err(e) => error!(collection = %collection, error = %e, "Failed to query collection"),
        }
        result
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let result = (|| -> Result<StoreStats> {
            let shops = self.load::<Shop>()?;
            let products = self.load::<Product>()?;
            let offers = self.load::<Offer>()?;
            let categories = self.load::<Category>()?;
            Ok(StoreStats::compute(&shops, &products, &offers, &categories))
        })();

        match &result {
            Ok(stats) => debug!(?stats, "Retrieved database statistics"),
            Err(e) => error!(error = %e, "Failed to get stats"),
        }
        result
    }
}

fn fresh_id<E>(collection: Collection, existing: &[Stored<E>]) -> String {
    loop {
        let id = format!("{}_{}", collection, Uuid::new_v4().simple());
        if existing.iter().all(|r| r.id() != id) {
            return id;
        }
    }
}

/// Current time, or one millisecond past `prev` when the clock has not moved on.
fn next_stamp(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_millis();
    if now > prev {
        now
    } else {
        prev + Duration::milliseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Floor, User};
    use crate::store::mem_backend::MemBackend;
    use crate::store::query::Predicate;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn store() -> RecordStore<MemBackend> {
        RecordStore::open_unseeded(MemBackend::new()).unwrap()
    }

    fn shop(name: &str, floor: Floor) -> Shop {
        Shop {
            name: name.into(),
            description: format!("{} description", name),
            category: "cat_1".into(),
            floor,
            location: "Wing A".into(),
            contact_number: "+91-90001001".into(),
            contact_email: "shop@supermall.test".into(),
            image: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn open_keeps_the_seed_report_once() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let mut store = RecordStore::open_with_rng(MemBackend::new(), &mut rng).unwrap();
        assert!(store.open_seed_report().seeded);
        assert_eq!(store.open_seed_report().shops, 600);

        assert!(store.take_open_seed_report().seeded);
        assert!(!store.take_open_seed_report().seeded);

        let reopened = RecordStore::open_with_rng(store.into_backend(), &mut rng).unwrap();
        assert!(!reopened.open_seed_report().seeded);
    }

    #[test]
    fn initialize_creates_default_collections() {
        let store = store();
        assert!(store.read_all::<Shop>().unwrap().is_empty());
        assert_eq!(store.read_all::<Category>().unwrap().len(), 5);
        assert_eq!(store.read_all::<User>().unwrap().len(), 2);
        assert!(!store.is_seeded().unwrap());
    }

    #[test]
    fn initialize_keeps_existing_collections() {
        let backend = MemBackend::new();
        backend.insert_raw("categories", "[]");
        let store = RecordStore::open_unseeded(backend).unwrap();
        assert!(store.read_all::<Category>().unwrap().is_empty());
    }

    #[test]
    fn create_assigns_prefixed_unique_ids_and_timestamps() {
        let mut store = store();
        let mut ids = HashSet::new();
        for i in 0..20 {
            let created = store.create(shop(&format!("S{}", i), Floor::Ground)).unwrap();
            assert!(created.id().starts_with("shops_"));
            assert_eq!(created.meta.created_at, created.meta.updated_at);
            assert!(ids.insert(created.id().to_string()));
        }
        assert_eq!(store.read_all::<Shop>().unwrap().len(), 20);
    }

    #[test]
    fn read_all_preserves_insertion_order() {
        let mut store = store();
        for name in ["b", "a", "c"] {
            store.create(shop(name, Floor::First)).unwrap();
        }
        let names: Vec<_> = store
            .read_all::<Shop>()
            .unwrap()
            .into_iter()
            .map(|s| s.data.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn read_returns_copies() {
        let mut store = store();
        let created = store.create(shop("Original", Floor::First)).unwrap();

        let mut all = store.read_all::<Shop>().unwrap();
        all[0].data.name = "Mutated".into();

        let fresh = store.read::<Shop>(created.id()).unwrap().unwrap();
        assert_eq!(fresh.data.name, "Original");
    }

    #[test]
    fn read_missing_id_is_empty_success() {
        let store = store();
        assert!(store.read::<Shop>("shops_nope").unwrap().is_none());
    }

    #[test]
    fn update_merges_and_preserves_identity() {
        let mut store = store();
        let created = store.create(shop("Before", Floor::Ground)).unwrap();

        let patch = Patch::new()
            .set("name", "After")
            .set("id", "shops_other")
            .set("createdAt", "2000-01-01T00:00:00.000Z");
        let updated = store.update::<Shop>(created.id(), &patch).unwrap();

        assert_eq!(updated.data.name, "After");
        assert_eq!(updated.data.floor, Floor::Ground);
        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.meta.created_at, created.meta.created_at);
        assert!(updated.meta.updated_at > created.meta.updated_at);

        let read_back = store.read::<Shop>(created.id()).unwrap().unwrap();
        assert_eq!(read_back, updated);
    }

    #[test]
    fn repeated_updates_keep_moving_updated_at_forward() {
        let mut store = store();
        let created = store.create(shop("S", Floor::Ground)).unwrap();
        let mut last = created.meta.updated_at;
        for i in 0..5 {
            let patch = Patch::new().set("location", format!("Wing {}", i));
            let updated = store.update::<Shop>(created.id(), &patch).unwrap();
            assert!(updated.meta.updated_at > last);
            last = updated.meta.updated_at;
        }
    }

    #[test]
    fn update_missing_id_is_not_found() {
        let mut store = store();
        let err = store
            .update::<Shop>("shops_nope", &Patch::new().set("name", "x"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_with_ill_typed_field_fails_and_keeps_record() {
        let mut store = store();
        let created = store.create(shop("S", Floor::Ground)).unwrap();
        let err = store
            .update::<Shop>(created.id(), &Patch::new().set("floor", "Basement"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert_eq!(
            store.read::<Shop>(created.id()).unwrap().unwrap().data.floor,
            Floor::Ground
        );
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = store();
        let created = store.create(shop("S", Floor::Ground)).unwrap();

        store.delete::<Shop>(created.id()).unwrap();
        assert!(store.read::<Shop>(created.id()).unwrap().is_none());
        store.delete::<Shop>(created.id()).unwrap();
    }

    #[test]
    fn delete_keeps_other_records() {
        let mut store = store();
        let a = store.create(shop("A", Floor::Ground)).unwrap();
        let b = store.create(shop("B", Floor::Ground)).unwrap();
        store.delete::<Shop>(a.id()).unwrap();

        let remaining = store.read_all::<Shop>().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), b.id());
    }

    #[test]
    fn query_equals_returns_matching_subsequence() {
        let mut store = store();
        store.create(shop("A", Floor::Ground)).unwrap();
        store.create(shop("B", Floor::Third)).unwrap();
        store.create(shop("C", Floor::Ground)).unwrap();

        let ground = store
            .query::<Shop>(&Filter::new().eq("floor", "Ground Floor"))
            .unwrap();
        let names: Vec<_> = ground.iter().map(|s| s.data.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn query_empty_filter_equals_read_all() {
        let mut store = store();
        store.create(shop("A", Floor::Ground)).unwrap();
        store.create(shop("B", Floor::Third)).unwrap();

        assert_eq!(
            store.query::<Shop>(&Filter::new()).unwrap(),
            store.read_all::<Shop>().unwrap()
        );
    }

    #[test]
    fn query_custom_predicate() {
        let mut store = store();
        store.create(shop("Alpha", Floor::Ground)).unwrap();
        store.create(shop("Beta", Floor::Ground)).unwrap();

        let filter = Filter::new().with(
            "name",
            Predicate::custom(|v| v.as_str().is_some_and(|s| s.starts_with('B'))),
        );
        let found = store.query::<Shop>(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].data.name, "Beta");
    }

    #[test]
    fn quota_exceeded_surfaces_as_storage_error_and_keeps_data() {
        let backend = MemBackend::new().with_quota(2_500);
        let mut store = RecordStore::open_unseeded(backend).unwrap();
        store.create(shop("First", Floor::Ground)).unwrap();

        let mut last_err = None;
        for i in 0..50 {
            if let Err(e) = store.create(shop(&format!("Filler {}", i), Floor::Ground)) {
                last_err = Some(e);
                break;
            }
        }
        let err = last_err.expect("quota should eventually be exceeded");
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));

        let shops = store.read_all::<Shop>().unwrap();
        assert_eq!(shops[0].data.name, "First");
    }

    #[test]
    fn corrupt_collection_is_a_storage_error() {
        let backend = MemBackend::new();
        let store = RecordStore::open_unseeded(backend).unwrap();
        store.backend().insert_raw("shops", "{not json");

        let err = store.read_all::<Shop>().unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(store.stats().is_err());
    }

    #[test]
    fn write_error_fails_create() {
        let mut store = store();
        store.backend().set_simulate_write_error(true);
        assert!(store.create(shop("S", Floor::Ground)).is_err());
        store.backend().set_simulate_write_error(false);
        assert!(store.read_all::<Shop>().unwrap().is_empty());
    }

    #[test]
    fn stats_count_active_offers_only() {
        let mut store = store();
        store.create(shop("A", Floor::Second)).unwrap();
        let now = now_millis();
        for active in [true, false, true] {
            store
                .create(Offer {
                    title: "Deal".into(),
                    description: String::new(),
                    shop_id: "shops_x".into(),
                    discount: 10,
                    valid_from: now,
                    valid_until: now + Duration::days(3),
                    is_active: active,
                })
                .unwrap();
        }

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_shops, 1);
        assert_eq!(stats.total_offers, 2);
        assert_eq!(stats.total_categories, 5);
        assert_eq!(stats.shops_by_floor[&Floor::Second], 1);
    }
}
