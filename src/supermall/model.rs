//! # Domain Model: Records, Collections and Entities
//!
//! Every persisted record is a [`Stored<E>`]: the store-owned [`RecordMeta`] (`id`,
//! `createdAt`, `updatedAt`) flattened together with an entity payload `E` (a [`Shop`],
//! [`Product`], [`Offer`], [`Category`] or [`User`]). Callers only ever construct the
//! entity; the metadata is assigned by the store.
//!
//! ## Persisted Form
//!
//! Records serialize to flat JSON objects with camelCase keys:
//!
//! ```text
//! {
//!   "id": "shops_seed_1",
//!   "createdAt": "2026-10-16T07:00:00.000Z",
//!   "updatedAt": "2026-10-16T07:30:00.000Z",
//!   "name": "Shop 1 - Clothing",
//!   "floor": "First Floor",
//!   ...
//! }
//! ```
//!
//! Timestamps are ISO-8601 with millisecond precision and a `Z` suffix. The store
//! truncates every timestamp it generates to milliseconds so a value survives a
//! write/read cycle unchanged.
//!
//! ## Foreign Keys
//!
//! `Shop.category`, `Product.shop_id`, `Product.category` and `Offer.shop_id` are plain
//! strings. Nothing enforces that they resolve; see [`crate::catalog`] for lookups with
//! an "Unknown" fallback.

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// The named collections the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Shops,
    Products,
    Offers,
    Categories,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Shops,
        Collection::Products,
        Collection::Offers,
        Collection::Categories,
        Collection::Users,
    ];

    /// Storage key the collection is persisted under.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Shops => "shops",
            Collection::Products => "products",
            Collection::Offers => "offers",
            Collection::Categories => "categories",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| StoreError::UnknownCollection(s.to_string()))
    }
}

/// An entity kind that lives in exactly one collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + fmt::Debug {
    const COLLECTION: Collection;
}

/// Store-generated fields shared by every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub id: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
    pub fn new(id: impl Into<String>, at: DateTime<Utc>) -> Self {
        let at = at.trunc_subsecs(3);
        Self {
            id: id.into(),
            created_at: at,
            updated_at: at,
        }
    }

    pub fn with_times(
        id: impl Into<String>,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: created.trunc_subsecs(3),
            updated_at: updated.trunc_subsecs(3),
        }
    }
}

/// A persisted record: generated metadata plus the entity payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<E> {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub data: E,
}

impl<E> Stored<E> {
    pub fn new(meta: RecordMeta, data: E) -> Self {
        Self { meta, data }
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }
}

/// The four floors of the mall, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Floor {
    #[serde(rename = "Ground Floor")]
    Ground,
    #[serde(rename = "First Floor")]
    First,
    #[serde(rename = "Second Floor")]
    Second,
    #[serde(rename = "Third Floor")]
    Third,
}

impl Floor {
    pub const ALL: [Floor; 4] = [Floor::Ground, Floor::First, Floor::Second, Floor::Third];

    pub fn name(&self) -> &'static str {
        match self {
            Floor::Ground => "Ground Floor",
            Floor::First => "First Floor",
            Floor::Second => "Second Floor",
            Floor::Third => "Third Floor",
        }
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Floor {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Floor::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| StoreError::InvalidPayload(format!("unknown floor '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Category id.
    pub category: String,
    pub floor: Floor,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Entity for Shop {
    const COLLECTION: Collection = Collection::Shops;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub shop_id: String,
    /// Category id.
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub features: String,
}

impl Entity for Product {
    const COLLECTION: Collection = Collection::Products;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub shop_id: String,
    /// Percent off, 0..=100.
    pub discount: u8,
    #[serde(with = "iso_millis")]
    pub valid_from: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub valid_until: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Offer {
    /// Whether the offer window contains `at`.
    pub fn is_running_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && at <= self.valid_until
    }
}

impl Entity for Offer {
    const COLLECTION: Collection = Collection::Offers;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Entity for Category {
    const COLLECTION: Collection = Collection::Categories;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Customer,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub name: String,
    pub user_type: UserType,
}

impl Entity for User {
    const COLLECTION: Collection = Collection::Users;
}

fn default_true() -> bool {
    true
}

/// Current time truncated to the precision records are persisted with.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Serde adapter for `2026-10-16T08:00:00.000Z` style timestamps.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, h, 0, 0).unwrap()
    }

    #[test]
    fn collection_names_round_trip_through_from_str() {
        for c in Collection::ALL {
            assert_eq!(c.key().parse::<Collection>().unwrap(), c);
        }
        assert!("carts".parse::<Collection>().is_err());
    }

    #[test]
    fn stored_record_serializes_flat_and_camel_case() {
        let shop = Stored::new(
            RecordMeta::new("shops_1", at(8)),
            Shop {
                name: "Gadget Hub".into(),
                description: String::new(),
                category: "cat_1".into(),
                floor: Floor::Second,
                location: "Wing B".into(),
                contact_number: "+91-90001234".into(),
                contact_email: "hub@supermall.test".into(),
                image: String::new(),
                is_active: true,
            },
        );

        let value = serde_json::to_value(&shop).unwrap();
        assert_eq!(value["id"], "shops_1");
        assert_eq!(value["createdAt"], "2026-10-16T08:00:00.000Z");
        assert_eq!(value["floor"], "Second Floor");
        assert_eq!(value["contactNumber"], "+91-90001234");
        assert_eq!(value["isActive"], true);
    }

    #[test]
    fn stored_record_parses_and_defaults_optional_fields() {
        let raw = json!({
            "id": "products_9",
            "createdAt": "2026-10-16T08:00:00.000Z",
            "updatedAt": "2026-10-16T09:00:00.000Z",
            "name": "Kettle",
            "price": 24.99,
            "shopId": "shops_1",
            "category": "cat_4"
        });
        let product: Stored<Product> = serde_json::from_value(raw).unwrap();
        assert_eq!(product.id(), "products_9");
        assert_eq!(product.meta.updated_at, at(9));
        assert_eq!(product.data.features, "");
        assert!((product.data.price - 24.99).abs() < f64::EPSILON);
    }

    #[test]
    fn offer_window() {
        let offer = Offer {
            title: "10% off".into(),
            description: String::new(),
            shop_id: "shops_1".into(),
            discount: 10,
            valid_from: at(8),
            valid_until: at(12),
            is_active: true,
        };
        assert!(offer.is_running_at(at(10)));
        assert!(offer.is_running_at(at(12)));
        assert!(!offer.is_running_at(at(13)));
    }

    #[test]
    fn floors_parse_case_insensitively() {
        assert_eq!("ground floor".parse::<Floor>().unwrap(), Floor::Ground);
        assert!("Basement".parse::<Floor>().is_err());
    }
}
