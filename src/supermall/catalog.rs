//! # Catalog Helpers
//!
//! Read-side helpers shared by every listing: foreign-key lookups, the filter/sort
//! options of the shop, product and offer listings, product comparison and the
//! per-floor insights of the admin dashboard.
//!
//! ## Lookups
//!
//! Foreign keys are advisory, so lookups never fail. A shop or category id that does
//! not resolve renders as [`UNKNOWN`] (or [`UNKNOWN_SHOP`] on storefront cards).
//!
//! ## Listings
//!
//! Field-level conditions (equality on a foreign key, the active flag, title search,
//! expiry) are pushed into a [`Filter`] and evaluated by [`RecordStore::query`]. Sorting
//! happens afterwards; the sort is stable, so ties keep insertion order.
//!
//! The storefront shop search spans two fields (name or description). A [`Filter`] is
//! conjunctive per field, so that search runs over the query result instead.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Result, StoreError};
use crate::model::{Category, Floor, Offer, Product, Shop, Stored};
use crate::store::{Filter, RecordStore, StorageBackend};

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_SHOP: &str = "Unknown Shop";
/// Shown for a compared product without a feature list.
pub const NOT_AVAILABLE: &str = "N/A";
/// Name of a floor's top category when that category no longer exists.
pub const MIXED: &str = "Mixed";

pub fn shop_name<'a>(shops: &'a [Stored<Shop>], id: &str) -> &'a str {
    shops
        .iter()
        .find(|s| s.id() == id)
        .map(|s| s.data.name.as_str())
        .unwrap_or(UNKNOWN)
}

pub fn category_name<'a>(categories: &'a [Stored<Category>], id: &str) -> &'a str {
    categories
        .iter()
        .find(|c| c.id() == id)
        .map(|c| c.data.name.as_str())
        .unwrap_or(UNKNOWN)
}

/// Case-insensitive substring match on a string field.
fn contains_ci(term: &str) -> impl Fn(&Value) -> bool + 'static {
    let needle = term.to_lowercase();
    move |v| v.as_str().is_some_and(|s| s.to_lowercase().contains(&needle))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopSort {
    NameAsc,
    NameDesc,
    Newest,
}

impl FromStr for ShopSort {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "name-asc" => Ok(ShopSort::NameAsc),
            "name-desc" => Ok(ShopSort::NameDesc),
            "newest" => Ok(ShopSort::Newest),
            other => Err(StoreError::InvalidPayload(format!(
                "unknown shop sort '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShopFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub floor: Option<Floor>,
    pub sort: Option<ShopSort>,
    /// Storefront view: active shops only, and the search also looks at the
    /// description.
    pub storefront: bool,
}

impl ShopFilter {
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if self.storefront {
            filter = filter.eq("isActive", true);
        } else if let Some(term) = non_empty(&self.search) {
            filter = filter.matching("name", contains_ci(term));
        }
        if let Some(category) = non_empty(&self.category) {
            filter = filter.eq("category", category);
        }
        if let Some(floor) = self.floor {
            filter = filter.eq("floor", floor.name());
        }
        filter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl FromStr for ProductSort {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "name-asc" => Ok(ProductSort::NameAsc),
            "name-desc" => Ok(ProductSort::NameDesc),
            "price-asc" => Ok(ProductSort::PriceAsc),
            "price-desc" => Ok(ProductSort::PriceDesc),
            other => Err(StoreError::InvalidPayload(format!(
                "unknown product sort '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub shop: Option<String>,
    pub sort: Option<ProductSort>,
}

impl ProductFilter {
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(term) = non_empty(&self.search) {
            filter = filter.matching("name", contains_ci(term));
        }
        if let Some(category) = non_empty(&self.category) {
            filter = filter.eq("category", category);
        }
        if let Some(shop) = non_empty(&self.shop) {
            filter = filter.eq("shopId", shop);
        }
        filter
    }
}

pub fn list_products<B: StorageBackend>(
    store: &RecordStore<B>,
    options: &ProductFilter,
) -> Result<Vec<Stored<Product>>> {
    let mut products = store.query::<Product>(&options.to_filter())?;
    match options.sort {
        Some(ProductSort::NameAsc) => products.sort_by(|a, b| a.data.name.cmp(&b.data.name)),
        Some(ProductSort::NameDesc) => products.sort_by(|a, b| b.data.name.cmp(&a.data.name)),
        Some(ProductSort::PriceAsc) => products.sort_by(|a, b| cmp_f64(a.data.price, b.data.price)),
        Some(ProductSort::PriceDesc) => {
            products.sort_by(|a, b| cmp_f64(b.data.price, a.data.price))
        }
        None => {}
    }
    Ok(products)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferSort {
    DiscountDesc,
    DiscountAsc,
    Newest,
    EndingSoon,
}

impl FromStr for OfferSort {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "discount-desc" => Ok(OfferSort::DiscountDesc),
            "discount-asc" => Ok(OfferSort::DiscountAsc),
            "newest" => Ok(OfferSort::Newest),
            "ending-soon" => Ok(OfferSort::EndingSoon),
            other => Err(StoreError::InvalidPayload(format!(
                "unknown offer sort '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    pub search: Option<String>,
    pub shop: Option<String>,
    pub sort: Option<OfferSort>,
    /// Storefront view: active offers that have not expired. Admin listings leave
    /// this off and see everything.
    pub current_only: bool,
}

impl OfferFilter {
    pub fn to_filter(&self, now: DateTime<Utc>) -> Filter {
        let mut filter = Filter::new();
        if self.current_only {
            filter = filter.eq("isActive", true).matching("validUntil", move |v| {
                v.as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .is_some_and(|until| until.with_timezone(&Utc) >= now)
            });
        }
        if let Some(term) = non_empty(&self.search) {
            filter = filter.matching("title", contains_ci(term));
        }
        if let Some(shop) = non_empty(&self.shop) {
            filter = filter.eq("shopId", shop);
        }
        filter
    }
}

pub fn list_offers<B: StorageBackend>(
    store: &RecordStore<B>,
    options: &OfferFilter,
    now: DateTime<Utc>,
) -> Result<Vec<Stored<Offer>>> {
    let mut offers = store.query::<Offer>(&options.to_filter(now))?;
    match options.sort {
        Some(OfferSort::DiscountDesc) => {
            offers.sort_by(|a, b| b.data.discount.cmp(&a.data.discount))
        }
        Some(OfferSort::DiscountAsc) => {
            offers.sort_by(|a, b| a.data.discount.cmp(&b.data.discount))
        }
        Some(OfferSort::Newest) => offers.sort_by(|a, b| b.meta.created_at.cmp(&a.meta.created_at)),
        Some(OfferSort::EndingSoon) => {
            offers.sort_by(|a, b| a.data.valid_until.cmp(&b.data.valid_until))
        }
        None => {}
    }
    Ok(offers)
}

pub fn list_shops<B: StorageBackend>(
    store: &RecordStore<B>,
    options: &ShopFilter,
) -> Result<Vec<Stored<Shop>>> {
    let mut shops = store.query::<Shop>(&options.to_filter())?;
    if options.storefront {
        if let Some(term) = non_empty(&options.search) {
            let needle = term.to_lowercase();
            shops.retain(|s| {
                s.data.name.to_lowercase().contains(&needle)
                    || s.data.description.to_lowercase().contains(&needle)
            });
        }
    }
    match options.sort {
        Some(ShopSort::NameAsc) => shops.sort_by(|a, b| cmp_names(&a.data.name, &b.data.name)),
        Some(ShopSort::NameDesc) => shops.sort_by(|a, b| cmp_names(&b.data.name, &a.data.name)),
        Some(ShopSort::Newest) => shops.sort_by(|a, b| b.meta.created_at.cmp(&a.meta.created_at)),
        None => {}
    }
    Ok(shops)
}

/// One column of the product comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedProduct {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub shop_name: String,
    pub features: String,
}

/// Side-by-side view of at least two products, in the order the ids were given.
///
/// Ids that do not resolve are skipped; duplicates count once.
pub fn compare_products<B: StorageBackend>(
    store: &RecordStore<B>,
    ids: &[String],
) -> Result<Vec<ComparedProduct>> {
    let mut wanted: Vec<&str> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !wanted.contains(&id) {
            wanted.push(id);
        }
    }
    if wanted.len() < 2 {
        return Err(StoreError::InvalidPayload(
            "select at least 2 products to compare".to_string(),
        ));
    }

    let products = store.read_all::<Product>()?;
    let shops = store.read_all::<Shop>()?;
    let compared = wanted
        .into_iter()
        .filter_map(|id| products.iter().find(|p| p.id() == id))
        .map(|product| ComparedProduct {
            id: product.id().to_string(),
            name: product.data.name.clone(),
            price: product.data.price,
            description: product.data.description.clone(),
            image: product.data.image.clone(),
            shop_name: shop_name(&shops, &product.data.shop_id).to_string(),
            features: match product.data.features.trim() {
                "" => NOT_AVAILABLE.to_string(),
                features => features.to_string(),
            },
        })
        .collect();
    Ok(compared)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    pub id: String,
    pub name: String,
    pub count: usize,
}

/// Dashboard card for one floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorInsight {
    pub floor: Floor,
    pub total_shops: usize,
    pub active_shops: usize,
    /// Offers count towards the floor of their shop; an offer whose shop is gone
    /// counts towards the ground floor.
    pub total_offers: usize,
    pub active_offers: usize,
    /// Shops per category id.
    pub category_breakdown: BTreeMap<String, usize>,
    pub top_category: Option<TopCategory>,
}

impl FloorInsight {
    fn new(floor: Floor) -> Self {
        Self {
            floor,
            total_shops: 0,
            active_shops: 0,
            total_offers: 0,
            active_offers: 0,
            category_breakdown: BTreeMap::new(),
            top_category: None,
        }
    }
}

/// Per-floor shop and offer counts, for floors that have any shop or offer.
pub fn floor_insights<B: StorageBackend>(store: &RecordStore<B>) -> Result<Vec<FloorInsight>> {
    let shops = store.read_all::<Shop>()?;
    let offers = store.read_all::<Offer>()?;
    let categories = store.read_all::<Category>()?;

    let mut floors: BTreeMap<Floor, FloorInsight> = BTreeMap::new();
    for shop in &shops {
        let floor = shop.data.floor;
        let insight = floors
            .entry(floor)
            .or_insert_with(|| FloorInsight::new(floor));
        insight.total_shops += 1;
        if shop.data.is_active {
            insight.active_shops += 1;
        }
        if !shop.data.category.is_empty() {
            *insight
                .category_breakdown
                .entry(shop.data.category.clone())
                .or_insert(0) += 1;
        }
    }

    for offer in &offers {
        let floor = shops
            .iter()
            .find(|s| s.id() == offer.data.shop_id)
            .map_or(Floor::Ground, |s| s.data.floor);
        let insight = floors
            .entry(floor)
            .or_insert_with(|| FloorInsight::new(floor));
        insight.total_offers += 1;
        if offer.data.is_active {
            insight.active_offers += 1;
        }
    }

    let mut insights: Vec<FloorInsight> = floors.into_values().collect();
    for insight in &mut insights {
        // Highest count wins; ties go to the smallest category id.
        insight.top_category = insight
            .category_breakdown
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(id, &count)| TopCategory {
                id: id.clone(),
                name: match category_name(&categories, id) {
                    UNKNOWN => MIXED.to_string(),
                    name => name.to_string(),
                },
                count,
            });
    }
    Ok(insights)
}

/// Active offers of one shop, for the shop detail page.
pub fn shop_offers<B: StorageBackend>(
    store: &RecordStore<B>,
    shop_id: &str,
) -> Result<Vec<Stored<Offer>>> {
    store.query::<Offer>(&Filter::new().eq("shopId", shop_id).eq("isActive", true))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn cmp_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
