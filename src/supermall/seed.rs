//! # Demo Data
//!
//! Default collections and the one-time bulk seeding of a synthetic catalog.
//!
//! ## Seeding Contract
//!
//! [`seed_demo_data`] checks the `demoDataSeeded_v1` sentinel before doing any work.
//! When it is set, seeding is a no-op. Otherwise the whole dataset is generated in
//! memory, each collection is written in a single bulk write, and the sentinel is set
//! last.
//!
//! The sentinel is the only thing consulted. Collections are never checked for
//! emptiness, so a dataset that was later partly (or fully) deleted is not re-seeded.
//!
//! ## Shape
//!
//! | collection  | count | id pattern           |
//! |-------------|-------|----------------------|
//! | categories  | 5     | `cat_{1..5}`         |
//! | shops       | 600   | `shops_seed_{n}`     |
//! | products    | 900   | `products_seed_{n}`  |
//! | offers      | 700   | `offers_seed_{n}`    |
//!
//! Structure (ids, foreign keys, floors, active flags, timestamp offsets) depends only
//! on `n`. Prices, discounts and offer windows come from the supplied [`Rng`], so a
//! seeded generator gives fully reproducible data.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{Category, Floor, Offer, Product, RecordMeta, Shop, Stored, User, UserType};
use crate::store::{RecordStore, StorageBackend};

pub const SHOP_COUNT: usize = 600;
pub const PRODUCT_COUNT: usize = 900;
pub const OFFER_COUNT: usize = 700;

const WINGS: [&str; 4] = ["A", "B", "C", "D"];

/// Outcome of a seeding attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    /// False when the sentinel was already set and nothing was written.
    pub seeded: bool,
    pub shops: usize,
    pub products: usize,
    pub offers: usize,
    pub categories: usize,
}

pub fn default_categories(now: DateTime<Utc>) -> Vec<Stored<Category>> {
    [
        ("cat_1", "Electronics", "Electronic items and gadgets"),
        ("cat_2", "Clothing", "Fashion and apparel"),
        ("cat_3", "Food & Beverages", "Food items and drinks"),
        ("cat_4", "Home & Kitchen", "Home appliances and kitchen items"),
        ("cat_5", "Books & Stationery", "Books, notebooks, and stationery"),
    ]
    .into_iter()
    .map(|(id, name, description)| {
        Stored::new(
            RecordMeta::new(id, now),
            Category {
                name: name.to_string(),
                description: description.to_string(),
            },
        )
    })
    .collect()
}

pub fn default_users(now: DateTime<Utc>) -> Vec<Stored<User>> {
    vec![
        Stored::new(
            RecordMeta::new("demo_customer", now),
            User {
                email: "member@supermall.test".into(),
                name: "Demo Shopper".into(),
                user_type: UserType::Customer,
            },
        ),
        Stored::new(
            RecordMeta::new("demo_admin", now),
            User {
                email: "admin@supermall.test".into(),
                name: "Demo Admin".into(),
                user_type: UserType::Admin,
            },
        ),
    ]
}

/// Seed the demo catalog unless the sentinel says it already happened.
pub fn seed_demo_data<B: StorageBackend, R: Rng>(
    store: &mut RecordStore<B>,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<SeedReport> {
    if store.is_seeded()? {
        debug!("Demo data already seeded");
        return Ok(SeedReport::default());
    }

    info!("Seeding demo data (large sample set)");

    let categories = default_categories(now);
    let shops = generate_shops(&categories, now);
    let products = generate_products(&shops, &categories, rng, now);
    let offers = generate_offers(&shops, &categories, rng, now);

    store.save(&categories)?;
    store.save(&shops)?;
    store.save(&products)?;
    store.save(&offers)?;
    store.mark_seeded()?;

    let report = SeedReport {
        seeded: true,
        shops: shops.len(),
        products: products.len(),
        offers: offers.len(),
        categories: categories.len(),
    };
    info!(
        shops = report.shops,
        products = report.products,
        offers = report.offers,
        categories = report.categories,
        "Demo data seeded"
    );
    Ok(report)
}

pub fn generate_shops(categories: &[Stored<Category>], now: DateTime<Utc>) -> Vec<Stored<Shop>> {
    (1..=SHOP_COUNT)
        .map(|n| {
            let category = &categories[n % categories.len()];
            let offset = n as i64;
            Stored::new(
                RecordMeta::with_times(
                    format!("shops_seed_{}", n),
                    now - Duration::hours(offset),
                    now - Duration::minutes(30 * offset),
                ),
                Shop {
                    name: format!("Shop {} - {}", n, category.data.name),
                    description: format!(
                        "Reliable {} seller with curated picks ({}).",
                        category.data.name.to_lowercase(),
                        n
                    ),
                    category: category.id().to_string(),
                    floor: Floor::ALL[n % Floor::ALL.len()],
                    location: format!("Shop No. {}, Wing {}", 100 + n, WINGS[n % WINGS.len()]),
                    contact_number: format!("+91-9000{:04}", (1000 + n) % 10_000),
                    contact_email: format!("shop{}@supermall.test", n),
                    image: format!("https://picsum.photos/seed/shop-{}/400/300", n),
                    is_active: n % 9 != 0,
                },
            )
        })
        .collect()
}

pub fn generate_products<R: Rng>(
    shops: &[Stored<Shop>],
    categories: &[Stored<Category>],
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<Stored<Product>> {
    (1..=PRODUCT_COUNT)
        .map(|n| {
            let shop = &shops[n % shops.len()];
            let category = &categories[n % categories.len()];
            let offset = n as i64;
            let price = f64::from(rng.random_range(10u32..=999)) + 0.99;
            Stored::new(
                RecordMeta::with_times(
                    format!("products_seed_{}", n),
                    now - Duration::minutes(40 * offset),
                    now - Duration::minutes(20 * offset),
                ),
                Product {
                    name: format!("{} Item {}", category.data.name, n),
                    description: format!(
                        "High-quality {} product number {}.",
                        category.data.name.to_lowercase(),
                        n
                    ),
                    price,
                    shop_id: shop.id().to_string(),
                    category: category.id().to_string(),
                    image: format!("https://picsum.photos/seed/product-{}/300/220", n),
                    features: format!(
                        "Feature set {}, warranty {} year(s)",
                        n % 5 + 1,
                        n % 3 + 1
                    ),
                },
            )
        })
        .collect()
}

pub fn generate_offers<R: Rng>(
    shops: &[Stored<Shop>],
    categories: &[Stored<Category>],
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<Stored<Offer>> {
    (1..=OFFER_COUNT)
        .map(|n| {
            let shop = &shops[n % shops.len()];
            let category = &categories[n % categories.len()];
            let offset = n as i64;
            let discount: u8 = rng.random_range(5..=70);
            let valid_from = now - Duration::days(rng.random_range(1..=5));
            let valid_until = now + Duration::days(rng.random_range(10..=45));
            Stored::new(
                RecordMeta::with_times(
                    format!("offers_seed_{}", n),
                    now - Duration::minutes(50 * offset),
                    now - Duration::minutes(25 * offset),
                ),
                Offer {
                    title: format!("{}% off on {} picks ({})", discount, category.data.name, n),
                    description: format!(
                        "Limited-time {} offer for Shop {}.",
                        category.data.name.to_lowercase(),
                        shop.data.name
                    ),
                    shop_id: shop.id().to_string(),
                    discount,
                    valid_from,
                    valid_until,
                    is_active: n % 11 != 0,
                },
            )
        })
        .collect()
}
