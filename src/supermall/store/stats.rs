use crate::model::{Category, Floor, Offer, Product, Shop, Stored};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_shops: usize,
    pub total_products: usize,
    /// Active offers only.
    pub total_offers: usize,
    pub total_categories: usize,
    /// Every floor is present, with 0 when it has no shops.
    pub shops_by_floor: BTreeMap<Floor, usize>,
}

impl StoreStats {
    pub fn compute(
        shops: &[Stored<Shop>],
        products: &[Stored<Product>],
        offers: &[Stored<Offer>],
        categories: &[Stored<Category>],
    ) -> Self {
        let mut shops_by_floor: BTreeMap<Floor, usize> =
            Floor::ALL.into_iter().map(|f| (f, 0)).collect();
        for shop in shops {
            *shops_by_floor.entry(shop.data.floor).or_insert(0) += 1;
        }

        Self {
            total_shops: shops.len(),
            total_products: products.len(),
            total_offers: offers.iter().filter(|o| o.data.is_active).count(),
            total_categories: categories.len(),
            shops_by_floor,
        }
    }
}
