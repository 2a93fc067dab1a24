use crate::{
    db::DbPool,
    entities::product::{self, Entity as Product},
    errors::ServiceError,
    services::{
        codes,
        stock::{self, StockCounts},
    },
};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Number of categories reported in `category_stats`
pub const TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryStat {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusStat {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LowStockItem {
    pub id: Uuid,
    pub name: String,
    pub p_id: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: String,
    /// Available serials
    pub current: u64,
    pub total: u64,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventorySummaryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub p_id: String,
    pub image: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub total: u64,
    pub available: u64,
    pub borrowed: u64,
    pub repair: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    #[schema(value_type = String, example = "125000.00")]
    pub total_value: Decimal,
    pub total_items: u64,
    pub available_count: u64,
    pub borrowed_count: u64,
    pub repair_count: u64,
    pub category_stats: Vec<CategoryStat>,
    pub status_stats: Vec<StatusStat>,
    pub low_stock_items: Vec<LowStockItem>,
    pub inventory_summary: Vec<InventorySummaryItem>,
}

fn low_stock_item(product: &product::Model, counts: &StockCounts) -> LowStockItem {
    LowStockItem {
        id: product.id,
        name: product.name.clone(),
        p_id: product.p_id.clone(),
        brand: product.brand.clone(),
        model: product.model.clone(),
        category: product.category.clone(),
        current: counts.available,
        total: counts.total,
        image: product.image_url.clone(),
    }
}

/// Builds the dashboard from products (in display order) and their counts.
/// Serials of products missing from `products` are ignored.
pub fn build_stats(
    products: &[product::Model],
    counts: &HashMap<Uuid, StockCounts>,
) -> DashboardStats {
    let mut totals = StockCounts::default();
    let mut total_value = Decimal::ZERO;
    let mut by_category: HashMap<String, u64> = HashMap::new();
    let mut low_stock_items = Vec::new();
    let mut inventory_summary = Vec::with_capacity(products.len());

    for product in products {
        let c = counts.get(&product.id).copied().unwrap_or_default();
        totals += c;
        total_value += product.price * Decimal::from(c.total);
        *by_category
            .entry(codes::category_short_label(&product.category))
            .or_default() += c.total;

        if c.is_low_stock() {
            low_stock_items.push(low_stock_item(product, &c));
        }
        inventory_summary.push(InventorySummaryItem {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            p_id: product.p_id.clone(),
            image: product.image_url.clone(),
            brand: product.brand.clone(),
            model: product.model.clone(),
            total: c.total,
            available: c.available,
            borrowed: c.borrowed,
            repair: c.repair,
        });
    }

    let mut category_stats: Vec<CategoryStat> = by_category
        .into_iter()
        .map(|(name, value)| CategoryStat { name, value })
        .collect();
    category_stats.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    category_stats.truncate(TOP_CATEGORIES);

    let status_stats = vec![
        StatusStat {
            name: "พร้อมใช้".to_string(),
            count: totals.available,
        },
        StatusStat {
            name: "ถูกยืม".to_string(),
            count: totals.borrowed,
        },
        StatusStat {
            name: "ส่งซ่อม".to_string(),
            count: totals.repair,
        },
    ];

    DashboardStats {
        total_value,
        total_items: totals.total,
        available_count: totals.available,
        borrowed_count: totals.borrowed,
        repair_count: totals.repair,
        category_stats,
        status_stats,
        low_stock_items,
        inventory_summary,
    }
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn load(&self) -> Result<(Vec<product::Model>, HashMap<Uuid, StockCounts>), ServiceError> {
        let db = &*self.db_pool;
        let products = Product::find()
            .order_by_asc(product::Column::Name)
            .all(db)
            .await?;
        let counts = stock::load_counts(db, None).await?;
        debug!(products = products.len(), counted = counts.len(), "Loaded stock for dashboard");
        Ok((products, counts))
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<DashboardStats, ServiceError> {
        let (products, counts) = self.load().await?;
        Ok(build_stats(&products, &counts))
    }

    /// Products with fewer than three available serials, by name
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<LowStockItem>, ServiceError> {
        let (products, counts) = self.load().await?;
        let low: HashSet<&Uuid> = stock::low_stock(&counts).into_iter().collect();
        Ok(products
            .iter()
            .filter(|p| low.contains(&p.id))
            .filter_map(|p| counts.get(&p.id).map(|c| low_stock_item(p, c)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(name: &str, category: &str, price: Decimal) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            p_id: format!("{}-0001", codes::sku_prefix(category)),
            name: name.to_string(),
            category: category.to_string(),
            brand: None,
            model: None,
            price,
            unit: "ชิ้น".to_string(),
            quantity: 0,
            description: None,
            notes: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn totals_value_and_buckets() {
        let laptop = product("Laptop", "ไอที/อิเล็กทรอนิกส์ (IT)", dec!(25000));
        let chair = product("Chair", "เฟอร์นิเจอร์ (FR)", dec!(1500.50));
        let counts = stock::aggregate(vec![
            (laptop.id, "พร้อมใช้"),
            (laptop.id, "Borrowed"),
            (chair.id, "Ready"),
            (chair.id, "Ready"),
            (chair.id, "Ready"),
            (chair.id, "ส่งซ่อม"),
        ]);

        let stats = build_stats(&[chair.clone(), laptop.clone()], &counts);
        assert_eq!(stats.total_items, 6);
        assert_eq!(stats.total_value, dec!(56002.00));
        assert_eq!(stats.available_count, 4);
        assert_eq!(stats.borrowed_count, 1);
        assert_eq!(stats.repair_count, 1);
        assert_eq!(stats.status_stats[1].count, 1);

        assert_eq!(stats.low_stock_items.len(), 1);
        assert_eq!(stats.low_stock_items[0].id, laptop.id);
        assert_eq!(stats.low_stock_items[0].current, 1);

        assert_eq!(stats.inventory_summary[0].name, "Chair");
        assert_eq!(
            stats.category_stats,
            vec![
                CategoryStat {
                    name: "FR".into(),
                    value: 4
                },
                CategoryStat {
                    name: "IT".into(),
                    value: 2
                },
            ]
        );
    }

    #[test]
    fn category_stats_keep_top_five() {
        let products: Vec<_> = ["AA", "BB", "CC", "DD", "EE", "FF"]
            .iter()
            .map(|code| product(code, &format!("Cat ({})", code), Decimal::ZERO))
            .collect();
        let rows = products
            .iter()
            .enumerate()
            .flat_map(|(i, p)| std::iter::repeat((p.id, "Ready")).take(i + 1));
        let stats = build_stats(&products, &stock::aggregate(rows));
        assert_eq!(stats.category_stats.len(), TOP_CATEGORIES);
        assert_eq!(stats.category_stats[0].name, "FF");
        assert!(stats.category_stats.iter().all(|c| c.name != "AA"));
    }

    #[test]
    fn products_without_serials_are_not_low_stock() {
        let empty = product("Empty", "อื่นๆ", dec!(10));
        let stats = build_stats(&[empty], &HashMap::new());
        assert!(stats.low_stock_items.is_empty());
        assert_eq!(stats.category_stats[0].name, "อื่นๆ");
        assert_eq!(stats.total_value, Decimal::ZERO);
    }
}
