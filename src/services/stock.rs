//! Stock counting over serial status strings.
//!
//! Statuses are stored as free text and come in Thai and English spellings.
//! Each known spelling belongs to exactly one bucket; unknown strings still
//! count toward the total.

use crate::{entities::product_serial, errors::ServiceError};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use strum::{AsRefStr, Display};
use utoipa::ToSchema;
use uuid::Uuid;

/// A unit with fewer than this many available serials is low on stock
pub const LOW_STOCK_THRESHOLD: u64 = 3;

pub const AVAILABLE_STATUSES: [&str; 2] = ["Ready", "พร้อมใช้"];
pub const BORROWED_STATUSES: [&str; 3] = ["Borrowed", "ถูกยืม", "Active"];
pub const REPAIR_STATUSES: [&str; 8] = [
    "Repair",
    "ส่งซ่อม",
    "ซ่อม",
    "เสีย",
    "พัง",
    "ไม่พร้อมใช้",
    "Missing",
    "หาย",
];

/// Status given to freshly generated serials
pub const INITIAL_STATUS: &str = "พร้อมใช้";
/// Status written when a serial is lent out
pub const BORROWED_STATUS: &str = "Borrowed";
/// Status written when a serial comes back
pub const RETURNED_STATUS: &str = "Ready";

/// Statuses offered for manual edits of a serial
pub const SERIAL_STATUS_OPTIONS: [&str; 8] = [
    "พร้อมใช้",
    "ถูกยืม",
    "ไม่พร้อมใช้",
    "ส่งซ่อม",
    "ไม่ใช้แล้ว",
    "หาย",
    "ทิ้งแล้ว",
    "ไม่เปิดใช้งาน",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StockBucket {
    Available,
    Borrowed,
    Repair,
}

pub fn classify_status(status: &str) -> Option<StockBucket> {
    if AVAILABLE_STATUSES.contains(&status) {
        Some(StockBucket::Available)
    } else if BORROWED_STATUSES.contains(&status) {
        Some(StockBucket::Borrowed)
    } else if REPAIR_STATUSES.contains(&status) {
        Some(StockBucket::Repair)
    } else {
        None
    }
}

pub fn is_available(status: &str) -> bool {
    classify_status(status) == Some(StockBucket::Available)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StockCounts {
    pub total: u64,
    pub available: u64,
    pub borrowed: u64,
    pub repair: u64,
}

impl StockCounts {
    pub fn record(&mut self, status: &str) {
        self.total += 1;
        match classify_status(status) {
            Some(StockBucket::Available) => self.available += 1,
            Some(StockBucket::Borrowed) => self.borrowed += 1,
            Some(StockBucket::Repair) => self.repair += 1,
            None => {}
        }
    }

    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self)
    }
}

impl std::ops::AddAssign for StockCounts {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.available += other.available;
        self.borrowed += other.borrowed;
        self.repair += other.repair;
    }
}

/// Folds `(product, status)` pairs into per-product counts.
pub fn aggregate<K, S, I>(serials: I) -> HashMap<K, StockCounts>
where
    K: Eq + Hash,
    S: AsRef<str>,
    I: IntoIterator<Item = (K, S)>,
{
    let mut counts: HashMap<K, StockCounts> = HashMap::new();
    for (key, status) in serials {
        counts.entry(key).or_default().record(status.as_ref());
    }
    counts
}

pub fn is_low_stock(counts: &StockCounts) -> bool {
    counts.available < LOW_STOCK_THRESHOLD && counts.total > 0
}

/// Keys whose counts are low on stock, in no particular order.
pub fn low_stock<K>(counts: &HashMap<K, StockCounts>) -> Vec<&K>
where
    K: Eq + Hash,
{
    counts
        .iter()
        .filter(|(_, c)| is_low_stock(c))
        .map(|(k, _)| k)
        .collect()
}

/// Loads serial statuses and folds them per product. `None` loads every product.
pub async fn load_counts<C>(
    conn: &C,
    product_ids: Option<&[Uuid]>,
) -> Result<HashMap<Uuid, StockCounts>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut query = product_serial::Entity::find()
        .select_only()
        .column(product_serial::Column::ProductId)
        .column(product_serial::Column::Status);
    if let Some(ids) = product_ids {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        query = query.filter(product_serial::Column::ProductId.is_in(ids.iter().copied()));
    }

    let rows: Vec<(Uuid, String)> = query.into_tuple().all(conn).await?;
    Ok(aggregate(rows))
}
