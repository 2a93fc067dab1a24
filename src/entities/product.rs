use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry for a kind of asset. Physical units live in `product_serial`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// SKU in `PREFIX-NNNN` form
    #[sea_orm(unique)]
    pub p_id: String,
    pub name: String,
    /// Category label carrying its short code, e.g. `เฟอร์นิเจอร์ (FR)`
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    pub unit: String,
    /// Stock size last requested by the user; the live count is derived from serials
    pub quantity: i32,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_serial::Entity")]
    Serials,
}

impl Related<super::product_serial::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Serials.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        } else {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}
