use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sticker still to be printed and attached
pub const STICKER_PENDING: &str = "รอติดสติ๊กเกอร์";
/// Sticker attached to the unit
pub const STICKER_AFFIXED: &str = "ติดแล้ว";

/// One physical unit of a product, identified by `{p_id}-NNNN`.
///
/// `status` is deliberately a free string: rows written by older clients
/// carry Thai and English spellings side by side, and stock counting
/// classifies them through `services::stock`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_serials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    #[sea_orm(unique)]
    pub serial_code: String,
    pub status: String,
    pub sticker_status: String,
    pub sticker_date: Option<DateTime<Utc>>,
    pub sticker_image_url: Option<String>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id",
        on_delete = "SetNull"
    )]
    Location,
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if !insert {
            active_model.updated_at = Set(Some(Utc::now()));
        }
        Ok(active_model)
    }
}
