use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Row-level change record; `old_data`/`new_data` hold JSON snapshots.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "audit_logs")]
#[schema(as = AuditLog)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub table_name: String,
    pub record_id: Uuid,
    /// INSERT, UPDATE or DELETE
    pub operation: String,
    #[schema(value_type = Option<Object>)]
    pub old_data: Option<Json>,
    #[schema(value_type = Option<Object>)]
    pub new_data: Option<Json>,
    pub changed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
