use crate::{db::DbPool, entities::audit_log, errors::ServiceError};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use strum::{AsRefStr, Display};
use tracing::instrument;
use uuid::Uuid;

pub const PRODUCTS_TABLE: &str = "products";
pub const SERIALS_TABLE: &str = "product_serials";
pub const EMPLOYEES_TABLE: &str = "employees";
pub const TRANSACTIONS_TABLE: &str = "transactions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AuditOperation {
    Insert,
    Update,
    Delete,
}

/// Appends one change record. Runs on whatever connection the caller holds
/// so the record commits or rolls back together with the change itself.
pub async fn record<C, T>(
    conn: &C,
    table_name: &str,
    record_id: Uuid,
    operation: AuditOperation,
    old: Option<&T>,
    new: Option<&T>,
    changed_by: Option<&str>,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
    T: Serialize,
{
    let old_data = old.map(serde_json::to_value).transpose()?;
    let new_data = new.map(serde_json::to_value).transpose()?;

    audit_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        table_name: Set(table_name.to_string()),
        record_id: Set(record_id),
        operation: Set(operation.to_string()),
        old_data: Set(old_data),
        new_data: Set(new_data),
        changed_by: Set(changed_by.map(str::to_string)),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct AuditService {
    db_pool: Arc<DbPool>,
}

impl AuditService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// History of one record, newest first
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        table_name: &str,
        record_id: Uuid,
    ) -> Result<Vec<audit_log::Model>, ServiceError> {
        let rows = audit_log::Entity::find()
            .filter(audit_log::Column::TableName.eq(table_name))
            .filter(audit_log::Column::RecordId.eq(record_id))
            .order_by_desc(audit_log::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(rows)
    }
}
