//! Borrow and return of serialized units.
//!
//! A transaction starts `Active` when a serial is lent to exactly one
//! borrower (an employee or a department) and becomes `Completed` on
//! return. Both transitions update the serial's status in the same
//! database transaction.

use crate::{
    db::DbPool,
    entities::{
        department, employee, product,
        product_serial::{self, Entity as ProductSerial},
        transaction::{self, Column as TxnColumn, Entity as Transaction, TransactionStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        audit::{self, AuditOperation, SERIALS_TABLE, TRANSACTIONS_TABLE},
        serials::ProductRef,
        stock::{self, BORROWED_STATUS, RETURNED_STATUS},
    },
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_RECENT_LIMIT: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Borrower {
    Employee(Uuid),
    Department(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BorrowInput {
    pub serial_id: Uuid,
    /// Set exactly one of `employee_id` and `department_id`
    pub employee_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

impl BorrowInput {
    pub fn borrower(&self) -> Result<Borrower, ServiceError> {
        match (self.employee_id, self.department_id) {
            (Some(id), None) => Ok(Borrower::Employee(id)),
            (None, Some(id)) => Ok(Borrower::Department(id)),
            (Some(_), Some(_)) => Err(ServiceError::ValidationError(
                "a borrow goes to an employee or a department, not both".to_string(),
            )),
            (None, None) => Err(ServiceError::ValidationError(
                "employee_id or department_id is required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionListQuery {
    pub status: Option<TransactionStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Number of transactions, default 5
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeRef {
    pub id: Uuid,
    pub name: String,
    pub emp_code: String,
    pub department_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DepartmentRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SerialRef {
    pub id: Uuid,
    pub serial_code: String,
    pub status: String,
    pub product: Option<ProductRef>,
}

/// A transaction with its borrower and the serial it covers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionDetail {
    pub id: Uuid,
    pub serial_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    #[schema(example = "Active")]
    pub status: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub employee: Option<EmployeeRef>,
    pub department: Option<DepartmentRef>,
    pub serial: Option<SerialRef>,
}

async fn hydrate<C>(
    conn: &C,
    transactions: Vec<transaction::Model>,
) -> Result<Vec<TransactionDetail>, ServiceError>
where
    C: ConnectionTrait,
{
    if transactions.is_empty() {
        return Ok(Vec::new());
    }

    let employee_ids: Vec<Uuid> = transactions.iter().filter_map(|t| t.employee_id).collect();
    let department_ids: Vec<Uuid> = transactions.iter().filter_map(|t| t.department_id).collect();
    let serial_ids: Vec<Uuid> = transactions.iter().map(|t| t.serial_id).collect();

    let employees: HashMap<Uuid, employee::Model> = if employee_ids.is_empty() {
        HashMap::new()
    } else {
        employee::Entity::find()
            .filter(employee::Column::Id.is_in(employee_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect()
    };
    let departments: HashMap<Uuid, department::Model> = if department_ids.is_empty() {
        HashMap::new()
    } else {
        department::Entity::find()
            .filter(department::Column::Id.is_in(department_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect()
    };
    let serials: HashMap<Uuid, (product_serial::Model, Option<product::Model>)> =
        ProductSerial::find()
            .filter(product_serial::Column::Id.is_in(serial_ids))
            .find_also_related(product::Entity)
            .all(conn)
            .await?
            .into_iter()
            .map(|(s, p)| (s.id, (s, p)))
            .collect();

    Ok(transactions
        .into_iter()
        .map(|t| TransactionDetail {
            employee: t
                .employee_id
                .and_then(|id| employees.get(&id))
                .map(|e| EmployeeRef {
                    id: e.id,
                    name: e.name.clone(),
                    emp_code: e.emp_code.clone(),
                    department_id: e.department_id,
                }),
            department: t
                .department_id
                .and_then(|id| departments.get(&id))
                .map(|d| DepartmentRef {
                    id: d.id,
                    name: d.name.clone(),
                }),
            serial: serials.get(&t.serial_id).map(|(s, p)| SerialRef {
                id: s.id,
                serial_code: s.serial_code.clone(),
                status: s.status.clone(),
                product: p.clone().map(ProductRef::from),
            }),
            id: t.id,
            serial_id: t.serial_id,
            employee_id: t.employee_id,
            department_id: t.department_id,
            borrow_date: t.borrow_date,
            return_date: t.return_date,
            status: t.status,
            note: t.note,
            created_at: t.created_at,
        })
        .collect())
}

#[derive(Clone)]
pub struct LendingService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LendingService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lends an available serial. The serial must classify as available and
    /// carry no open transaction.
    #[instrument(skip(self))]
    pub async fn borrow(
        &self,
        input: BorrowInput,
        actor: Option<&str>,
    ) -> Result<TransactionDetail, ServiceError> {
        input.validate()?;
        let borrower = input.borrower()?;

        let txn = self.db_pool.begin().await?;

        let serial = ProductSerial::find_by_id(input.serial_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Serial {} not found", input.serial_id)))?;

        if !stock::is_available(&serial.status) {
            return Err(ServiceError::InvalidOperation(format!(
                "Serial {} is not available (status: {})",
                serial.serial_code, serial.status
            )));
        }

        let open = Transaction::find()
            .filter(TxnColumn::SerialId.eq(serial.id))
            .filter(TxnColumn::Status.eq(TransactionStatus::Active.as_ref()))
            .count(&txn)
            .await?;
        if open > 0 {
            warn!(serial_id = %serial.id, "Available serial still has an open transaction");
            return Err(ServiceError::Conflict(format!(
                "Serial {} is already on loan",
                serial.serial_code
            )));
        }

        match borrower {
            Borrower::Employee(id) => {
                employee::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))?;
            }
            Borrower::Department(id) => {
                department::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Department {} not found", id)))?;
            }
        }

        let now = Utc::now();
        let created = transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            serial_id: Set(serial.id),
            employee_id: Set(input.employee_id),
            department_id: Set(input.department_id),
            borrow_date: Set(now),
            return_date: Set(None),
            status: Set(TransactionStatus::Active.to_string()),
            note: Set(input.note.filter(|n| !n.trim().is_empty())),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(serial_id = %serial.id, "Failed to create transaction: {}", e);
            ServiceError::db_error(e)
        })?;

        let mut serial_update: product_serial::ActiveModel = serial.clone().into();
        serial_update.status = Set(BORROWED_STATUS.to_string());
        let borrowed = serial_update.update(&txn).await?;

        audit::record(
            &txn,
            TRANSACTIONS_TABLE,
            created.id,
            AuditOperation::Insert,
            None,
            Some(&created),
            actor,
        )
        .await?;
        audit::record(
            &txn,
            SERIALS_TABLE,
            serial.id,
            AuditOperation::Update,
            Some(&serial),
            Some(&borrowed),
            actor,
        )
        .await?;

        txn.commit().await?;

        info!(transaction_id = %created.id, serial = %serial.serial_code, borrower = ?borrower, "Serial borrowed");
        self.event_sender
            .send_or_log(Event::SerialBorrowed {
                serial_id: serial.id,
                transaction_id: created.id,
            })
            .await;

        self.get_transaction(created.id).await
    }

    /// Closes an active transaction and puts its serial back in stock
    #[instrument(skip(self))]
    pub async fn return_serial(
        &self,
        transaction_id: Uuid,
        actor: Option<&str>,
    ) -> Result<TransactionDetail, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let existing = Transaction::find_by_id(transaction_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Transaction {} not found", transaction_id))
            })?;

        if !existing.is_active() {
            return Err(ServiceError::InvalidOperation(format!(
                "Transaction {} is already {}",
                transaction_id, existing.status
            )));
        }

        let mut closing: transaction::ActiveModel = existing.clone().into();
        closing.status = Set(TransactionStatus::Completed.to_string());
        closing.return_date = Set(Some(Utc::now()));
        let completed = closing.update(&txn).await.map_err(|e| {
            error!(transaction_id = %transaction_id, "Failed to close transaction: {}", e);
            ServiceError::db_error(e)
        })?;

        audit::record(
            &txn,
            TRANSACTIONS_TABLE,
            transaction_id,
            AuditOperation::Update,
            Some(&existing),
            Some(&completed),
            actor,
        )
        .await?;

        match ProductSerial::find_by_id(existing.serial_id).one(&txn).await? {
            Some(serial) => {
                let mut serial_update: product_serial::ActiveModel = serial.clone().into();
                serial_update.status = Set(RETURNED_STATUS.to_string());
                let returned = serial_update.update(&txn).await?;
                audit::record(
                    &txn,
                    SERIALS_TABLE,
                    serial.id,
                    AuditOperation::Update,
                    Some(&serial),
                    Some(&returned),
                    actor,
                )
                .await?;
            }
            None => {
                warn!(serial_id = %existing.serial_id, "Returned transaction references a missing serial");
            }
        }

        txn.commit().await?;

        info!(transaction_id = %transaction_id, serial_id = %existing.serial_id, "Serial returned");
        self.event_sender
            .send_or_log(Event::SerialReturned {
                serial_id: existing.serial_id,
                transaction_id,
            })
            .await;

        self.get_transaction(transaction_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(&self, id: Uuid) -> Result<TransactionDetail, ServiceError> {
        let db = &*self.db_pool;
        let model = Transaction::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Transaction {} not found", id)))?;
        hydrate(db, vec![model])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("Transaction {} not found", id)))
    }

    /// Transactions newest first, optionally narrowed to one status
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        status: Option<TransactionStatus>,
    ) -> Result<Vec<TransactionDetail>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = Transaction::find();
        if let Some(status) = status {
            query = query.filter(TxnColumn::Status.eq(status.as_ref()));
        }
        let rows = query
            .order_by_desc(TxnColumn::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!("Failed to list transactions: {}", e);
                ServiceError::db_error(e)
            })?;
        hydrate(db, rows).await
    }

    #[instrument(skip(self))]
    pub async fn recent_transactions(
        &self,
        limit: u64,
    ) -> Result<Vec<TransactionDetail>, ServiceError> {
        let db = &*self.db_pool;
        let rows = Transaction::find()
            .order_by_desc(TxnColumn::CreatedAt)
            .limit(limit)
            .all(db)
            .await?;
        hydrate(db, rows).await
    }

    /// Borrow history of one employee, newest first
    #[instrument(skip(self))]
    pub async fn employee_transactions(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<TransactionDetail>, ServiceError> {
        let db = &*self.db_pool;
        employee::Entity::find_by_id(employee_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_id)))?;

        let rows = Transaction::find()
            .filter(TxnColumn::EmployeeId.eq(employee_id))
            .order_by_desc(TxnColumn::CreatedAt)
            .all(db)
            .await?;
        hydrate(db, rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn input(employee_id: Option<Uuid>, department_id: Option<Uuid>) -> BorrowInput {
        BorrowInput {
            serial_id: Uuid::new_v4(),
            employee_id,
            department_id,
            note: None,
        }
    }

    #[test]
    fn borrower_must_be_exactly_one() {
        let emp = Uuid::new_v4();
        let dept = Uuid::new_v4();
        assert_eq!(input(Some(emp), None).borrower().unwrap(), Borrower::Employee(emp));
        assert_eq!(input(None, Some(dept)).borrower().unwrap(), Borrower::Department(dept));
        assert_matches!(
            input(Some(emp), Some(dept)).borrower(),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(input(None, None).borrower(), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn status_filter_parses_from_query() {
        let q: TransactionListQuery = serde_json::from_str(r#"{"status":"Completed"}"#).unwrap();
        assert_eq!(q.status, Some(TransactionStatus::Completed));
    }
}
