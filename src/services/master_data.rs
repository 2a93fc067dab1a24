use crate::{
    db::DbPool,
    entities::{
        department::{self, Entity as Department},
        employee::{self, Column as EmployeeColumn, Entity as Employee},
        location::{self, Entity as Location},
        product_serial, transaction,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        audit::{self, AuditOperation, EMPLOYEES_TABLE},
        non_empty,
    },
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLocationInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub building: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEmployeeInput {
    #[validate(length(min = 1, max = 64))]
    #[schema(example = "EMP-001")]
    pub emp_code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub nickname: Option<String>,
    pub gender: Option<String>,
    pub image_url: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub location: Option<String>,
    pub tel: Option<String>,
    pub department_id: Option<Uuid>,
}

impl CreateEmployeeInput {
    fn normalized(self) -> Self {
        Self {
            emp_code: self.emp_code.trim().to_string(),
            name: self.name.trim().to_string(),
            nickname: self.nickname.and_then(non_empty),
            gender: self.gender.and_then(non_empty),
            image_url: self.image_url.and_then(non_empty),
            email: self.email.and_then(non_empty),
            location: self.location.and_then(non_empty),
            tel: self.tel.and_then(non_empty),
            department_id: self.department_id,
        }
    }
}

/// Partial update. Text fields are cleared with an empty string,
/// `department_id` with an explicit `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployeeInput {
    #[validate(length(min = 1, max = 64))]
    pub emp_code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub gender: Option<String>,
    pub image_url: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub tel: Option<String>,
    #[serde(default, deserialize_with = "crate::services::deserialize_some")]
    #[schema(value_type = Option<Uuid>)]
    pub department_id: Option<Option<Uuid>>,
}

/// An employee with the name of their department
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeDetail {
    #[serde(flatten)]
    pub employee: employee::Model,
    pub department_name: Option<String>,
}

/// Departments, locations and employees
#[derive(Clone)]
pub struct MasterDataService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl MasterDataService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_departments(&self) -> Result<Vec<department::Model>, ServiceError> {
        Ok(Department::find()
            .order_by_asc(department::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn create_department(
        &self,
        input: CreateDepartmentInput,
    ) -> Result<department::Model, ServiceError> {
        input.validate()?;
        let created = department::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!("Failed to create department: {}", e);
            ServiceError::db_error(e)
        })?;
        info!(department_id = %created.id, name = %created.name, "Department created");
        Ok(created)
    }

    /// Refused while transactions reference the department; employees in it
    /// are detached.
    #[instrument(skip(self))]
    pub async fn delete_department(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = Department::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Department {} not found", id)))?;

        let referenced = transaction::Entity::find()
            .filter(transaction::Column::DepartmentId.eq(id))
            .count(&txn)
            .await?;
        if referenced > 0 {
            return Err(ServiceError::Conflict(format!(
                "Department {} has {} transaction(s)",
                existing.name, referenced
            )));
        }

        Employee::update_many()
            .col_expr(EmployeeColumn::DepartmentId, Expr::value(Option::<Uuid>::None))
            .filter(EmployeeColumn::DepartmentId.eq(id))
            .exec(&txn)
            .await?;
        Department::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(department_id = %id, "Department deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_locations(&self) -> Result<Vec<location::Model>, ServiceError> {
        Ok(Location::find()
            .order_by_asc(location::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn create_location(
        &self,
        input: CreateLocationInput,
    ) -> Result<location::Model, ServiceError> {
        input.validate()?;
        let created = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            building: Set(input.building.and_then(non_empty)),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!("Failed to create location: {}", e);
            ServiceError::db_error(e)
        })?;
        info!(location_id = %created.id, name = %created.name, "Location created");
        Ok(created)
    }

    /// Serials kept at the location lose their location
    #[instrument(skip(self))]
    pub async fn delete_location(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        Location::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", id)))?;

        product_serial::Entity::update_many()
            .col_expr(
                product_serial::Column::LocationId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(product_serial::Column::LocationId.eq(id))
            .exec(&txn)
            .await?;
        Location::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(location_id = %id, "Location deleted");
        Ok(())
    }

    /// Employees ordered by code, each with its department name
    #[instrument(skip(self))]
    pub async fn list_employees(&self) -> Result<Vec<EmployeeDetail>, ServiceError> {
        let rows = Employee::find()
            .order_by_asc(EmployeeColumn::EmpCode)
            .find_also_related(Department)
            .all(&*self.db_pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(employee, department)| EmployeeDetail {
                employee,
                department_name: department.map(|d| d.name),
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_employee(&self, id: Uuid) -> Result<EmployeeDetail, ServiceError> {
        let (employee, department) = Employee::find_by_id(id)
            .find_also_related(Department)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))?;
        Ok(EmployeeDetail {
            employee,
            department_name: department.map(|d| d.name),
        })
    }

    #[instrument(skip(self))]
    pub async fn create_employee(
        &self,
        input: CreateEmployeeInput,
        actor: Option<&str>,
    ) -> Result<EmployeeDetail, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        let txn = self.db_pool.begin().await?;

        let taken = Employee::find()
            .filter(EmployeeColumn::EmpCode.eq(input.emp_code.as_str()))
            .count(&txn)
            .await?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "Employee code '{}' already exists",
                input.emp_code
            )));
        }
        if let Some(department_id) = input.department_id {
            Department::find_by_id(department_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Department {} not found", department_id))
                })?;
        }

        let emp_code = input.emp_code.clone();
        let created = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            emp_code: Set(input.emp_code),
            name: Set(input.name),
            nickname: Set(input.nickname),
            gender: Set(input.gender),
            image_url: Set(input.image_url),
            email: Set(input.email),
            location: Set(input.location),
            tel: Set(input.tel),
            department_id: Set(input.department_id),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(emp_code = %emp_code, "Failed to create employee: {}", e);
            ServiceError::from_write_error(e, format!("Employee code '{}' already exists", emp_code))
        })?;

        audit::record(
            &txn,
            EMPLOYEES_TABLE,
            created.id,
            AuditOperation::Insert,
            None,
            Some(&created),
            actor,
        )
        .await?;
        txn.commit().await?;

        info!(employee_id = %created.id, emp_code = %created.emp_code, "Employee created");
        self.event_sender
            .send_or_log(Event::EmployeeChanged(created.id))
            .await;
        self.get_employee(created.id).await
    }

    #[instrument(skip(self))]
    pub async fn update_employee(
        &self,
        id: Uuid,
        input: UpdateEmployeeInput,
        actor: Option<&str>,
    ) -> Result<EmployeeDetail, ServiceError> {
        input.validate()?;

        let txn = self.db_pool.begin().await?;
        let existing = Employee::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))?;

        let mut active: employee::ActiveModel = existing.clone().into();
        if let Some(emp_code) = input.emp_code.map(|c| c.trim().to_string()) {
            if emp_code != existing.emp_code {
                let taken = Employee::find()
                    .filter(EmployeeColumn::EmpCode.eq(emp_code.as_str()))
                    .count(&txn)
                    .await?;
                if taken > 0 {
                    return Err(ServiceError::Conflict(format!(
                        "Employee code '{}' already exists",
                        emp_code
                    )));
                }
            }
            active.emp_code = Set(emp_code);
        }
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(nickname) = input.nickname {
            active.nickname = Set(non_empty(nickname));
        }
        if let Some(gender) = input.gender {
            active.gender = Set(non_empty(gender));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(non_empty(image_url));
        }
        if let Some(email) = input.email {
            let email = non_empty(email);
            if let Some(address) = email.as_deref() {
                if !validator::validate_email(address) {
                    return Err(ServiceError::ValidationError(format!(
                        "'{}' is not a valid email address",
                        address
                    )));
                }
            }
            active.email = Set(email);
        }
        if let Some(location) = input.location {
            active.location = Set(non_empty(location));
        }
        if let Some(tel) = input.tel {
            active.tel = Set(non_empty(tel));
        }
        if let Some(department_id) = input.department_id {
            if let Some(department_id) = department_id {
                Department::find_by_id(department_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Department {} not found", department_id))
                    })?;
            }
            active.department_id = Set(department_id);
        }

        let updated = active.update(&txn).await.map_err(|e| {
            error!(employee_id = %id, "Failed to update employee: {}", e);
            ServiceError::from_write_error(e, "Employee code already exists")
        })?;

        audit::record(
            &txn,
            EMPLOYEES_TABLE,
            id,
            AuditOperation::Update,
            Some(&existing),
            Some(&updated),
            actor,
        )
        .await?;
        txn.commit().await?;

        info!(employee_id = %id, "Employee updated");
        self.event_sender
            .send_or_log(Event::EmployeeChanged(id))
            .await;
        self.get_employee(id).await
    }

    /// Refused while the employee has any transaction on record
    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: Uuid, actor: Option<&str>) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = Employee::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))?;

        let referenced = transaction::Entity::find()
            .filter(transaction::Column::EmployeeId.eq(id))
            .count(&txn)
            .await?;
        if referenced > 0 {
            return Err(ServiceError::Conflict(format!(
                "Employee {} has {} transaction(s)",
                existing.emp_code, referenced
            )));
        }

        Employee::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            EMPLOYEES_TABLE,
            id,
            AuditOperation::Delete,
            Some(&existing),
            None,
            actor,
        )
        .await?;
        txn.commit().await?;

        info!(employee_id = %id, "Employee deleted");
        self.event_sender
            .send_or_log(Event::EmployeeChanged(id))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_become_none() {
        let input = CreateEmployeeInput {
            emp_code: " EMP-7 ".into(),
            name: "Somchai".into(),
            nickname: Some("".into()),
            gender: None,
            image_url: None,
            email: Some("  ".into()),
            location: Some("HQ".into()),
            tel: None,
            department_id: None,
        }
        .normalized();
        assert_eq!(input.emp_code, "EMP-7");
        assert_eq!(input.nickname, None);
        assert_eq!(input.email, None);
        assert_eq!(input.location.as_deref(), Some("HQ"));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn malformed_email_fails_validation() {
        let input = CreateEmployeeInput {
            emp_code: "EMP-8".into(),
            name: "Malee".into(),
            nickname: None,
            gender: None,
            image_url: None,
            email: Some("not-an-email".into()),
            location: None,
            tel: None,
            department_id: None,
        };
        assert!(input.validate().is_err());
    }
}
