use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "1.0.0",
        description = r#"
# Stockroom Asset Tracking API

Tracks company equipment down to the individual physical unit.

## Concepts

- **Product**: a kind of item with a category-derived SKU such as `IT-0008`
- **Serial**: one physical unit of a product, coded `IT-0008-0003`
- **Transaction**: a borrow of one serial by an employee or a department
- **Stock**: always derived from serial statuses, never stored

## Attribution

Mutating requests may carry an `x-actor-email` header. It is recorded as
`changed_by` in the audit log and is not an authentication mechanism.

## Error Handling

Errors share one shape:

```json
{
  "error": "Conflict",
  "message": "Serial IT-0008-0003 is already on loan",
  "request_id": "5f0c…",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Catalogue, SKUs, serial batches and CSV import"),
        (name = "Serials", description = "Individual units, stickers and locations"),
        (name = "Transactions", description = "Borrow and return"),
        (name = "Employees", description = "Employee directory"),
        (name = "Departments", description = "Departments"),
        (name = "Locations", description = "Storage locations"),
        (name = "Dashboard", description = "Inventory statistics"),
        (name = "Categories", description = "System categories")
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::next_sku,
        crate::handlers::products::import_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::product_serials,
        crate::handlers::products::product_history,

        // Serials
        crate::handlers::serials::list_serials,
        crate::handlers::serials::available_serials,
        crate::handlers::serials::get_serial,
        crate::handlers::serials::update_serial,
        crate::handlers::serials::serial_history,

        // Transactions
        crate::handlers::transactions::list_transactions,
        crate::handlers::transactions::recent_transactions,
        crate::handlers::transactions::borrow,
        crate::handlers::transactions::return_serial,

        // Directory
        crate::handlers::employees::list_employees,
        crate::handlers::employees::create_employee,
        crate::handlers::employees::get_employee,
        crate::handlers::employees::update_employee,
        crate::handlers::employees::delete_employee,
        crate::handlers::employees::employee_transactions,
        crate::handlers::departments::list_departments,
        crate::handlers::departments::create_department,
        crate::handlers::departments::delete_department,
        crate::handlers::locations::list_locations,
        crate::handlers::locations::create_location,
        crate::handlers::locations::delete_location,

        // Reporting
        crate::handlers::dashboard::dashboard_stats,
        crate::handlers::dashboard::low_stock,
        crate::handlers::categories::list_categories,
    ),
    components(
        schemas(
            crate::ResponseMeta,

            // Products
            crate::services::products::ProductWithStock,
            crate::services::products::ProductWithSerials,
            crate::services::products::CreateProductInput,
            crate::services::products::UpdateProductInput,
            crate::services::import::ImportReport,
            crate::handlers::products::NextSkuResponse,

            // Serials
            crate::services::serials::SerialDetail,
            crate::services::serials::ProductRef,
            crate::services::serials::LocationRef,
            crate::services::serials::UpdateSerialInput,

            // Transactions
            crate::entities::transaction::TransactionStatus,
            crate::services::lending::BorrowInput,
            crate::services::lending::TransactionDetail,
            crate::services::lending::EmployeeRef,
            crate::services::lending::DepartmentRef,
            crate::services::lending::SerialRef,

            // Directory
            crate::entities::department::Model,
            crate::entities::location::Model,
            crate::entities::employee::Model,
            crate::entities::audit_log::Model,
            crate::services::master_data::CreateDepartmentInput,
            crate::services::master_data::CreateLocationInput,
            crate::services::master_data::CreateEmployeeInput,
            crate::services::master_data::UpdateEmployeeInput,
            crate::services::master_data::EmployeeDetail,

            // Reporting
            crate::services::dashboard::DashboardStats,
            crate::services::dashboard::CategoryStat,
            crate::services::dashboard::StatusStat,
            crate::services::dashboard::LowStockItem,
            crate::services::dashboard::InventorySummaryItem,
            crate::handlers::categories::CategoryInfo,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
