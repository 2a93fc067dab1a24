use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_directory_tables::Migration),
            Box::new(m20240101_000002_create_products_tables::Migration),
            Box::new(m20240101_000003_create_transactions_table::Migration),
            Box::new(m20240101_000004_create_audit_logs_table::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    Name,
    Building,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    EmpCode,
    Name,
    Nickname,
    Gender,
    ImageUrl,
    Email,
    Location,
    Tel,
    DepartmentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    PId,
    Name,
    Category,
    Brand,
    Model,
    Price,
    Unit,
    Quantity,
    Description,
    Notes,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProductSerials {
    Table,
    Id,
    ProductId,
    SerialCode,
    Status,
    StickerStatus,
    StickerDate,
    StickerImageUrl,
    ImageUrl,
    Notes,
    LocationId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    SerialId,
    EmployeeId,
    DepartmentId,
    BorrowDate,
    ReturnDate,
    Status,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    TableName,
    RecordId,
    Operation,
    OldData,
    NewData,
    ChangedBy,
    CreatedAt,
}

mod m20240101_000001_create_directory_tables {
    use super::{Departments, Employees, Locations};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_directory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Departments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Departments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Departments::Name).string().not_null())
                        .col(
                            ColumnDef::new(Departments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Locations::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(ColumnDef::new(Locations::Building).string().null())
                        .col(
                            ColumnDef::new(Locations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Employees::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Employees::EmpCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Employees::Name).string().not_null())
                        .col(ColumnDef::new(Employees::Nickname).string().null())
                        .col(ColumnDef::new(Employees::Gender).string().null())
                        .col(ColumnDef::new(Employees::ImageUrl).string().null())
                        .col(ColumnDef::new(Employees::Email).string().null())
                        .col(ColumnDef::new(Employees::Location).string().null())
                        .col(ColumnDef::new(Employees::Tel).string().null())
                        .col(ColumnDef::new(Employees::DepartmentId).uuid().null())
                        .col(
                            ColumnDef::new(Employees::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Employees::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_employees_department_id")
                                .from(Employees::Table, Employees::DepartmentId)
                                .to(Departments::Table, Departments::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_employees_department_id")
                        .table(Employees::Table)
                        .col(Employees::DepartmentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Employees::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Departments::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_products_tables {
    use super::{Locations, ProductSerials, Products};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::PId).string().not_null().unique_key())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Category).string().not_null())
                        .col(ColumnDef::new(Products::Brand).string().null())
                        .col(ColumnDef::new(Products::Model).string().null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Unit).string().not_null())
                        .col(
                            ColumnDef::new(Products::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::Notes).text().null())
                        .col(ColumnDef::new(Products::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_created_at")
                        .table(Products::Table)
                        .col(Products::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductSerials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductSerials::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductSerials::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductSerials::SerialCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(ProductSerials::Status).string().not_null())
                        .col(
                            ColumnDef::new(ProductSerials::StickerStatus)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductSerials::StickerDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(ProductSerials::StickerImageUrl).string().null())
                        .col(ColumnDef::new(ProductSerials::ImageUrl).string().null())
                        .col(ColumnDef::new(ProductSerials::Notes).text().null())
                        .col(ColumnDef::new(ProductSerials::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(ProductSerials::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductSerials::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_serials_product_id")
                                .from(ProductSerials::Table, ProductSerials::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_serials_location_id")
                                .from(ProductSerials::Table, ProductSerials::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_serials_product_id")
                        .table(ProductSerials::Table)
                        .col(ProductSerials::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_serials_status")
                        .table(ProductSerials::Table)
                        .col(ProductSerials::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductSerials::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000003_create_transactions_table {
    use super::{Departments, Employees, ProductSerials, Transactions};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Transactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transactions::SerialId).uuid().not_null())
                        .col(ColumnDef::new(Transactions::EmployeeId).uuid().null())
                        .col(ColumnDef::new(Transactions::DepartmentId).uuid().null())
                        .col(
                            ColumnDef::new(Transactions::BorrowDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::ReturnDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Transactions::Status).string().not_null())
                        .col(ColumnDef::new(Transactions::Note).text().null())
                        .col(
                            ColumnDef::new(Transactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transactions_serial_id")
                                .from(Transactions::Table, Transactions::SerialId)
                                .to(ProductSerials::Table, ProductSerials::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transactions_employee_id")
                                .from(Transactions::Table, Transactions::EmployeeId)
                                .to(Employees::Table, Employees::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transactions_department_id")
                                .from(Transactions::Table, Transactions::DepartmentId)
                                .to(Departments::Table, Departments::Id),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, column) in [
                ("idx_transactions_serial_id", Transactions::SerialId),
                ("idx_transactions_employee_id", Transactions::EmployeeId),
                ("idx_transactions_status", Transactions::Status),
                ("idx_transactions_created_at", Transactions::CreatedAt),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Transactions::Table)
                            .col(column)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Transactions::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000004_create_audit_logs_table {
    use super::AuditLogs;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_audit_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AuditLogs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(AuditLogs::TableName).string().not_null())
                        .col(ColumnDef::new(AuditLogs::RecordId).uuid().not_null())
                        .col(ColumnDef::new(AuditLogs::Operation).string().not_null())
                        .col(ColumnDef::new(AuditLogs::OldData).json().null())
                        .col(ColumnDef::new(AuditLogs::NewData).json().null())
                        .col(ColumnDef::new(AuditLogs::ChangedBy).string().null())
                        .col(
                            ColumnDef::new(AuditLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_audit_logs_record")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::TableName)
                        .col(AuditLogs::RecordId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }
}
