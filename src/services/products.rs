use crate::{
    db::DbPool,
    entities::{
        product::{self, Column as ProductColumn, Entity as Product},
        product_serial::{self, STICKER_PENDING},
        transaction::{self, TransactionStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        audit::{self, AuditOperation, PRODUCTS_TABLE},
        codes, non_empty,
        stock::{self, StockCounts, INITIAL_STATUS},
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Serial rows per INSERT statement; keeps bind parameters well under SQLite's limit
const SERIAL_INSERT_CHUNK: usize = 200;
pub const DEFAULT_UNIT: &str = "ชิ้น";

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("price_must_not_be_negative"));
    }
    Ok(())
}

/// A product together with the stock derived from its serials
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductWithStock {
    pub id: Uuid,
    pub p_id: String,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[schema(value_type = String, example = "25000.00")]
    pub price: Decimal,
    pub unit: String,
    pub quantity: i32,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub stock_total: u64,
    pub stock_available: u64,
    pub stock_borrowed: u64,
    pub stock_repair: u64,
}

impl ProductWithStock {
    pub fn new(product: product::Model, counts: StockCounts) -> Self {
        Self {
            id: product.id,
            p_id: product.p_id,
            name: product.name,
            category: product.category,
            brand: product.brand,
            model: product.model,
            price: product.price,
            unit: product.unit,
            quantity: product.quantity,
            description: product.description,
            notes: product.notes,
            image_url: product.image_url,
            created_at: product.created_at,
            updated_at: product.updated_at,
            stock_total: counts.total,
            stock_available: counts.available,
            stock_borrowed: counts.borrowed,
            stock_repair: counts.repair,
        }
    }
}

/// Result of a mutation that may have generated serials
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductWithSerials {
    pub product: ProductWithStock,
    /// Serial codes created by this request, in order
    pub serial_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    /// SKU to use instead of a generated one; must match the category prefix
    #[schema(example = "IT-0008")]
    pub p_id: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    #[schema(example = "ไอที/อิเล็กทรอนิกส์ (IT)")]
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "25000.00")]
    pub price: Decimal,
    #[serde(default = "default_unit")]
    #[validate(length(min = 1))]
    pub unit: String,
    /// Number of serials generated with the product
    #[serde(default)]
    #[validate(range(min = 0, max = 9999))]
    pub quantity: i32,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update. Optional text fields are cleared by sending an empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[validate(custom = "validate_price")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(length(min = 1))]
    pub unit: Option<String>,
    /// Raising this above the current serial count appends serials
    #[validate(range(min = 0, max = 9999))]
    pub quantity: Option<i32>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Matches name, SKU, brand or model
    pub search: Option<String>,
    /// Exact category label
    pub category: Option<String>,
}

/// Inserts `count` fresh serials for `product`, continuing its numbering.
pub(crate) async fn append_serials<C>(
    conn: &C,
    product: &product::Model,
    count: usize,
) -> Result<Vec<String>, ServiceError>
where
    C: ConnectionTrait,
{
    let serial_codes = codes::next_serial_codes(conn, product.id, &product.p_id, count).await?;
    if serial_codes.is_empty() {
        return Ok(serial_codes);
    }

    let now = Utc::now();
    let rows: Vec<product_serial::ActiveModel> = serial_codes
        .iter()
        .map(|code| product_serial::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            serial_code: Set(code.clone()),
            status: Set(INITIAL_STATUS.to_string()),
            sticker_status: Set(STICKER_PENDING.to_string()),
            sticker_date: Set(None),
            sticker_image_url: Set(None),
            image_url: Set(None),
            notes: Set(None),
            location_id: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        })
        .collect();

    for chunk in rows.chunks(SERIAL_INSERT_CHUNK) {
        product_serial::Entity::insert_many(chunk.iter().cloned())
            .exec_without_returning(conn)
            .await
            .map_err(|e| {
                error!(product_id = %product.id, "Failed to insert serials: {}", e);
                ServiceError::from_write_error(
                    e,
                    format!("serial codes for {} already exist", product.p_id),
                )
            })?;
    }

    Ok(serial_codes)
}

/// Service for the product catalog and its serial batches
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a product and its initial serial batch in one transaction
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
        actor: Option<&str>,
    ) -> Result<ProductWithSerials, ServiceError> {
        input.validate()?;

        let txn = self.db_pool.begin().await?;

        let p_id = match input.p_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(sku) => {
                codes::validate_sku(sku, &input.category)?;
                let taken = Product::find()
                    .filter(ProductColumn::PId.eq(sku))
                    .one(&txn)
                    .await?
                    .is_some();
                if taken {
                    return Err(ServiceError::Conflict(format!(
                        "Product with SKU '{}' already exists",
                        sku
                    )));
                }
                sku.to_string()
            }
            None => codes::next_product_sku(&txn, &input.category).await?,
        };

        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            p_id: Set(p_id.clone()),
            name: Set(input.name.trim().to_string()),
            category: Set(input.category),
            brand: Set(input.brand.and_then(non_empty)),
            model: Set(input.model.and_then(non_empty)),
            price: Set(input.price),
            unit: Set(input.unit),
            quantity: Set(input.quantity),
            description: Set(input.description.and_then(non_empty)),
            notes: Set(input.notes.and_then(non_empty)),
            image_url: Set(input.image_url.and_then(non_empty)),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(p_id = %p_id, "Failed to create product: {}", e);
            ServiceError::from_write_error(e, format!("Product with SKU '{}' already exists", p_id))
        })?;

        let count = usize::try_from(created.quantity).unwrap_or_default();
        let serial_codes = append_serials(&txn, &created, count).await?;

        audit::record(
            &txn,
            PRODUCTS_TABLE,
            created.id,
            AuditOperation::Insert,
            None,
            Some(&created),
            actor,
        )
        .await?;

        txn.commit().await?;

        info!(product_id = %created.id, p_id = %created.p_id, serials = serial_codes.len(), "Product created");
        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;
        if !serial_codes.is_empty() {
            self.event_sender
                .send_or_log(Event::SerialsGenerated {
                    product_id: created.id,
                    serial_codes: serial_codes.clone(),
                })
                .await;
        }

        let mut counts = StockCounts::default();
        for _ in &serial_codes {
            counts.record(INITIAL_STATUS);
        }

        Ok(ProductWithSerials {
            product: ProductWithStock::new(created, counts),
            serial_codes,
        })
    }

    /// Updates catalog fields. The SKU never changes; a larger `quantity`
    /// appends serials after the last existing one.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
        actor: Option<&str>,
    ) -> Result<ProductWithSerials, ServiceError> {
        input.validate()?;

        let txn = self.db_pool.begin().await?;

        let existing = Product::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let current_serials = product_serial::Entity::find()
            .filter(product_serial::Column::ProductId.eq(id))
            .count(&txn)
            .await?;

        let mut active: product::ActiveModel = existing.clone().into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(brand) = input.brand {
            active.brand = Set(non_empty(brand));
        }
        if let Some(model) = input.model {
            active.model = Set(non_empty(model));
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(description) = input.description {
            active.description = Set(non_empty(description));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(non_empty(notes));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(non_empty(image_url));
        }

        let updated = active.update(&txn).await.map_err(|e| {
            error!(product_id = %id, "Failed to update product: {}", e);
            ServiceError::db_error(e)
        })?;

        let requested = input
            .quantity
            .and_then(|q| u64::try_from(q).ok())
            .unwrap_or_default();
        let serial_codes = if requested > current_serials {
            let missing = usize::try_from(requested - current_serials).unwrap_or_default();
            append_serials(&txn, &updated, missing).await?
        } else {
            Vec::new()
        };

        audit::record(
            &txn,
            PRODUCTS_TABLE,
            id,
            AuditOperation::Update,
            Some(&existing),
            Some(&updated),
            actor,
        )
        .await?;

        txn.commit().await?;

        info!(product_id = %id, added_serials = serial_codes.len(), "Product updated");
        self.event_sender
            .send_or_log(Event::ProductUpdated(id))
            .await;
        if !serial_codes.is_empty() {
            self.event_sender
                .send_or_log(Event::SerialsGenerated {
                    product_id: id,
                    serial_codes: serial_codes.clone(),
                })
                .await;
        }

        Ok(ProductWithSerials {
            product: self.get_product(id).await?,
            serial_codes,
        })
    }

    /// Deletes a product, its serials and their transactions.
    /// Refused while any serial is out on an active borrow.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid, actor: Option<&str>) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        let existing = Product::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let serials_of_product = Query::select()
            .column(product_serial::Column::Id)
            .from(product_serial::Entity)
            .and_where(product_serial::Column::ProductId.eq(id))
            .to_owned();

        let on_loan = transaction::Entity::find()
            .filter(transaction::Column::SerialId.in_subquery(serials_of_product.clone()))
            .filter(transaction::Column::Status.eq(TransactionStatus::Active.as_ref()))
            .count(&txn)
            .await?;
        if on_loan > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} has {} serial(s) on loan",
                existing.p_id, on_loan
            )));
        }

        transaction::Entity::delete_many()
            .filter(transaction::Column::SerialId.in_subquery(serials_of_product))
            .exec(&txn)
            .await?;
        let removed_serials = product_serial::Entity::delete_many()
            .filter(product_serial::Column::ProductId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        Product::delete_by_id(id).exec(&txn).await?;

        audit::record(
            &txn,
            PRODUCTS_TABLE,
            id,
            AuditOperation::Delete,
            Some(&existing),
            None,
            actor,
        )
        .await?;

        txn.commit().await?;

        info!(product_id = %id, p_id = %existing.p_id, removed_serials, "Product deleted");
        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductWithStock, ServiceError> {
        let db = &*self.db_pool;
        let product = Product::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let counts = stock::load_counts(db, Some(std::slice::from_ref(&id)))
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(ProductWithStock::new(product, counts))
    }

    /// Products newest first, each with its derived stock
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductListQuery,
    ) -> Result<Vec<ProductWithStock>, ServiceError> {
        let db = &*self.db_pool;

        let mut select = Product::find();
        let mut filtered = false;
        if let Some(category) = query.category.and_then(non_empty) {
            select = select.filter(ProductColumn::Category.eq(category));
            filtered = true;
        }
        if let Some(term) = query.search.and_then(non_empty) {
            select = select.filter(
                Condition::any()
                    .add(ProductColumn::Name.contains(&term))
                    .add(ProductColumn::PId.contains(&term))
                    .add(ProductColumn::Brand.contains(&term))
                    .add(ProductColumn::Model.contains(&term)),
            );
            filtered = true;
        }

        let products = select
            .order_by_desc(ProductColumn::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!("Failed to list products: {}", e);
                ServiceError::db_error(e)
            })?;

        let mut counts = if filtered {
            let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
            stock::load_counts(db, Some(&ids)).await?
        } else {
            stock::load_counts(db, None).await?
        };

        Ok(products
            .into_iter()
            .map(|p| {
                let c = counts.remove(&p.id).unwrap_or_default();
                ProductWithStock::new(p, c)
            })
            .collect())
    }

    /// Preview of the SKU the next product in `category` would receive
    #[instrument(skip(self))]
    pub async fn next_sku(&self, category: &str) -> Result<String, ServiceError> {
        codes::next_product_sku(&*self.db_pool, category).await
    }
}
