use crate::{
    db::DbPool,
    entities::{
        location,
        product::{self, Entity as Product},
        product_serial::{
            self, Column as SerialColumn, Entity as ProductSerial, STICKER_AFFIXED, STICKER_PENDING,
        },
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        audit::{self, AuditOperation, SERIALS_TABLE},
        stock::{AVAILABLE_STATUSES, BORROWED_STATUS},
    },
};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_sticker_status(value: &str) -> Result<(), ValidationError> {
    if value == STICKER_PENDING || value == STICKER_AFFIXED {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_sticker_status"))
    }
}

fn validate_status(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("status_must_not_be_blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
    pub p_id: String,
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub image_url: Option<String>,
}

impl From<product::Model> for ProductRef {
    fn from(p: product::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            p_id: p.p_id,
            category: p.category,
            brand: p.brand,
            model: p.model,
            image_url: p.image_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationRef {
    pub id: Uuid,
    pub name: String,
    pub building: Option<String>,
}

impl From<location::Model> for LocationRef {
    fn from(l: location::Model) -> Self {
        Self {
            id: l.id,
            name: l.name,
            building: l.building,
        }
    }
}

/// A serial with the product and location it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SerialDetail {
    pub id: Uuid,
    pub product_id: Uuid,
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
    pub product: Option<ProductRef>,
    pub location: Option<LocationRef>,
}

impl SerialDetail {
    fn new(
        serial: product_serial::Model,
        product: Option<product::Model>,
        location: Option<location::Model>,
    ) -> Self {
        Self {
            id: serial.id,
            product_id: serial.product_id,
            serial_code: serial.serial_code,
            status: serial.status,
            sticker_status: serial.sticker_status,
            sticker_date: serial.sticker_date,
            sticker_image_url: serial.sticker_image_url,
            image_url: serial.image_url,
            notes: serial.notes,
            location_id: serial.location_id,
            created_at: serial.created_at,
            updated_at: serial.updated_at,
            product: product.map(ProductRef::from),
            location: location.map(LocationRef::from),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SerialListQuery {
    /// Matches serial code or product name
    pub search: Option<String>,
    pub status: Option<String>,
    pub location_id: Option<Uuid>,
    pub sticker_status: Option<String>,
    /// First sticker day, inclusive
    pub sticker_from: Option<NaiveDate>,
    /// Last sticker day, inclusive
    pub sticker_to: Option<NaiveDate>,
}

/// Patch for one serial. Nullable fields accept an explicit `null` to clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSerialInput {
    #[validate(custom = "validate_status")]
    #[schema(example = "ส่งซ่อม")]
    pub status: Option<String>,
    #[validate(custom = "validate_sticker_status")]
    pub sticker_status: Option<String>,
    #[serde(default, deserialize_with = "crate::services::deserialize_some")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub sticker_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "crate::services::deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub sticker_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::services::deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::services::deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::services::deserialize_some")]
    #[schema(value_type = Option<Uuid>)]
    pub location_id: Option<Option<Uuid>>,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn apply_filters<Q>(mut select: Q, query: &SerialListQuery) -> Q
where
    Q: QueryFilter,
{
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(SerialColumn::SerialCode.contains(term))
                .add(product::Column::Name.contains(term)),
        );
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(SerialColumn::Status.eq(status));
    }
    if let Some(location_id) = query.location_id {
        select = select.filter(SerialColumn::LocationId.eq(location_id));
    }
    if let Some(sticker) = query.sticker_status.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(SerialColumn::StickerStatus.eq(sticker));
    }
    if let Some(from) = query.sticker_from {
        select = select.filter(SerialColumn::StickerDate.gte(start_of_day(from)));
    }
    if let Some(to) = query.sticker_to {
        match to.checked_add_days(Days::new(1)) {
            Some(next) => select = select.filter(SerialColumn::StickerDate.lt(start_of_day(next))),
            None => select = select.filter(SerialColumn::StickerDate.is_not_null()),
        }
    }
    select
}

async fn load_locations<C>(
    conn: &C,
    serials: &[(product_serial::Model, Option<product::Model>)],
) -> Result<HashMap<Uuid, location::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let ids: Vec<Uuid> = serials.iter().filter_map(|(s, _)| s.location_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let locations = location::Entity::find()
        .filter(location::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(locations.into_iter().map(|l| (l.id, l)).collect())
}

/// Service for serialized units: search, availability and manual edits
#[derive(Clone)]
pub struct SerialService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SerialService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn hydrate(
        &self,
        rows: Vec<(product_serial::Model, Option<product::Model>)>,
    ) -> Result<Vec<SerialDetail>, ServiceError> {
        let locations = load_locations(&*self.db_pool, &rows).await?;
        Ok(rows
            .into_iter()
            .map(|(serial, product)| {
                let location = serial
                    .location_id
                    .and_then(|id| locations.get(&id).cloned());
                SerialDetail::new(serial, product, location)
            })
            .collect())
    }

    /// Serial search ordered by code
    #[instrument(skip(self))]
    pub async fn list_serials(
        &self,
        query: SerialListQuery,
    ) -> Result<Vec<SerialDetail>, ServiceError> {
        let select = apply_filters(ProductSerial::find().find_also_related(Product), &query);
        let rows = select
            .order_by_asc(SerialColumn::SerialCode)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!("Failed to list serials: {}", e);
                ServiceError::db_error(e)
            })?;
        self.hydrate(rows).await
    }

    /// Serials in the available bucket, ready to be lent out
    #[instrument(skip(self))]
    pub async fn available_serials(&self) -> Result<Vec<SerialDetail>, ServiceError> {
        let rows = ProductSerial::find()
            .filter(SerialColumn::Status.is_in(AVAILABLE_STATUSES))
            .order_by_asc(SerialColumn::SerialCode)
            .find_also_related(Product)
            .all(&*self.db_pool)
            .await?;
        self.hydrate(rows).await
    }

    #[instrument(skip(self))]
    pub async fn serials_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<SerialDetail>, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let serials = ProductSerial::find()
            .filter(SerialColumn::ProductId.eq(product_id))
            .order_by_asc(SerialColumn::SerialCode)
            .all(&*self.db_pool)
            .await?;
        let rows = serials
            .into_iter()
            .map(|s| (s, Some(product.clone())))
            .collect();
        self.hydrate(rows).await
    }

    #[instrument(skip(self))]
    pub async fn get_serial(&self, id: Uuid) -> Result<SerialDetail, ServiceError> {
        let row = ProductSerial::find_by_id(id)
            .find_also_related(Product)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Serial {} not found", id)))?;
        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("Serial {} not found", id)))
    }

    /// Applies a manual edit. Marking the sticker affixed stamps today's
    /// date unless one is supplied or already recorded.
    #[instrument(skip(self))]
    pub async fn update_serial(
        &self,
        id: Uuid,
        input: UpdateSerialInput,
        actor: Option<&str>,
    ) -> Result<SerialDetail, ServiceError> {
        input.validate()?;

        let txn = self.db_pool.begin().await?;
        let existing = ProductSerial::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Serial {} not found", id)))?;

        if let Some(Some(location_id)) = input.location_id {
            location::Entity::find_by_id(location_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Location {} not found", location_id))
                })?;
        }

        let mut active: product_serial::ActiveModel = existing.clone().into();
        if let Some(status) = input.status {
            let status = status.trim().to_string();
            if status != existing.status && existing.status == BORROWED_STATUS {
                warn!(serial_id = %id, from = %existing.status, to = %status, "Manual status change on a borrowed serial");
            }
            active.status = Set(status);
        }
        if let Some(sticker_status) = input.sticker_status {
            let affixing = sticker_status == STICKER_AFFIXED
                && input.sticker_date.is_none()
                && existing.sticker_date.is_none();
            if affixing {
                active.sticker_date = Set(Some(Utc::now()));
            }
            active.sticker_status = Set(sticker_status);
        }
        if let Some(sticker_date) = input.sticker_date {
            active.sticker_date = Set(sticker_date);
        }
        if let Some(sticker_image_url) = input.sticker_image_url {
            active.sticker_image_url = Set(sticker_image_url);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        if let Some(location_id) = input.location_id {
            active.location_id = Set(location_id);
        }

        let updated = active.update(&txn).await.map_err(|e| {
            error!(serial_id = %id, "Failed to update serial: {}", e);
            ServiceError::db_error(e)
        })?;

        audit::record(
            &txn,
            SERIALS_TABLE,
            id,
            AuditOperation::Update,
            Some(&existing),
            Some(&updated),
            actor,
        )
        .await?;

        txn.commit().await?;

        info!(serial_id = %id, status = %updated.status, "Serial updated");
        self.event_sender
            .send_or_log(Event::SerialUpdated {
                serial_id: id,
                status: updated.status.clone(),
            })
            .await;

        self.get_serial(id).await
    }
}
