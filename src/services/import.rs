//! Bulk product import from CSV.
//!
//! Expected header: `name,category,brand,model,price,unit,quantity,description,notes`.
//! Rows are independent: a bad row is reported and the rest still import.

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        codes::{self, SYSTEM_CATEGORIES},
        non_empty,
        products::{CreateProductInput, ProductService, DEFAULT_UNIT},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    /// Rows imported
    pub success: usize,
    /// One message per failed row, `row N: …`
    pub errors: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImportRow {
    name: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    model: Option<String>,
    price: Option<String>,
    unit: Option<String>,
    quantity: Option<String>,
    description: Option<String>,
    notes: Option<String>,
}

/// Maps free CSV input to a system category by short code or full label.
/// Anything unrecognised lands in the first category.
pub fn resolve_category(input: Option<&str>) -> &'static str {
    let wanted = input.map(|s| s.trim().to_uppercase()).unwrap_or_default();
    SYSTEM_CATEGORIES
        .iter()
        .copied()
        .find(|label| {
            codes::category_code(label).as_deref() == Some(wanted.as_str())
                || label.to_uppercase() == wanted
        })
        .unwrap_or(SYSTEM_CATEGORIES[0])
}

fn to_input(row: ImportRow) -> Result<CreateProductInput, String> {
    let name = row
        .name
        .and_then(non_empty)
        .ok_or_else(|| "name is required".to_string())?;

    let price = row
        .price
        .as_deref()
        .and_then(|p| Decimal::from_str(p.trim()).ok())
        .unwrap_or_default();
    let quantity = row
        .quantity
        .as_deref()
        .and_then(|q| q.trim().parse::<i32>().ok())
        .unwrap_or_default();

    Ok(CreateProductInput {
        p_id: None,
        name,
        category: resolve_category(row.category.as_deref()).to_string(),
        brand: row.brand,
        model: row.model,
        price,
        unit: row
            .unit
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        quantity,
        description: row.description,
        notes: row.notes,
        image_url: None,
    })
}

/// Parses the CSV body into candidate products, keyed by their row number.
/// Row numbers count the header as row 1.
fn parse_rows(body: &str) -> Result<Vec<(usize, Result<CreateProductInput, String>)>, ServiceError> {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ServiceError::BadRequest(format!("unreadable CSV header: {}", e)))?
        .clone();
    if !headers.iter().any(|h| h == "name") {
        return Err(ServiceError::BadRequest(
            "CSV header must contain a `name` column".to_string(),
        ));
    }

    let mut rows = Vec::new();
    let mut index = 0usize;
    for record in reader.records() {
        let row_number = index + 2;
        let parsed = match record {
            Ok(record) if record.iter().all(str::is_empty) => continue,
            Ok(record) => record
                .deserialize::<ImportRow>(Some(&headers))
                .map_err(|e| e.to_string())
                .and_then(to_input),
            Err(e) => Err(e.to_string()),
        };
        rows.push((row_number, parsed));
        index += 1;
    }
    Ok(rows)
}

#[derive(Clone)]
pub struct ImportService {
    products: ProductService,
    event_sender: Arc<EventSender>,
}

impl ImportService {
    pub fn new(products: ProductService, event_sender: Arc<EventSender>) -> Self {
        Self {
            products,
            event_sender,
        }
    }

    /// Imports each row as a new product with a generated SKU and its serial batch
    #[instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn import_csv(
        &self,
        body: &str,
        actor: Option<&str>,
    ) -> Result<ImportReport, ServiceError> {
        let mut report = ImportReport::default();

        for (row_number, parsed) in parse_rows(body)? {
            let outcome = match parsed {
                Ok(input) => self
                    .products
                    .create_product(input, actor)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.response_message()),
                Err(message) => Err(message),
            };
            match outcome {
                Ok(()) => report.success += 1,
                Err(message) => {
                    warn!(row = row_number, error = %message, "Import row rejected");
                    report.errors.push(format!("row {}: {}", row_number, message));
                }
            }
        }

        info!(imported = report.success, failed = report.errors.len(), "CSV import finished");
        self.event_sender
            .send_or_log(Event::ImportCompleted {
                imported: report.success,
                failed: report.errors.len(),
            })
            .await;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(Some("IT"), "ไอที/อิเล็กทรอนิกส์ (IT)")]
    #[case(Some(" fr "), "เฟอร์นิเจอร์ (FR)")]
    #[case(Some("อุปกรณ์โสต/สื่อ (AV)"), "อุปกรณ์โสต/สื่อ (AV)")]
    #[case(Some("Unknown"), "ไอที/อิเล็กทรอนิกส์ (IT)")]
    #[case(None, "ไอที/อิเล็กทรอนิกส์ (IT)")]
    fn resolves_categories(#[case] input: Option<&str>, #[case] expected: &str) {
        assert_eq!(resolve_category(input), expected);
    }

    #[test]
    fn parses_rows_with_defaults_and_bom() {
        let body = "\u{feff}name,category,brand,model,price,unit,quantity,description,notes\n\
                    Dell Latitude 3420,IT,Dell,3420,25000,เครื่อง,5,Core i5,ล็อตปี 67\n\
                    \n\
                    เก้าอี้,FR,,,abc,,x,,\n";
        let rows = parse_rows(body).unwrap();
        assert_eq!(rows.len(), 2);

        let (n, first) = &rows[0];
        assert_eq!(*n, 2);
        let first = first.as_ref().unwrap();
        assert_eq!(first.price, dec!(25000));
        assert_eq!(first.quantity, 5);
        assert_eq!(first.unit, "เครื่อง");

        let (n, second) = &rows[1];
        assert_eq!(*n, 3);
        let second = second.as_ref().unwrap();
        assert_eq!(second.category, "เฟอร์นิเจอร์ (FR)");
        assert_eq!(second.price, Decimal::ZERO);
        assert_eq!(second.quantity, 0);
        assert_eq!(second.unit, DEFAULT_UNIT);
        assert_eq!(second.brand, None);
    }

    #[test]
    fn missing_name_is_a_row_error() {
        let rows = parse_rows("name,category\n,IT\nMouse,IT\n").unwrap();
        assert_eq!(rows[0].0, 2);
        assert_eq!(rows[0].1.as_ref().unwrap_err(), "name is required");
        assert!(rows[1].1.is_ok());
    }

    #[test]
    fn header_without_name_is_rejected() {
        assert!(matches!(
            parse_rows("title,category\nMouse,IT\n"),
            Err(ServiceError::BadRequest(_))
        ));
    }
}
