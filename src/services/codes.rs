//! SKU and serial code generation.
//!
//! Product SKUs look like `IT-0008`: the category's short code followed by a
//! zero-padded sequence. Serial codes extend the SKU with their own sequence,
//! e.g. `IT-0008-0003`. The next SKU follows the highest sequence among codes
//! that are exactly `{prefix}-<digits>`. Serial codes follow the
//! lexicographically greatest code of their product, which is only sound while
//! every sequence has exactly [`SEQUENCE_WIDTH`] digits; [`MAX_SEQUENCE`]
//! enforces that.

use crate::{
    entities::{product, product_serial},
    errors::ServiceError,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    sea_query::LikeExpr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

/// Prefix used when a category label carries no `( … )` code
pub const DEFAULT_PREFIX: &str = "GEN";
pub const SEQUENCE_WIDTH: usize = 4;
pub const MAX_SEQUENCE: u32 = 9999;

/// Categories offered by the system. Each label embeds its SKU prefix.
pub const SYSTEM_CATEGORIES: [&str; 10] = [
    "ไอที/อิเล็กทรอนิกส์ (IT)",
    "เฟอร์นิเจอร์ (FR)",
    "เครื่องมือ/อุปกรณ์ช่าง (TL)",
    "เสื้อผ้าและเครื่องแต่งกาย (CL)",
    "วัสดุสิ้นเปลือง (CS)",
    "อุปกรณ์สำนักงาน (ST)",
    "อะไหล่/ชิ้นส่วนสำรอง (SP)",
    "เครื่องใช้ไฟฟ้าบาง (AP)",
    "อุปกรณ์ความปลอดภัย (PP)",
    "อุปกรณ์โสต/สื่อ (AV)",
];

static CATEGORY_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("category code pattern is valid"));
static TRAILING_SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(\d+)$").expect("sequence pattern is valid"));
static SKU_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)-(\d{4})$").expect("sku pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("sequence for prefix {prefix} is exhausted (max {max})")]
    SequenceExhausted { prefix: String, max: u32 },

    #[error("code {code} does not start with prefix {expected}")]
    PrefixMismatch { code: String, expected: String },

    #[error("code {0} must have the form PREFIX-NNNN")]
    MalformedCode(String),
}

impl From<CodeError> for ServiceError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::SequenceExhausted { .. } => ServiceError::InvalidOperation(err.to_string()),
            CodeError::PrefixMismatch { .. } | CodeError::MalformedCode(_) => {
                ServiceError::ValidationError(err.to_string())
            }
        }
    }
}

/// Text inside the first parenthesised group of a category label, upper-cased.
pub fn category_code(label: &str) -> Option<String> {
    CATEGORY_CODE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_uppercase())
        .filter(|code| !code.is_empty())
}

pub fn sku_prefix(category: &str) -> String {
    category_code(category).unwrap_or_else(|| DEFAULT_PREFIX.to_string())
}

/// Short label for grouping: the embedded code, else the first 10 characters.
pub fn category_short_label(category: &str) -> String {
    category_code(category).unwrap_or_else(|| category.chars().take(10).collect())
}

/// Trailing numeric group after the last hyphen, if any.
pub fn parse_sequence(code: &str) -> Option<u32> {
    TRAILING_SEQUENCE
        .captures(code.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn next_sequence(last_code: Option<&str>) -> u32 {
    last_code
        .and_then(parse_sequence)
        .map(|n| n.saturating_add(1))
        .unwrap_or(1)
}

pub fn format_code(prefix: &str, sequence: u32) -> Result<String, CodeError> {
    if sequence > MAX_SEQUENCE {
        return Err(CodeError::SequenceExhausted {
            prefix: prefix.to_string(),
            max: MAX_SEQUENCE,
        });
    }
    Ok(format!("{}-{:0width$}", prefix, sequence, width = SEQUENCE_WIDTH))
}

/// `LIKE` pattern for codes starting with `{prefix}-`. Wildcards in the prefix
/// are escaped with a backslash.
pub fn prefix_like_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 2);
    for ch in prefix.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push_str("-%");
    pattern
}

/// Sequence of `code` when it is exactly `{prefix}-` followed by digits.
pub fn sequence_under_prefix(prefix: &str, code: &str) -> Option<u32> {
    let digits = code.strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// The code that follows `last_code` under `prefix`.
pub fn next_code(prefix: &str, last_code: Option<&str>) -> Result<String, CodeError> {
    format_code(prefix, next_sequence(last_code))
}

/// `count` consecutive serial codes for `sku`, continuing after `last_serial`.
pub fn serial_codes(
    sku: &str,
    last_serial: Option<&str>,
    count: usize,
) -> Result<Vec<String>, CodeError> {
    let start = next_sequence(last_serial);
    (0..count)
        .map(|offset| {
            let sequence = u32::try_from(offset)
                .ok()
                .and_then(|offset| start.checked_add(offset))
                .unwrap_or(u32::MAX);
            format_code(sku, sequence)
        })
        .collect()
}

/// Checks a caller-supplied SKU against the category it is filed under.
pub fn validate_sku(sku: &str, category: &str) -> Result<(), CodeError> {
    let caps = SKU_SHAPE
        .captures(sku)
        .ok_or_else(|| CodeError::MalformedCode(sku.to_string()))?;
    let expected = sku_prefix(category);
    if &caps[1] != expected.as_str() {
        return Err(CodeError::PrefixMismatch {
            code: sku.to_string(),
            expected,
        });
    }
    Ok(())
}

/// Looks up the greatest SKU under the category's prefix and returns the next one.
pub async fn next_product_sku<C>(conn: &C, category: &str) -> Result<String, ServiceError>
where
    C: ConnectionTrait,
{
    let prefix = sku_prefix(category);
    let pattern = LikeExpr::new(prefix_like_pattern(&prefix)).escape('\\');
    let candidates: Vec<String> = product::Entity::find()
        .select_only()
        .column(product::Column::PId)
        .filter(product::Column::PId.like(pattern))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| {
            error!(prefix = %prefix, "SKU lookup failed: {}", e);
            ServiceError::db_error(e)
        })?;

    // LIKE also matches longer prefixes (`IT-X-0001`) and, on SQLite, other cases
    let last = candidates
        .iter()
        .filter_map(|code| sequence_under_prefix(&prefix, code))
        .max();

    let code = format_code(&prefix, last.map_or(1, |n| n.saturating_add(1)))?;
    debug!(prefix = %prefix, last = ?last, next = %code, "generated SKU");
    Ok(code)
}

/// Generates `count` serial codes continuing after the product's greatest serial.
pub async fn next_serial_codes<C>(
    conn: &C,
    product_id: Uuid,
    sku: &str,
    count: usize,
) -> Result<Vec<String>, ServiceError>
where
    C: ConnectionTrait,
{
    if count == 0 {
        return Ok(Vec::new());
    }

    let last: Option<String> = product_serial::Entity::find()
        .select_only()
        .column(product_serial::Column::SerialCode)
        .filter(product_serial::Column::ProductId.eq(product_id))
        .order_by_desc(product_serial::Column::SerialCode)
        .into_tuple()
        .one(conn)
        .await
        .map_err(|e| {
            error!(product_id = %product_id, "serial lookup failed: {}", e);
            ServiceError::db_error(e)
        })?;

    Ok(serial_codes(sku, last.as_deref(), count)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("ไอที/อิเล็กทรอนิกส์ (IT)", Some("IT"))]
    #[case("เฟอร์นิเจอร์ (fr)", Some("FR"))]
    #[case("Custom ( ab )", Some("AB"))]
    #[case("Two (X1) codes (Y2)", Some("X1"))]
    #[case("No code here", None)]
    #[case("Empty ()", None)]
    fn extracts_category_code(#[case] label: &str, #[case] expected: Option<&str>) {
        assert_eq!(category_code(label).as_deref(), expected);
    }

    #[test]
    fn missing_code_falls_back_to_default_prefix() {
        assert_eq!(sku_prefix("อื่นๆ"), DEFAULT_PREFIX);
        assert_eq!(sku_prefix("อุปกรณ์โสต/สื่อ (AV)"), "AV");
    }

    #[test]
    fn short_label_truncates_by_characters() {
        assert_eq!(category_short_label("อุปกรณ์สำนักงาน (ST)"), "ST");
        assert_eq!(category_short_label("Miscellaneous items"), "Miscellane");
        assert_eq!(category_short_label("อุปกรณ์สำนักงานใหม่").chars().count(), 10);
    }

    #[rstest]
    #[case(None, "IT-0001")]
    #[case(Some("IT-0007"), "IT-0008")]
    #[case(Some("IT-0099"), "IT-0100")]
    #[case(Some("IT-abc"), "IT-0001")]
    #[case(Some("garbage"), "IT-0001")]
    fn next_code_follows_last_code(#[case] last: Option<&str>, #[case] expected: &str) {
        assert_eq!(next_code("IT", last).unwrap(), expected);
    }

    #[test]
    fn sequence_is_capped_at_four_digits() {
        assert_eq!(next_code("IT", Some("IT-9998")).unwrap(), "IT-9999");
        assert_matches!(
            next_code("IT", Some("IT-9999")),
            Err(CodeError::SequenceExhausted { max: 9999, .. })
        );
    }

    #[test]
    fn serial_codes_start_at_one_for_new_product() {
        let codes = serial_codes("IT-0008", None, 3).unwrap();
        assert_eq!(codes, vec!["IT-0008-0001", "IT-0008-0002", "IT-0008-0003"]);
    }

    #[test]
    fn serial_codes_continue_after_last_serial() {
        let codes = serial_codes("FR-0002", Some("FR-0002-0005"), 2).unwrap();
        assert_eq!(codes, vec!["FR-0002-0006", "FR-0002-0007"]);
        assert!(serial_codes("FR-0002", Some("FR-0002-0005"), 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn serial_batch_past_cap_fails_whole_batch() {
        assert_matches!(
            serial_codes("IT-0001", Some("IT-0001-9998"), 3),
            Err(CodeError::SequenceExhausted { .. })
        );
    }

    #[rstest]
    #[case("IT", "IT-%")]
    #[case("A_B", "A\\_B-%")]
    #[case("5%", "5\\%-%")]
    #[case("A\\B", "A\\\\B-%")]
    fn like_pattern_escapes_wildcards(#[case] prefix: &str, #[case] expected: &str) {
        assert_eq!(prefix_like_pattern(prefix), expected);
    }

    #[rstest]
    #[case("IT", "IT-0007", Some(7))]
    #[case("IT", "IT-X-0001", None)]
    #[case("IT", "it-0003", None)]
    #[case("A_B", "AXB-0041", None)]
    #[case("IT", "IT-", None)]
    #[case("IT-X", "IT-X-0002", Some(2))]
    fn only_exact_prefix_codes_count(
        #[case] prefix: &str,
        #[case] code: &str,
        #[case] expected: Option<u32>,
    ) {
        assert_eq!(sequence_under_prefix(prefix, code), expected);
    }

    #[test]
    fn validate_sku_checks_prefix_and_shape() {
        assert!(validate_sku("IT-0042", "ไอที/อิเล็กทรอนิกส์ (IT)").is_ok());
        assert!(validate_sku("GEN-0001", "uncategorised").is_ok());
        assert_matches!(
            validate_sku("FR-0042", "ไอที/อิเล็กทรอนิกส์ (IT)"),
            Err(CodeError::PrefixMismatch { .. })
        );
        assert_matches!(
            validate_sku("IT-42", "ไอที/อิเล็กทรอนิกส์ (IT)"),
            Err(CodeError::MalformedCode(_))
        );
    }

    #[test]
    fn code_errors_map_to_client_errors() {
        let exhausted: ServiceError = CodeError::SequenceExhausted {
            prefix: "IT".into(),
            max: MAX_SEQUENCE,
        }
        .into();
        assert_matches!(exhausted, ServiceError::InvalidOperation(_));

        let malformed: ServiceError = CodeError::MalformedCode("x".into()).into();
        assert_matches!(malformed, ServiceError::ValidationError(_));
    }
}
